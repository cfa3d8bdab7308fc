use matrixcompare::assert_scalar_eq;
use nalgebra::{DVector, Point2, Point3};
use std::f64::consts::FRAC_1_SQRT_2;
use tbem::constraint::{ConstraintMatrix, LinearTerm};
use tbem::continuity::{
    convert_to_constraints, cut_at_intersection, find_overlapping_vertices, find_overlapping_vertices_same_mesh,
    form_neighbor_bcs, interpolate_bc_constraints, mesh_continuity, normal_constraints,
};
use tbem::mesh::procedural::{line_mesh, rect_mesh, sphere_mesh};
use tbem::mesh::FacetMesh2d;

fn disjoint_mesh() -> FacetMesh2d {
    let facets = (0..10)
        .map(|i| {
            let x = i as f64;
            [Point2::new(2.0 * x, -2.0 * x), Point2::new(2.0 * x + 1.0, -2.0 * x - 1.0)]
        })
        .collect();
    FacetMesh2d::from_facets(facets)
}

fn connected_mesh() -> FacetMesh2d {
    line_mesh(Point2::new(0.0, 0.0), Point2::new(0.0, 1.0)).refine_repeatedly(2)
}

#[test]
fn overlapping_vertices_between_meshes() {
    let disjoint = disjoint_mesh();
    let pairs = find_overlapping_vertices(&disjoint, &disjoint);
    assert_eq!(pairs, (0..20).map(|i| (i, i)).collect::<Vec<_>>());
    assert!(find_overlapping_vertices_same_mesh(&disjoint).is_empty());

    let connected = connected_mesh();
    assert_eq!(find_overlapping_vertices_same_mesh(&connected), vec![(1, 2), (3, 4), (5, 6)]);
    assert_eq!(find_overlapping_vertices(&disjoint, &connected), vec![(0, 0)]);
}

#[test]
fn overlaps_become_equality_constraints() {
    let constraints = convert_to_constraints(&[(1, 2)]);
    assert_eq!(constraints.len(), 1);
    assert_eq!(constraints[0].terms, vec![LinearTerm::new(1, 1.0), LinearTerm::new(2, -1.0)]);
    assert_eq!(constraints[0].rhs, 0.0);
}

#[test]
fn sphere_continuity_constraints() {
    let mesh = sphere_mesh(Point3::origin(), 1.0, 2);
    assert_eq!(mesh.n_dofs(), 384);
    let constraints = convert_to_constraints(&mesh_continuity(&mesh));
    let matrix = ConstraintMatrix::from_constraints(&constraints);
    // One unconstrained degree of freedom remains per distinct vertex
    assert_eq!(matrix.len(), 318);
    for c in matrix.iter() {
        assert_eq!(c.terms.len(), 1);
        assert_eq!(c.terms[0].weight, 1.0);
        assert!(c.terms[0].dof < c.constrained_dof);
        assert_eq!(c.rhs, 0.0);
    }
}

#[test]
fn condensing_sums_coincident_entries() {
    let mesh = sphere_mesh(Point3::origin(), 1.0, 0);
    let constraints = convert_to_constraints(&mesh_continuity(&mesh));
    let matrix = ConstraintMatrix::from_constraints(&constraints);
    let condensed = matrix.condense_vector(&DVector::repeat(mesh.n_dofs(), 1.0));
    assert_eq!(condensed, DVector::repeat(6, 4.0));

    let distributed = matrix.distribute_vector(&DVector::from_fn(6, |i, _| i as f64), mesh.n_dofs());
    for (a, b) in mesh_continuity(&mesh) {
        assert_eq!(distributed[a], distributed[b]);
    }
}

#[test]
fn cut_removes_continuity_across_intersection() {
    let zplane = rect_mesh(
        Point3::new(-1.0, -1.0, 0.0),
        Point3::new(1.0, -1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(-1.0, 1.0, 0.0),
    )
    .refine();
    let xplane = rect_mesh(
        Point3::new(0.0, -1.0, -1.0),
        Point3::new(0.0, 1.0, -1.0),
        Point3::new(0.0, 1.0, 1.0),
        Point3::new(0.0, -1.0, 1.0),
    )
    .refine();

    let overlaps = mesh_continuity(&zplane);
    assert_eq!(overlaps.len(), 29);
    let cut = cut_at_intersection(&overlaps, &zplane, &xplane);
    assert_eq!(cut.len(), 16);
    assert!(cut.iter().all(|pair| overlaps.contains(pair)));

    // A cut far away from the mesh changes nothing
    let far = xplane.map_vertices(|v| v + nalgebra::Vector3::new(10.0, 0.0, 0.0));
    assert_eq!(cut_at_intersection(&overlaps, &zplane, &far), overlaps);
}

#[test]
fn neighbor_boundary_conditions() {
    let connected = connected_mesh();
    let disjoint = disjoint_mesh();
    let bcs = vec![2.33; connected.n_dofs()];
    let constraints = form_neighbor_bcs(&connected, &disjoint, &bcs);
    assert_eq!(constraints.len(), 1);
    assert_eq!(constraints[0].terms, vec![LinearTerm::new(0, 1.0)]);
    assert_eq!(constraints[0].rhs, 2.33);
}

#[test]
fn interpolated_boundary_conditions() {
    let mesh = line_mesh(Point2::new(-1.0, 0.0), Point2::new(1.0, 0.0));
    let constraints = interpolate_bc_constraints(&mesh, &[0, 1], |p| p.x + 1.0);
    assert_eq!(constraints.len(), 2);
    assert_eq!(constraints[0].terms, vec![LinearTerm::new(0, 1.0)]);
    assert_eq!(constraints[0].rhs, 0.0);
    assert_eq!(constraints[1].terms, vec![LinearTerm::new(1, 1.0)]);
    assert_eq!(constraints[1].rhs, 2.0);
}

#[test]
fn normal_component_constraints() {
    let mesh = line_mesh(Point2::new(-1.0, -1.0), Point2::new(1.0, 1.0));
    let constraints = normal_constraints(&mesh, &[0.0, 1.0]);
    assert_eq!(constraints.len(), 2);

    let first = &constraints[0].terms;
    assert_eq!((first[0].dof, first[1].dof), (0, 2));
    assert_scalar_eq!(first[0].weight, -FRAC_1_SQRT_2, comp = abs, tol = 1e-14);
    assert_scalar_eq!(first[1].weight, FRAC_1_SQRT_2, comp = abs, tol = 1e-14);
    assert_eq!(constraints[0].rhs, 0.0);

    let second = &constraints[1].terms;
    assert_eq!((second[0].dof, second[1].dof), (1, 3));
    assert_scalar_eq!(second[1].weight, FRAC_1_SQRT_2, comp = abs, tol = 1e-14);
    assert_eq!(constraints[1].rhs, 1.0);
}
