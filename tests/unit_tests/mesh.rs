use matrixcompare::assert_scalar_eq;
use nalgebra::{DMatrix, Point2, Point3, Vector3};
use tbem::geometry::{facet_centroid, facet_measure, facet_normal, facet_unscaled_normal};
use tbem::mesh::procedural::{circle_mesh, line_mesh, rect_mesh, sphere_mesh};
use tbem::mesh::{FacetMesh2d, FacetMesh3d};

fn total_measure<const D: usize>(mesh: &tbem::mesh::FacetMesh<D>) -> f64 {
    mesh.facets().iter().map(facet_measure).sum()
}

#[test]
fn refine_segment() {
    let mesh = line_mesh(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0)).refine();
    assert_eq!(
        mesh.facets(),
        &[
            [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)],
            [Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)]
        ]
    );
}

#[test]
fn refine_triangle_preserves_area_and_orientation() {
    let mesh = FacetMesh3d::from_facets(vec![[
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ]]);
    let refined = mesh.refine_repeatedly(2);
    assert_eq!(refined.n_facets(), 16);
    assert_eq!(refined.n_dofs(), 48);
    assert_scalar_eq!(total_measure(&refined), 1.0, comp = abs, tol = 1e-14);
    for facet in refined.facets() {
        assert!(facet_unscaled_normal(facet).z > 0.0);
    }
}

#[test]
fn vertices_follow_dof_order() {
    let mesh = FacetMesh2d::from_facets(vec![
        [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)],
        [Point2::new(2.0, 0.0), Point2::new(3.0, 0.0)],
    ]);
    assert_eq!(mesh.n_dofs(), 4);
    assert_eq!(mesh.vertex(3), &Point2::new(3.0, 0.0));
    let xs: Vec<f64> = mesh.vertices().map(|v| v.x).collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn concat_and_map_vertices() {
    let a = line_mesh(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
    let b = line_mesh(Point2::new(1.0, 0.0), Point2::new(1.0, 1.0));
    let both = a.concat(&b);
    assert_eq!(both.n_facets(), 2);
    assert_eq!(both.facets()[1], b.facets()[0]);

    let shifted = both.map_vertices(|v| v + nalgebra::Vector2::new(1.0, 0.0));
    assert_eq!(shifted.vertex(3), &Point2::new(2.0, 1.0));
    assert!(FacetMesh2d::default().is_empty());
}

#[test]
fn facet_rows_round_trip() {
    let mesh = rect_mesh(
        Point3::new(-1.0, -1.0, 0.0),
        Point3::new(1.0, -1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(-1.0, 1.0, 0.0),
    );
    let rows = mesh.to_facet_rows();
    assert_eq!(rows.shape(), (2, 9));
    assert_eq!(rows.row(0).iter().copied().collect::<Vec<_>>(), vec![
        -1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.0
    ]);
    assert_eq!(FacetMesh3d::from_facet_rows(&rows).unwrap(), mesh);
}

#[test]
fn facet_rows_with_wrong_width_are_rejected() {
    let rows = DMatrix::<f64>::zeros(3, 4);
    assert!(FacetMesh3d::from_facet_rows(&rows).is_err());
    assert!(FacetMesh2d::from_facet_rows(&rows).is_ok());
}

#[test]
fn circle_mesh_is_clockwise_with_outward_normals() {
    let center = Point2::new(1.0, -2.0);
    let mesh = circle_mesh(center, 2.0, 16);
    assert_eq!(mesh.n_facets(), 16);
    for facet in mesh.facets() {
        for v in facet {
            assert_scalar_eq!((v - center).norm(), 2.0, comp = abs, tol = 1e-12);
        }
        let outward = facet_centroid(facet) - center;
        assert!(facet_normal(facet).dot(&outward) > 0.0);
    }
    // The polygon is closed
    assert_eq!(mesh.facets()[15][1], mesh.facets()[0][0]);
}

#[test]
fn sphere_mesh_vertices_lie_on_sphere_with_outward_normals() {
    let center = Point3::new(0.5, 0.0, -1.0);
    for refinements in 0..3 {
        let mesh = sphere_mesh(center, 3.0, refinements);
        assert_eq!(mesh.n_facets(), 8 * 4usize.pow(refinements as u32));
        for facet in mesh.facets() {
            for v in facet {
                assert_scalar_eq!((v - center).norm(), 3.0, comp = abs, tol = 1e-12);
            }
            let outward: Vector3<f64> = facet_centroid(facet) - center;
            assert!(facet_normal(facet).dot(&outward) > 0.0);
        }
    }

    let area = total_measure(&sphere_mesh(Point3::origin(), 1.0, 4));
    assert!(area < 4.0 * std::f64::consts::PI);
    assert_scalar_eq!(area, 4.0 * std::f64::consts::PI, comp = abs, tol = 0.1);
}
