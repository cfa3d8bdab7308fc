//! Laplace problems on closed curves and surfaces.
use super::data_output_path;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DVector, Point, Point2, Point3, SVector, Vector2};
use tbem::constraint::{condense_matrix, ConstraintMatrix};
use tbem::continuity::{convert_to_constraints, mesh_continuity};
use tbem::dataset::FacetDataset;
use tbem::dense_builder::{direct_interact, eval_integral_equation, interact_matrix, BoundaryIntegralProblem};
use tbem::integral::{ObsPt, QuadStrategy};
use tbem::io::vtk::export_plot;
use tbem::kernels::{Kernel, LaplaceDouble, LaplaceSingle};
use tbem::mesh::procedural::{circle_mesh, sphere_mesh};
use tbem::mesh::FacetMesh;
use tbem::operators::interpolate;
use tbem::plot::build_plot;

fn potential<const D: usize>(mesh: &FacetMesh<D>, loc: Point<f64, D>) -> f64
where
    LaplaceDouble: Kernel<D>,
{
    let density = DVector::repeat(mesh.n_dofs(), 1.0);
    let problem = BoundaryIntegralProblem::new(mesh, mesh, LaplaceDouble, density);
    let normal = SVector::from_fn(|i, _| if i == 0 { 1.0 } else { 0.0 });
    let obs = ObsPt::new(0.1, loc, normal, normal);
    eval_integral_equation(&problem, &QuadStrategy::default(), &obs)
}

// The double layer potential of a unit density is one inside and zero outside.
#[test]
fn circle_double_layer() {
    let mesh = circle_mesh(Point2::new(0.5, 0.0), 1.0, 32);
    assert_scalar_eq!(potential(&mesh, Point2::new(0.5, 0.0)), 1.0, comp = abs, tol = 1e-5);
    assert_scalar_eq!(potential(&mesh, Point2::new(0.9, 0.3)), 1.0, comp = abs, tol = 1e-5);
    assert_scalar_eq!(potential(&mesh, Point2::new(3.5, 0.0)), 0.0, comp = abs, tol = 1e-5);
}

#[test]
fn sphere_double_layer() {
    let mesh = sphere_mesh(Point3::origin(), 1.0, 2);
    assert_scalar_eq!(potential(&mesh, Point3::origin()), 1.0, comp = abs, tol = 1e-3);
    assert_scalar_eq!(potential(&mesh, Point3::new(3.0, 0.0, 0.0)), 0.0, comp = abs, tol = 1e-3);
}

#[test]
fn export_sphere_field() {
    let mesh = sphere_mesh(Point3::origin(), 1.0, 2);
    let height = interpolate(&mesh, |p| p.z);
    let dataset = FacetDataset::from_mesh(&mesh, &[height]).unwrap();
    let plot = build_plot(&dataset, 0).unwrap();
    let path = data_output_path().join("laplace").join("sphere_height.vtu");
    export_plot(&plot, &path, Some("sphere height")).unwrap();
    assert!(path.exists());
}

/// Solves for the normal derivative of a harmonic function given its boundary values, with
/// continuity constraints tying together the degrees of freedom of shared vertices.
#[test]
fn constrained_dirichlet_solve_on_circle() {
    let radius = 2.0;
    let mesh = circle_mesh(Point2::origin(), radius, 64);
    let n_dofs = mesh.n_dofs();
    let harmonic = |p: &Point2<f64>| p.x * p.x - p.y * p.y;
    // Radial derivative of r^2 cos(2 theta)
    let normal_derivative = |p: &Point2<f64>| 2.0 * harmonic(p) / radius;

    let qs = QuadStrategy::default();
    let u = interpolate(&mesh, harmonic);
    let double = BoundaryIntegralProblem::new(&mesh, &mesh, LaplaceDouble, u.clone());
    let rhs = direct_interact(&double, &qs);
    let single = BoundaryIntegralProblem::new(&mesh, &mesh, LaplaceSingle, DVector::zeros(n_dofs));
    let matrix = interact_matrix(&single, &qs);

    let constraints = ConstraintMatrix::from_constraints(&convert_to_constraints(&mesh_continuity(&mesh)));
    assert_eq!(constraints.len(), 64);
    let reduced_matrix = condense_matrix(&constraints, &constraints, &matrix);
    let reduced_rhs = constraints.condense_vector(&rhs);
    assert_eq!(reduced_matrix.nrows(), 64);
    let reduced_dudn = reduced_matrix
        .lu()
        .solve(&reduced_rhs)
        .expect("the single layer system must be nonsingular");
    let dudn = constraints.distribute_vector(&reduced_dudn, n_dofs);

    let exact = interpolate(&mesh, normal_derivative);
    assert_matrix_eq!(dudn.clone(), exact, comp = abs, tol = 1e-2);

    // Green's representation formula
    let single = BoundaryIntegralProblem::new(&mesh, &mesh, LaplaceSingle, dudn);
    for p in [Point2::new(0.6, 0.4), Point2::new(-1.0, 0.2), Point2::origin()] {
        let obs = ObsPt::new(0.1, p, Vector2::x(), Vector2::x());
        let value = eval_integral_equation(&double, &qs, &obs) - eval_integral_equation(&single, &qs, &obs);
        assert_scalar_eq!(value, harmonic(&p), comp = abs, tol = 1e-2);
    }
}
