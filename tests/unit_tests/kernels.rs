use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{Matrix3, Point3, SMatrix, SVector, Vector2, Vector3};
use std::f64::consts::{E, PI};
use tbem::kernels::{
    laplace_single_3d_points, ElasticDisplacement, ElasticParams, ElasticTraction, IdentityScalar, Kernel,
    LaplaceDouble, LaplaceHypersingular, LaplaceSingle,
};

#[test]
fn laplace_single_values() {
    let zero2 = Vector2::zeros();
    let zero3 = Vector3::zeros();
    assert_scalar_eq!(
        Kernel::<2>::evaluate(&LaplaceSingle, 1.0, &Vector2::new(1.0, 0.0), &zero2, &zero2),
        0.0,
        comp = abs,
        tol = 1e-15
    );
    assert_scalar_eq!(
        Kernel::<2>::evaluate(&LaplaceSingle, E * E, &Vector2::new(E, 0.0), &zero2, &zero2),
        1.0 / (2.0 * PI),
        comp = abs,
        tol = 1e-15
    );
    assert_scalar_eq!(
        Kernel::<3>::evaluate(&LaplaceSingle, 4.0, &Vector3::new(0.0, 2.0, 0.0), &zero3, &zero3),
        1.0 / (8.0 * PI),
        comp = abs,
        tol = 1e-15
    );
}

#[test]
fn laplace_double_values() {
    let zero2 = Vector2::zeros();
    let n2 = Vector2::new(1.0, 0.0);
    assert_scalar_eq!(
        Kernel::<2>::evaluate(&LaplaceDouble, 1.0, &Vector2::new(1.0, 0.0), &n2, &zero2),
        1.0 / (2.0 * PI),
        comp = abs,
        tol = 1e-15
    );
    // Orthogonal to the source normal
    assert_eq!(
        Kernel::<2>::evaluate(&LaplaceDouble, 1.0, &Vector2::new(0.0, 1.0), &n2, &zero2),
        0.0
    );

    let zero3 = Vector3::zeros();
    let n3 = Vector3::new(0.0, 0.0, 1.0);
    assert_scalar_eq!(
        Kernel::<3>::evaluate(&LaplaceDouble, 4.0, &Vector3::new(0.0, 0.0, 2.0), &n3, &zero3),
        1.0 / (16.0 * PI),
        comp = abs,
        tol = 1e-15
    );
}

#[test]
fn laplace_hypersingular_values() {
    let n = Vector2::new(1.0, 0.0);
    // Along the normals: (-1 + 2) / (2 pi)
    assert_scalar_eq!(
        LaplaceHypersingular.evaluate(1.0, &Vector2::new(1.0, 0.0), &n, &n),
        1.0 / (2.0 * PI),
        comp = abs,
        tol = 1e-15
    );
    // Orthogonal to the normals: -1 / (2 pi r^2)
    assert_scalar_eq!(
        LaplaceHypersingular.evaluate(4.0, &Vector2::new(0.0, 2.0), &n, &n),
        -1.0 / (8.0 * PI),
        comp = abs,
        tol = 1e-15
    );
}

#[test]
fn identity_kernel_and_references() {
    let kernel = IdentityScalar;
    let zero = Vector3::zeros();
    assert_eq!(Kernel::<3>::evaluate(&kernel, 7.0, &zero, &zero, &zero), 1.0);
    assert_eq!(Kernel::<3>::evaluate(&&kernel, 7.0, &zero, &zero, &zero), 1.0);
}

#[test]
fn point_kernel_drops_self_interaction() {
    let p = Point3::new(1.0, 2.0, 3.0);
    assert_eq!(laplace_single_3d_points(&p, &p), 0.0);
    assert_scalar_eq!(
        laplace_single_3d_points(&p, &Point3::new(1.0, 2.0, 5.0)),
        1.0 / (8.0 * PI),
        comp = abs,
        tol = 1e-15
    );
}

#[test]
fn kelvin_displacement_values() {
    let params = ElasticParams::new(1.0, 0.25);
    let delta = Vector3::new(0.0, 0.0, 2.0);
    let u = params.displacement_tensor(4.0, &delta);
    let expected = Matrix3::from_diagonal(&Vector3::new(1.0 / (12.0 * PI), 1.0 / (12.0 * PI), 1.0 / (8.0 * PI)));
    assert_matrix_eq!(u, expected, comp = abs, tol = 1e-15);

    let zero = Vector3::zeros();
    let kernel = ElasticDisplacement::new(params, 2, 2);
    assert_scalar_eq!(
        Kernel::<3>::evaluate(&kernel, 4.0, &delta, &zero, &zero),
        1.0 / (8.0 * PI),
        comp = abs,
        tol = 1e-15
    );

    let delta = Vector2::new(0.6, -0.8);
    let u = params.displacement_tensor(1.0, &delta);
    assert_matrix_eq!(u, u.transpose(), comp = abs, tol = 1e-15);
    // ln r vanishes on the unit circle, leaving the outer product term
    let expected = delta * delta.transpose() / (8.0 * PI * 0.75);
    assert_matrix_eq!(u, expected, comp = abs, tol = 1e-15);
}

/// Traction computed from the stress of the Kelvin displacement field by central differences.
fn traction_by_differentiation<const D: usize>(
    params: &ElasticParams,
    delta: &SVector<f64, D>,
    n: &SVector<f64, D>,
) -> SMatrix<f64, D, D> {
    let h = 1e-6;
    let displacement = |d: SVector<f64, D>| params.displacement_tensor(d.norm_squared(), &d);
    // gradients[l][(k, j)] = d U_kj / d src_l
    let gradients: Vec<SMatrix<f64, D, D>> = (0..D)
        .map(|l| {
            let step = SVector::<f64, D>::from_fn(|i, _| if i == l { h } else { 0.0 });
            (displacement(delta + step) - displacement(delta - step)) / (2.0 * h)
        })
        .collect();

    SMatrix::from_fn(|k, j| {
        let strain = |a: usize, b: usize| 0.5 * (gradients[b][(k, a)] + gradients[a][(k, b)]);
        let trace: f64 = (0..D).map(|i| strain(i, i)).sum();
        let stress = |a: usize, b: usize| {
            let volumetric = if a == b { params.lambda() * trace } else { 0.0 };
            volumetric + 2.0 * params.shear_modulus * strain(a, b)
        };
        -(0..D).map(|l| stress(j, l) * n[l]).sum::<f64>()
    })
}

#[test]
fn elastic_traction_is_stress_of_displacement() {
    let params = ElasticParams::new(1.3, 0.27);

    let delta = Vector3::new(0.4, -0.7, 0.3);
    let n = Vector3::new(0.2, 0.5, -1.0).normalize();
    let t = params.traction_tensor(delta.norm_squared(), &delta, &n);
    assert_matrix_eq!(t, traction_by_differentiation(&params, &delta, &n), comp = abs, tol = 1e-8);

    let delta = Vector2::new(-0.3, 0.9);
    let n = Vector2::new(1.0, 1.0).normalize();
    let t = params.traction_tensor(delta.norm_squared(), &delta, &n);
    assert_matrix_eq!(t, traction_by_differentiation(&params, &delta, &n), comp = abs, tol = 1e-8);

    let kernel = ElasticTraction::new(params, 0, 1);
    assert_eq!(Kernel::<2>::evaluate(&kernel, delta.norm_squared(), &delta, &n, &n), t[(0, 1)]);
}
