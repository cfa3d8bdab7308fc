//! Quadrature rules on reference facets and adaptive integration.
//!
//! Reference points are always stored as [`Vector2`]. Rules for the interval `[-1, 1]` only
//! use the first coordinate, while rules for the unit triangle use both.
use nalgebra::{DMatrix, SVector, Vector2};
use num::Zero;
use std::ops::{AddAssign, Mul};

/// A quadrature rule consisting of weights and reference points.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule {
    weights: Vec<f64>,
    points: Vec<Vector2<f64>>,
}

impl QuadratureRule {
    /// # Panics
    ///
    /// Panics if the number of weights and points differ.
    pub fn new(weights: Vec<f64>, points: Vec<Vector2<f64>>) -> Self {
        assert_eq!(
            weights.len(),
            points.len(),
            "number of weights and points must be the same"
        );
        Self { weights, points }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn points(&self) -> &[Vector2<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl '_ + Iterator<Item = (f64, &Vector2<f64>)> {
        self.weights.iter().copied().zip(self.points.iter())
    }

    /// Approximates the integral of the given function over the reference domain.
    pub fn integrate<U, Function>(&self, f: Function) -> U
    where
        Function: Fn(&Vector2<f64>) -> U,
        U: Zero + Mul<f64, Output = U> + AddAssign<U>,
    {
        let mut integral = U::zero();
        for (w, p) in self.iter() {
            integral += f(p) * w;
        }
        integral
    }
}

// Symmetric tridiagonal Jacobi matrix of the Legendre three-term recurrence. Its eigenvalues
// are the Gauss nodes.
fn legendre_jacobi_matrix(n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, n, |i, j| {
        if i.abs_diff(j) == 1 {
            let k = i.max(j) as f64;
            k / (4.0 * k * k - 1.0).sqrt()
        } else {
            0.0
        }
    })
}

/// Gauss-Legendre quadrature with `n` points on the interval `[-1, 1]`.
///
/// Integrates polynomials of degree up to `2n - 1` exactly. The points are sorted in
/// ascending order.
///
/// The rule is computed with the Golub-Welsch algorithm: the nodes are the eigenvalues of the
/// Jacobi matrix and each weight is `2 v_0^2`, where `v_0` is the first component of the
/// corresponding normalized eigenvector.
///
/// # Panics
///
/// Panics if `n == 0`.
pub fn gauss(n: usize) -> QuadratureRule {
    assert!(n > 0, "a Gauss rule needs at least one point");

    let eigen = legendre_jacobi_matrix(n).symmetric_eigen();
    let mut pairs: Vec<(f64, f64)> = eigen
        .eigenvalues
        .iter()
        .zip(eigen.eigenvectors.column_iter())
        .map(|(&x, v)| (x, 2.0 * v[0] * v[0]))
        .collect();
    pairs.sort_by(|(a, _), (b, _)| a.total_cmp(b));

    // Average out the round-off asymmetry of the eigensolver
    let (points, weights): (Vec<_>, Vec<_>) = (0..n)
        .map(|i| {
            let (x, w) = pairs[i];
            let (x_mirror, w_mirror) = pairs[n - 1 - i];
            (Vector2::new(0.5 * (x - x_mirror), 0.0), 0.5 * (w + w_mirror))
        })
        .unzip();
    QuadratureRule::new(weights, points)
}

/// Tensor-product Gauss rule collapsed onto the unit triangle with the Duffy transform.
///
/// The rule has `n * n` points and its weights sum to the triangle area `1/2`.
pub fn gauss_triangle(n: usize) -> QuadratureRule {
    let line = gauss(n);
    let mut weights = Vec::with_capacity(n * n);
    let mut points = Vec::with_capacity(n * n);
    for (wx, px) in line.iter() {
        let x = 0.5 * (px.x + 1.0);
        for (wy, py) in line.iter() {
            let s = 0.5 * (py.x + 1.0);
            points.push(Vector2::new(x, s * (1.0 - x)));
            weights.push(0.25 * wx * wy * (1.0 - x));
        }
    }
    QuadratureRule::new(weights, points)
}

/// Gauss rule of order `n` for the reference facet in `D` dimensions.
pub fn facet_quadrature<const D: usize>(n: usize) -> QuadratureRule {
    match D {
        2 => gauss(n),
        3 => gauss_triangle(n),
        _ => panic!("facets are only supported in 2 and 3 dimensions, got {D}"),
    }
}

/// Maps a rule on `[-1, 1]` through the sinh transformation
/// `x = b + mu * sinh(u)` clustered around `singular_x = b`.
///
/// The result integrates functions on `[-1, 1]` which are nearly singular at `b`, where
/// `distance = mu` is the distance of the singularity from the interval in reference
/// coordinates. The weights still sum to the interval length.
pub fn sinh_transform(rule: &QuadratureRule, singular_x: f64, distance: f64) -> QuadratureRule {
    assert!(distance > 0.0, "the sinh transformation needs a positive distance");
    let lower = ((-1.0 - singular_x) / distance).asinh();
    let upper = ((1.0 - singular_x) / distance).asinh();
    let half_width = 0.5 * (upper - lower);
    let (weights, points) = rule
        .iter()
        .map(|(w, p)| {
            let u = half_width * p.x + 0.5 * (upper + lower);
            let x = singular_x + distance * u.sinh();
            (w * half_width * distance * u.cosh(), Vector2::new(x, 0.0))
        })
        .unzip();
    QuadratureRule::new(weights, points)
}

/// A rule on the unit triangle for integrands nearly singular above `singular_pt`.
///
/// The triangle is split into sub-triangles sharing the vertex `singular_pt`. Each one is
/// integrated in polar-like coordinates: Gauss along the opposite edge and a sinh
/// transformed Gauss rule along the ray towards the shared vertex. `scaled_distance` maps an
/// edge point to the distance of the singularity divided by the length of the ray ending
/// there. Sub-triangles of zero area, which occur when `singular_pt` lies on the boundary,
/// are skipped.
pub fn sinh_polar_triangle<F>(n: usize, singular_pt: &Vector2<f64>, scaled_distance: F) -> QuadratureRule
where
    F: Fn(&Vector2<f64>) -> f64,
{
    let line = gauss(n);
    let vertices = [Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)];
    let mut weights = Vec::new();
    let mut points = Vec::new();
    for i in 0..3 {
        let a = vertices[i];
        let edge = vertices[(i + 1) % 3] - a;
        let to_edge = a - singular_pt;
        let area_factor = (to_edge.x * edge.y - to_edge.y * edge.x).abs();
        if area_factor < 1e-14 {
            continue;
        }
        for (wt, pt) in line.iter() {
            let t = 0.5 * (pt.x + 1.0);
            let edge_pt = a + edge * t;
            let mu = scaled_distance(&edge_pt);
            // Endpoint singularity at rho = 0 maps to u = 0
            let u_max = mu.recip().asinh();
            for (wr, pr) in line.iter() {
                let u = 0.5 * u_max * (pr.x + 1.0);
                let rho = mu * u.sinh();
                let w_rho = 0.5 * u_max * wr * mu * u.cosh();
                points.push(singular_pt + (edge_pt - singular_pt) * rho);
                weights.push(0.5 * wt * w_rho * rho * area_factor);
            }
        }
    }
    QuadratureRule::new(weights, points)
}

const MAX_ADAPTIVE_DEPTH: usize = 24;

/// Integrates a vector-valued function over `[a, b]` with adaptive Simpson quadrature.
///
/// Intervals are bisected until the Richardson error estimate of each piece drops below
/// its share of the absolute tolerance `tol`, or the maximum recursion depth is reached.
pub fn adaptive_integrate<const N: usize, F>(f: F, a: f64, b: f64, tol: f64) -> SVector<f64, N>
where
    F: Fn(f64) -> SVector<f64, N>,
{
    let fa = f(a);
    let fm = f(0.5 * (a + b));
    let fb = f(b);
    let whole = simpson(a, b, &fa, &fm, &fb);
    adaptive_step(&f, a, b, &fa, &fm, &fb, whole, tol, MAX_ADAPTIVE_DEPTH)
}

fn simpson<const N: usize>(
    a: f64,
    b: f64,
    fa: &SVector<f64, N>,
    fm: &SVector<f64, N>,
    fb: &SVector<f64, N>,
) -> SVector<f64, N> {
    (fa + fm * 4.0 + fb) * ((b - a) / 6.0)
}

#[allow(clippy::too_many_arguments)]
fn adaptive_step<const N: usize, F>(
    f: &F,
    a: f64,
    b: f64,
    fa: &SVector<f64, N>,
    fm: &SVector<f64, N>,
    fb: &SVector<f64, N>,
    whole: SVector<f64, N>,
    tol: f64,
    depth: usize,
) -> SVector<f64, N>
where
    F: Fn(f64) -> SVector<f64, N>,
{
    let m = 0.5 * (a + b);
    let flm = f(0.5 * (a + m));
    let frm = f(0.5 * (m + b));
    let left = simpson(a, m, fa, &flm, fm);
    let right = simpson(m, b, fm, &frm, fb);
    let correction = (left + right - whole) / 15.0;

    if depth == 0 || correction.amax() <= tol {
        left + right + correction
    } else {
        adaptive_step(f, a, m, fa, &flm, fm, left, 0.5 * tol, depth - 1)
            + adaptive_step(f, m, b, fm, &frm, fb, right, 0.5 * tol, depth - 1)
    }
}
