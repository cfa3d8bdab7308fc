//! Laplace/Poisson and linear elasticity kernels.
//!
//! All kernels are evaluated with `delta = src - obs` and `r2 = |delta|^2`.
use nalgebra::{Point3, SMatrix, SVector};
use std::f64::consts::PI;

/// A scalar boundary integral kernel in `D` dimensions.
pub trait Kernel<const D: usize>: Sync {
    fn evaluate(&self, r2: f64, delta: &SVector<f64, D>, n_src: &SVector<f64, D>, n_obs: &SVector<f64, D>) -> f64;
}

impl<const D: usize, K: Kernel<D>> Kernel<D> for &K {
    fn evaluate(&self, r2: f64, delta: &SVector<f64, D>, n_src: &SVector<f64, D>, n_obs: &SVector<f64, D>) -> f64 {
        (**self).evaluate(r2, delta, n_src, n_obs)
    }
}

/// The kernel which is identically one. Integrating against it gives plain facet integrals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityScalar;

impl<const D: usize> Kernel<D> for IdentityScalar {
    fn evaluate(&self, _r2: f64, _delta: &SVector<f64, D>, _n_src: &SVector<f64, D>, _n_obs: &SVector<f64, D>) -> f64 {
        1.0
    }
}

/// Fundamental solution of the Laplace equation (single layer potential).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaplaceSingle;

/// Normal derivative of the fundamental solution w.r.t. the source normal (double layer potential).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaplaceDouble;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaplaceHypersingular;

impl Kernel<2> for LaplaceSingle {
    fn evaluate(&self, r2: f64, _delta: &SVector<f64, 2>, _n_src: &SVector<f64, 2>, _n_obs: &SVector<f64, 2>) -> f64 {
        r2.sqrt().ln() / (2.0 * PI)
    }
}

impl Kernel<3> for LaplaceSingle {
    fn evaluate(&self, r2: f64, _delta: &SVector<f64, 3>, _n_src: &SVector<f64, 3>, _n_obs: &SVector<f64, 3>) -> f64 {
        1.0 / (4.0 * PI * r2.sqrt())
    }
}

impl Kernel<2> for LaplaceDouble {
    fn evaluate(&self, r2: f64, delta: &SVector<f64, 2>, n_src: &SVector<f64, 2>, _n_obs: &SVector<f64, 2>) -> f64 {
        n_src.dot(delta) / (2.0 * PI * r2)
    }
}

impl Kernel<3> for LaplaceDouble {
    fn evaluate(&self, r2: f64, delta: &SVector<f64, 3>, n_src: &SVector<f64, 3>, _n_obs: &SVector<f64, 3>) -> f64 {
        n_src.dot(delta) / (4.0 * PI * r2 * r2.sqrt())
    }
}

impl Kernel<2> for LaplaceHypersingular {
    fn evaluate(&self, r2: f64, delta: &SVector<f64, 2>, n_src: &SVector<f64, 2>, n_obs: &SVector<f64, 2>) -> f64 {
        let normal_term = -n_obs.dot(n_src) / r2;
        let delta_term = 2.0 * n_src.dot(delta) * n_obs.dot(delta) / (r2 * r2);
        (normal_term + delta_term) / (2.0 * PI)
    }
}

/// Isotropic material parameters of the elasticity kernels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticParams {
    pub shear_modulus: f64,
    pub poisson_ratio: f64,
}

impl ElasticParams {
    pub fn new(shear_modulus: f64, poisson_ratio: f64) -> Self {
        Self {
            shear_modulus,
            poisson_ratio,
        }
    }

    /// Lamé's first parameter.
    pub fn lambda(&self) -> f64 {
        let nu = self.poisson_ratio;
        2.0 * self.shear_modulus * nu / (1.0 - 2.0 * nu)
    }

    /// The Kelvin displacement tensor: entry `(k, j)` is displacement component `j` due to
    /// a unit point force in direction `k`. Plane strain in 2D.
    pub fn displacement_tensor<const D: usize>(&self, r2: f64, delta: &SVector<f64, D>) -> SMatrix<f64, D, D> {
        let (mu, nu) = (self.shear_modulus, self.poisson_ratio);
        let r_hat = delta / r2.sqrt();
        let outer = r_hat * r_hat.transpose();
        match D {
            2 => {
                let identity = SMatrix::<f64, D, D>::identity() * ((3.0 - 4.0 * nu) * r2.sqrt().ln());
                (identity - outer) * (-1.0 / (8.0 * PI * mu * (1.0 - nu)))
            }
            3 => {
                let identity = SMatrix::<f64, D, D>::identity() * (3.0 - 4.0 * nu);
                (identity + outer) / (16.0 * PI * mu * (1.0 - nu) * r2.sqrt())
            }
            _ => panic!("elasticity kernels are only supported in 2 and 3 dimensions, got {D}"),
        }
    }

    /// The traction tensor on a surface with normal `n_src` belonging to the displacement
    /// tensor, with the sign of [`LaplaceDouble`]: its integral over a closed surface with
    /// outward normals is the identity inside and zero outside.
    pub fn traction_tensor<const D: usize>(
        &self,
        r2: f64,
        delta: &SVector<f64, D>,
        n_src: &SVector<f64, D>,
    ) -> SMatrix<f64, D, D> {
        let nu = self.poisson_ratio;
        let r = r2.sqrt();
        let r_hat = delta / r;
        let drdn = r_hat.dot(n_src);
        let (factor, outer_weight) = match D {
            2 => (1.0 / (4.0 * PI * (1.0 - nu) * r), 2.0),
            3 => (1.0 / (8.0 * PI * (1.0 - nu) * r2), 3.0),
            _ => panic!("elasticity kernels are only supported in 2 and 3 dimensions, got {D}"),
        };
        let symmetric =
            (SMatrix::<f64, D, D>::identity() * (1.0 - 2.0 * nu) + r_hat * r_hat.transpose() * outer_weight) * drdn;
        let skew = (r_hat * n_src.transpose() - n_src * r_hat.transpose()) * (1.0 - 2.0 * nu);
        (symmetric - skew) * factor
    }
}

/// Component `(k, j)` of the Kelvin displacement tensor as a scalar kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticDisplacement {
    pub params: ElasticParams,
    pub k: usize,
    pub j: usize,
}

/// Component `(k, j)` of the elastic traction tensor as a scalar kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticTraction {
    pub params: ElasticParams,
    pub k: usize,
    pub j: usize,
}

impl ElasticDisplacement {
    pub fn new(params: ElasticParams, k: usize, j: usize) -> Self {
        Self { params, k, j }
    }
}

impl ElasticTraction {
    pub fn new(params: ElasticParams, k: usize, j: usize) -> Self {
        Self { params, k, j }
    }
}

impl Kernel<2> for ElasticDisplacement {
    fn evaluate(&self, r2: f64, delta: &SVector<f64, 2>, _n_src: &SVector<f64, 2>, _n_obs: &SVector<f64, 2>) -> f64 {
        self.params.displacement_tensor(r2, delta)[(self.k, self.j)]
    }
}

impl Kernel<3> for ElasticDisplacement {
    fn evaluate(&self, r2: f64, delta: &SVector<f64, 3>, _n_src: &SVector<f64, 3>, _n_obs: &SVector<f64, 3>) -> f64 {
        self.params.displacement_tensor(r2, delta)[(self.k, self.j)]
    }
}

impl Kernel<2> for ElasticTraction {
    fn evaluate(&self, r2: f64, delta: &SVector<f64, 2>, n_src: &SVector<f64, 2>, _n_obs: &SVector<f64, 2>) -> f64 {
        self.params.traction_tensor(r2, delta, n_src)[(self.k, self.j)]
    }
}

impl Kernel<3> for ElasticTraction {
    fn evaluate(&self, r2: f64, delta: &SVector<f64, 3>, n_src: &SVector<f64, 3>, _n_obs: &SVector<f64, 3>) -> f64 {
        self.params.traction_tensor(r2, delta, n_src)[(self.k, self.j)]
    }
}

/// Point-to-point 3D Laplace single layer kernel.
///
/// Returns zero for coincident points so that self-interactions drop out of direct sums.
pub fn laplace_single_3d_points(obs: &Point3<f64>, src: &Point3<f64>) -> f64 {
    let r = (src - obs).norm();
    if r == 0.0 {
        0.0
    } else {
        1.0 / (4.0 * PI * r)
    }
}
