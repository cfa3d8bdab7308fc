//! Dense assembly of boundary integral operators.
use crate::geometry::linear_basis;
use crate::integral::{FacetInfo, IntegralTerm, IntegrationStrategy, ObsPt, QuadStrategy};
use crate::kernels::Kernel;
use crate::mesh::FacetMesh;
use crate::operators::apply_operator;
use crate::quadrature::facet_quadrature;
use log::debug;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

/// A boundary integral operator applied to a source density.
///
/// The kernel is integrated over `src_mesh` against the piecewise linear density
/// `src_strength`, which has one value per source degree of freedom.
#[derive(Debug, Clone)]
pub struct BoundaryIntegralProblem<'a, const D: usize, K> {
    pub src_mesh: &'a FacetMesh<D>,
    pub obs_mesh: &'a FacetMesh<D>,
    pub kernel: K,
    pub src_strength: DVector<f64>,
}

impl<'a, const D: usize, K: Kernel<D>> BoundaryIntegralProblem<'a, D, K> {
    pub fn new(src_mesh: &'a FacetMesh<D>, obs_mesh: &'a FacetMesh<D>, kernel: K, src_strength: DVector<f64>) -> Self {
        Self {
            src_mesh,
            obs_mesh,
            kernel,
            src_strength,
        }
    }
}

fn integral_row<const D: usize, K: Kernel<D>>(
    strategy: &IntegrationStrategy<D, K>,
    src_facets: &[FacetInfo<D>],
    obs: &ObsPt<D>,
) -> DVector<f64> {
    let mut result = DVector::zeros(D * src_facets.len());
    for (i, src_facet) in src_facets.iter().enumerate() {
        let integrals = strategy.integrate(&IntegralTerm::new(*obs, *src_facet));
        result.fixed_rows_mut::<D>(D * i).copy_from(&integrals);
    }
    result
}

/// The influence of every source degree of freedom on the observation point.
///
/// The returned vector has one entry per degree of freedom of the source mesh.
pub fn integral_equation_vector<const D: usize, K: Kernel<D>>(
    problem: &BoundaryIntegralProblem<D, K>,
    qs: &QuadStrategy,
    obs: &ObsPt<D>,
) -> DVector<f64> {
    let strategy = IntegrationStrategy::new(&problem.kernel, qs);
    let src_facets = crate::integral::facet_info(problem.src_mesh);
    integral_row(&strategy, &src_facets, obs)
}

/// Evaluates the boundary integral of the source density at a single observation point.
///
/// # Panics
///
/// Panics if the length of `src_strength` does not match the number of source degrees of freedom.
pub fn eval_integral_equation<const D: usize, K: Kernel<D>>(
    problem: &BoundaryIntegralProblem<D, K>,
    qs: &QuadStrategy,
    obs: &ObsPt<D>,
) -> f64 {
    assert_eq!(
        problem.src_strength.len(),
        problem.src_mesh.n_dofs(),
        "source strength must have one entry per source degree of freedom"
    );
    integral_equation_vector(problem, qs, obs).dot(&problem.src_strength)
}

/// Assembles the dense Galerkin matrix of the operator.
///
/// Entry `(i, j)` is the integral over the observation mesh of observation basis function `i`
/// times the operator applied to source basis function `j`. Rows belonging to each
/// observation facet are computed in parallel.
pub fn interact_matrix<const D: usize, K: Kernel<D>>(
    problem: &BoundaryIntegralProblem<D, K>,
    qs: &QuadStrategy,
) -> DMatrix<f64> {
    let n_obs_dofs = problem.obs_mesh.n_dofs();
    let n_src_dofs = problem.src_mesh.n_dofs();
    debug!("Assembling {}x{} interaction matrix", n_obs_dofs, n_src_dofs);

    let strategy = IntegrationStrategy::new(&problem.kernel, qs);
    let obs_quad = facet_quadrature::<D>(qs.obs_order);
    let src_facets = crate::integral::facet_info(problem.src_mesh);

    let blocks: Vec<DMatrix<f64>> = problem
        .obs_mesh
        .facets()
        .par_iter()
        .map(|obs_facet| {
            let obs_info = FacetInfo::build(obs_facet);
            let mut block = DMatrix::zeros(D, n_src_dofs);
            for (w, x_hat) in obs_quad.iter() {
                let obs = ObsPt::from_facet(&obs_info, x_hat, qs.obs_order);
                let row = integral_row(&strategy, &src_facets, &obs);
                let basis = linear_basis::<D>(x_hat);
                for v in 0..D {
                    let factor = basis[v] * w * obs_info.jacobian;
                    for (entry, value) in block.row_mut(v).iter_mut().zip(row.iter()) {
                        *entry += factor * value;
                    }
                }
            }
            block
        })
        .collect();

    let mut matrix = DMatrix::zeros(n_obs_dofs, n_src_dofs);
    for (i, block) in blocks.iter().enumerate() {
        matrix.rows_mut(D * i, D).copy_from(block);
    }
    matrix
}

/// Applies the Galerkin matrix of the operator to the source density.
pub fn direct_interact<const D: usize, K: Kernel<D>>(problem: &BoundaryIntegralProblem<D, K>, qs: &QuadStrategy) -> DVector<f64> {
    apply_operator(&interact_matrix(problem, qs), &problem.src_strength)
}
