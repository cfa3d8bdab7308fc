//! Evaluation of boundary integral terms between an observation point and a source facet.
//!
//! Each term is classified by the distance between the observation point and the source
//! facet. Far away facets are integrated with a fixed Gauss rule and nearby facets with
//! either adaptive quadrature or a sinh transformed Gauss rule, see [`NearfieldRule`]. Observation points lying on the facet itself are handled by moving
//! the point off the facet in a sequence of shrinking steps and extrapolating the results
//! back to the surface.
use crate::geometry::{
    closest_pt_facet, facet_ball, facet_jacobian, facet_normal, linear_basis, ref_to_real, Facet,
};
use crate::kernels::Kernel;
use crate::mesh::FacetMesh;
use crate::quadrature::{
    adaptive_integrate, facet_quadrature, gauss, sinh_polar_triangle, sinh_transform, QuadratureRule,
};
use crate::richardson::richardson_limit;
use nalgebra::{Point, SVector, Vector2};
use serde::{Deserialize, Serialize};

/// Precomputed geometric quantities of a source facet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacetInfo<const D: usize> {
    pub facet: Facet<D>,
    /// Radius of the smallest centroid-centered ball containing the facet.
    pub length_scale: f64,
    pub jacobian: f64,
    pub normal: SVector<f64, D>,
}

impl<const D: usize> FacetInfo<D> {
    pub fn build(facet: &Facet<D>) -> Self {
        Self {
            facet: *facet,
            length_scale: facet_ball(facet).radius,
            jacobian: facet_jacobian(facet),
            normal: facet_normal(facet),
        }
    }
}

pub fn facet_info<const D: usize>(mesh: &FacetMesh<D>) -> Vec<FacetInfo<D>> {
    mesh.facets().iter().map(FacetInfo::build).collect()
}

/// An observation point for evaluating a boundary integral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObsPt<const D: usize> {
    /// Length scale of the singular step sequence.
    pub len_scale: f64,
    pub loc: Point<f64, D>,
    pub normal: SVector<f64, D>,
    /// Direction along which the point is moved off the surface for singular integrals.
    pub richardson_dir: SVector<f64, D>,
}

impl<const D: usize> ObsPt<D> {
    pub fn new(len_scale: f64, loc: Point<f64, D>, normal: SVector<f64, D>, richardson_dir: SVector<f64, D>) -> Self {
        Self {
            len_scale,
            loc,
            normal,
            richardson_dir,
        }
    }

    /// The observation point at reference coordinates `x_hat` of an observation facet.
    ///
    /// The point steps off the facet along its normal, with a length scale shrinking with
    /// the order of the observation quadrature.
    pub fn from_facet(facet: &FacetInfo<D>, x_hat: &Vector2<f64>, obs_order: usize) -> Self {
        Self {
            len_scale: facet.length_scale / obs_order.max(1) as f64,
            loc: ref_to_real(x_hat, &facet.facet),
            normal: facet.normal,
            richardson_dir: facet.normal,
        }
    }
}

/// Quadrature used for nearfield source facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearfieldRule {
    /// Adaptive Simpson quadrature to the absolute tolerance `near_tol`.
    Adaptive,
    /// Gauss rules clustered around the closest point of the facet with the sinh
    /// transformation. The order grows with the logarithm of the relative distance.
    Sinh,
}

/// Parameters controlling how boundary integrals are computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadStrategy {
    /// Order of the Gauss rule used on observation facets.
    pub obs_order: usize,
    /// Order of the Gauss rule used for farfield source facets.
    pub src_far_order: usize,
    /// Number of Richardson steps used for singular integrals. Must be at least two.
    pub n_singular_steps: usize,
    /// Facets closer than `far_threshold * length_scale` are integrated adaptively.
    pub far_threshold: f64,
    /// Facets closer than `singular_threshold * length_scale` are treated as singular.
    pub singular_threshold: f64,
    /// Absolute tolerance of the adaptive nearfield quadrature.
    pub near_tol: f64,
    pub nearfield_rule: NearfieldRule,
    /// Base order of the sinh rule, also the growth rate of the order per unit of
    /// `-ln(distance / length_scale)`.
    pub sinh_order: usize,
}

impl Default for QuadStrategy {
    fn default() -> Self {
        Self {
            obs_order: 2,
            src_far_order: 4,
            n_singular_steps: 6,
            far_threshold: 3.0,
            singular_threshold: 1e-10,
            near_tol: 1e-6,
            nearfield_rule: NearfieldRule::Adaptive,
            sinh_order: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FarNearType {
    Farfield,
    Nearfield,
    Singular,
}

/// The point on a facet closest to an observation point, along with its classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint<const D: usize> {
    pub ref_pt: Vector2<f64>,
    pub pt: Point<f64, D>,
    pub distance: f64,
    pub kind: FarNearType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarNearLogic {
    pub far_threshold: f64,
    pub singular_threshold: f64,
}

impl From<&QuadStrategy> for FarNearLogic {
    fn from(qs: &QuadStrategy) -> Self {
        Self {
            far_threshold: qs.far_threshold,
            singular_threshold: qs.singular_threshold,
        }
    }
}

impl FarNearLogic {
    pub fn decide<const D: usize>(&self, pt: &Point<f64, D>, facet: &FacetInfo<D>) -> NearestPoint<D> {
        let closest = closest_pt_facet(pt, &facet.facet);
        let kind = if closest.distance < self.singular_threshold * facet.length_scale {
            FarNearType::Singular
        } else if closest.distance < self.far_threshold * facet.length_scale {
            FarNearType::Nearfield
        } else {
            FarNearType::Farfield
        };
        NearestPoint {
            ref_pt: closest.ref_pt,
            pt: closest.pt,
            distance: closest.distance,
            kind,
        }
    }
}

/// The interaction between a single observation point and a single source facet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegralTerm<const D: usize> {
    pub obs: ObsPt<D>,
    pub src_facet: FacetInfo<D>,
}

impl<const D: usize> IntegralTerm<D> {
    pub fn new(obs: ObsPt<D>, src_facet: FacetInfo<D>) -> Self {
        Self { obs, src_facet }
    }

    /// The integrand at reference point `x_hat` of the source facet, for each of the
    /// source facet's basis functions, including the jacobian of the facet.
    pub fn eval_point_influence<K: Kernel<D>>(
        &self,
        kernel: &K,
        x_hat: &Vector2<f64>,
        obs_loc: &Point<f64, D>,
    ) -> SVector<f64, D> {
        let src_pt = ref_to_real(x_hat, &self.src_facet.facet);
        let delta = src_pt - obs_loc;
        let r2 = delta.norm_squared();
        let kernel_val = kernel.evaluate(r2, &delta, &self.src_facet.normal, &self.obs.normal);
        linear_basis::<D>(x_hat) * (kernel_val * self.src_facet.jacobian)
    }
}

// Beyond this distance relative to the length scale the sinh rule is replaced by plain Gauss
const SINH_MAX_SCALED_DISTANCE: f64 = 0.5;
const SINH_FALLBACK_ORDER: usize = 10;

/// Computes integral terms according to their farfield/nearfield/singular classification.
#[derive(Debug, Clone)]
pub struct IntegrationStrategy<const D: usize, K> {
    kernel: K,
    settings: QuadStrategy,
    src_far_quad: QuadratureRule,
}

impl<const D: usize, K: Kernel<D>> IntegrationStrategy<D, K> {
    pub fn new(kernel: K, settings: &QuadStrategy) -> Self {
        Self {
            kernel,
            settings: settings.clone(),
            src_far_quad: facet_quadrature::<D>(settings.src_far_order),
        }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn far_near_logic(&self) -> FarNearLogic {
        FarNearLogic::from(&self.settings)
    }

    /// Classifies the term and integrates it accordingly.
    pub fn integrate(&self, term: &IntegralTerm<D>) -> SVector<f64, D> {
        let nearest = self.far_near_logic().decide(&term.obs.loc, &term.src_facet);
        self.compute_term(term, &nearest)
    }

    pub fn compute_term(&self, term: &IntegralTerm<D>, nearest: &NearestPoint<D>) -> SVector<f64, D> {
        match nearest.kind {
            FarNearType::Farfield => self.compute_farfield(term),
            FarNearType::Nearfield => self.compute_nearfield(term),
            FarNearType::Singular => self.compute_singular(term),
        }
    }

    pub fn compute_farfield(&self, term: &IntegralTerm<D>) -> SVector<f64, D> {
        self.src_far_quad
            .integrate(|x_hat| term.eval_point_influence(&self.kernel, x_hat, &term.obs.loc))
    }

    pub fn compute_nearfield(&self, term: &IntegralTerm<D>) -> SVector<f64, D> {
        match self.settings.nearfield_rule {
            NearfieldRule::Adaptive => self.compute_nearfield_adaptive(term),
            NearfieldRule::Sinh => self.compute_nearfield_sinh(term),
        }
    }

    pub fn compute_nearfield_adaptive(&self, term: &IntegralTerm<D>) -> SVector<f64, D> {
        let tol = self.settings.near_tol;
        let obs_loc = &term.obs.loc;
        match D {
            2 => adaptive_integrate(
                |x| term.eval_point_influence(&self.kernel, &Vector2::new(x, 0.0), obs_loc),
                -1.0,
                1.0,
                tol,
            ),
            3 => adaptive_integrate(
                |x| {
                    if x == 1.0 {
                        return SVector::zeros();
                    }
                    adaptive_integrate(
                        |y| term.eval_point_influence(&self.kernel, &Vector2::new(x, y), obs_loc),
                        0.0,
                        1.0 - x,
                        tol,
                    )
                },
                0.0,
                1.0,
                tol,
            ),
            _ => panic!("facets are only supported in 2 and 3 dimensions, got {D}"),
        }
    }

    /// Integrates with a sinh transformed rule clustered around the point of the source facet
    /// closest to the observation point.
    ///
    /// Observation points lying on the facet have no nearly singular structure to resolve
    /// and fall back to the adaptive rule.
    pub fn compute_nearfield_sinh(&self, term: &IntegralTerm<D>) -> SVector<f64, D> {
        let nearest = closest_pt_facet(&term.obs.loc, &term.src_facet.facet);
        if nearest.distance <= 0.0 {
            return self.compute_nearfield_adaptive(term);
        }
        self.sinh_rule(term, &nearest.ref_pt, &nearest.pt, nearest.distance)
            .integrate(|x_hat| term.eval_point_influence(&self.kernel, x_hat, &term.obs.loc))
    }

    fn sinh_rule(
        &self,
        term: &IntegralTerm<D>,
        ref_pt: &Vector2<f64>,
        pt: &Point<f64, D>,
        distance: f64,
    ) -> QuadratureRule {
        let scaled_distance = distance / term.src_facet.length_scale;
        if scaled_distance > SINH_MAX_SCALED_DISTANCE {
            return facet_quadrature::<D>(SINH_FALLBACK_ORDER);
        }
        let base = self.settings.sinh_order.max(1);
        let n = base + (base as f64 * -scaled_distance.ln()) as usize;
        match D {
            // The reference segment [-1, 1] has half the facet length, which is the length scale
            2 => sinh_transform(&gauss(n), ref_pt.x, scaled_distance),
            3 => sinh_polar_triangle(n, ref_pt, |edge_pt| {
                distance / (ref_to_real(edge_pt, &term.src_facet.facet) - pt).norm()
            }),
            _ => panic!("facets are only supported in 2 and 3 dimensions, got {D}"),
        }
    }

    /// Integrates at a sequence of points stepping towards the observation point along its
    /// Richardson direction and extrapolates to the limit.
    ///
    /// # Panics
    ///
    /// Panics if fewer than two singular steps are configured.
    pub fn compute_singular(&self, term: &IntegralTerm<D>) -> SVector<f64, D> {
        let obs = &term.obs;
        let steps: Vec<_> = (0..self.settings.n_singular_steps)
            .map(|i| {
                let step_size = obs.len_scale * 0.5f64.powi(i as i32);
                let moved = ObsPt {
                    loc: obs.loc + obs.richardson_dir * step_size,
                    ..*obs
                };
                self.compute_nearfield(&IntegralTerm::new(moved, term.src_facet))
            })
            .collect();
        richardson_limit(2.0, &steps)
    }
}
