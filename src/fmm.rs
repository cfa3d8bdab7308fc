//! Chebyshev interpolation treecode and fast multipole method for sums of pairwise point
//! interactions in 3D.
//!
//! The sources are arranged in an [`Octree`]. Each cell carries multipole weights at the
//! tensor product Chebyshev nodes of its bounding cube: leaves interpolate their points
//! onto the nodes (P2M) and parents interpolate the nodes of their children (M2M).
//! Observation points interact with well-separated cells through the nodes (M2P) and
//! with the points of nearby leaves directly (P2P). The [`Fmm`] additionally builds local
//! expansions in an octree over the observation points.
use crate::geometry::Aabb;
use crate::octree::{build_octree, Octree};
use log::debug;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmmSettings {
    /// Number of Chebyshev nodes per axis in each cell expansion.
    pub n_exp_pts: usize,
    /// Multipole acceptance criterion: a cell is approximated when the distance to its
    /// center exceeds `mac` times its radius.
    pub mac: f64,
    pub max_pts_per_cell: usize,
}

impl Default for FmmSettings {
    fn default() -> Self {
        Self {
            n_exp_pts: 5,
            mac: 3.0,
            max_pts_per_cell: 50,
        }
    }
}

/// The `n` Chebyshev nodes of the first kind on `[-1, 1]`.
pub fn cheb_pts_first_kind(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| ((2 * i + 1) as f64 * PI / (2 * n) as f64).cos())
        .collect()
}

/// The Chebyshev interpolation weight `S_n(a, b) = 1/n + 2/n sum_{k=1}^{n-1} T_k(a) T_k(b)`.
pub fn s_n(a: f64, b: f64, n: usize) -> f64 {
    let mut sum = 0.0;
    let (mut ta_prev, mut ta) = (1.0, a);
    let (mut tb_prev, mut tb) = (1.0, b);
    for _ in 1..n {
        sum += ta * tb;
        (ta_prev, ta) = (ta, 2.0 * a * ta - ta_prev);
        (tb_prev, tb) = (tb, 2.0 * b * tb - tb_prev);
    }
    (1.0 + 2.0 * sum) / n as f64
}

/// Maps `x_hat` in `[-1, 1]` to the interval `[a, b]`.
pub fn ref_to_real(x_hat: f64, a: f64, b: f64) -> f64 {
    a + 0.5 * (x_hat + 1.0) * (b - a)
}

/// Maps `x` in `[a, b]` to `[-1, 1]`. Degenerate intervals map to zero.
pub fn real_to_ref(x: f64, a: f64, b: f64) -> f64 {
    if b > a {
        (2.0 * x - a - b) / (b - a)
    } else {
        0.0
    }
}

/// Reference coordinates of the tensor product nodes, ordered with the last axis fastest.
fn expansion_nodes(n_exp_pts: usize) -> Vec<Vector3<f64>> {
    let nodes = cheb_pts_first_kind(n_exp_pts);
    let mut nodes_3d = Vec::with_capacity(n_exp_pts.pow(3));
    for &x in &nodes {
        for &y in &nodes {
            for &z in &nodes {
                nodes_3d.push(Vector3::new(x, y, z));
            }
        }
    }
    nodes_3d
}

fn node_to_real(node: &Vector3<f64>, bounds: &Aabb<3>) -> Point3<f64> {
    Point3::from(Vector3::from_fn(|d, _| {
        ref_to_real(node[d], bounds.min()[d], bounds.max()[d])
    }))
}

fn interp_operator(bounds: &Aabb<3>, node: &Vector3<f64>, pt: &Point3<f64>, n_exp_pts: usize) -> f64 {
    (0..3)
        .map(|d| {
            let x_hat = real_to_ref(pt[d], bounds.min()[d], bounds.max()[d]);
            s_n(node[d], x_hat, n_exp_pts)
        })
        .product()
}

/// Multipole weights of a cell, mirroring the structure of the source octree.
#[derive(Debug, Clone)]
struct Expansion {
    weights: Vec<f64>,
    children: Vec<Option<Expansion>>,
}

/// Upward pass: P2M at the leaves and M2M towards the root.
fn multipole_expansion(
    cell: &Octree<3>,
    nodes: &[Vector3<f64>],
    src_pts: &[Point3<f64>],
    values: &[f64],
    n_exp_pts: usize,
) -> Expansion {
    let mut weights = vec![0.0; nodes.len()];

    if cell.is_leaf() {
        // P2M
        for &i in &cell.indices {
            for (weight, node) in weights.iter_mut().zip(nodes) {
                *weight += values[i] * interp_operator(&cell.bounds, node, &src_pts[i], n_exp_pts);
            }
        }
        return Expansion {
            weights,
            children: Vec::new(),
        };
    }

    let children: Vec<Option<Expansion>> = cell
        .children
        .iter()
        .map(|child| {
            child
                .as_ref()
                .map(|child| multipole_expansion(child, nodes, src_pts, values, n_exp_pts))
        })
        .collect();

    // M2M
    for (child_cell, child_expansion) in cell.children.iter().zip(&children) {
        if let (Some(child_cell), Some(child_expansion)) = (child_cell, child_expansion) {
            for (child_node, child_weight) in nodes.iter().zip(&child_expansion.weights) {
                let mapped = node_to_real(child_node, &child_cell.bounds);
                for (weight, node) in weights.iter_mut().zip(nodes) {
                    *weight += child_weight * interp_operator(&cell.bounds, node, &mapped, n_exp_pts);
                }
            }
        }
    }

    Expansion { weights, children }
}

/// The effect of the multipole weights of a source cell at `obs` (M2P, or M2L for a node).
fn multipole_effect<K>(kernel: &K, nodes: &[Vector3<f64>], obs: &Point3<f64>, cell: &Octree<3>, expansion: &Expansion) -> f64
where
    K: Fn(&Point3<f64>, &Point3<f64>) -> f64,
{
    nodes
        .iter()
        .zip(&expansion.weights)
        .map(|(node, weight)| weight * kernel(obs, &node_to_real(node, &cell.bounds)))
        .sum()
}

fn direct_effect<K>(kernel: &K, obs: &Point3<f64>, cell: &Octree<3>, src_pts: &[Point3<f64>], values: &[f64]) -> f64
where
    K: Fn(&Point3<f64>, &Point3<f64>) -> f64,
{
    cell.indices
        .iter()
        .map(|&i| values[i] * kernel(obs, &src_pts[i]))
        .sum()
}

fn check_inputs(src_pts: &[Point3<f64>], values: &[f64], settings: &FmmSettings) {
    assert_eq!(src_pts.len(), values.len(), "one value per source point is required");
    assert!(settings.n_exp_pts > 0, "expansions need at least one node per axis");
}

pub struct Treecode<K> {
    kernel: K,
    settings: FmmSettings,
    src_pts: Vec<Point3<f64>>,
    values: Vec<f64>,
    octree: Octree<3>,
    nodes: Vec<Vector3<f64>>,
    expansion: Expansion,
}

impl<K> Treecode<K>
where
    K: Fn(&Point3<f64>, &Point3<f64>) -> f64 + Sync,
{
    /// Builds the octree over the sources and computes all multipole weights.
    ///
    /// The kernel is called as `kernel(obs, src)`.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not contain exactly one entry per source point, or if
    /// `settings.n_exp_pts == 0`.
    pub fn new(kernel: K, src_pts: &[Point3<f64>], values: &[f64], settings: FmmSettings) -> Self {
        check_inputs(src_pts, values, &settings);

        let octree = build_octree(src_pts, settings.max_pts_per_cell);
        debug!(
            "Treecode over {} sources uses {} octree cells",
            src_pts.len(),
            octree.n_cells()
        );
        let nodes = expansion_nodes(settings.n_exp_pts);
        let expansion = multipole_expansion(&octree, &nodes, src_pts, values, settings.n_exp_pts);
        Self {
            kernel,
            settings,
            src_pts: src_pts.to_vec(),
            values: values.to_vec(),
            octree,
            nodes,
            expansion,
        }
    }

    pub fn settings(&self) -> &FmmSettings {
        &self.settings
    }

    pub fn octree(&self) -> &Octree<3> {
        &self.octree
    }

    /// Evaluates `sum_j kernel(obs, src_j) * value_j` at every observation point.
    pub fn evaluate(&self, obs_pts: &[Point3<f64>]) -> Vec<f64> {
        obs_pts
            .par_iter()
            .map(|obs| self.evaluate_cell(obs, &self.octree, &self.expansion))
            .collect()
    }

    fn evaluate_cell(&self, obs: &Point3<f64>, cell: &Octree<3>, expansion: &Expansion) -> f64 {
        let mac2 = self.settings.mac * self.settings.mac;
        let dist2 = (obs - cell.bounds.center()).norm_squared();
        if dist2 > mac2 * cell.bounds.radius_squared() {
            // M2P
            multipole_effect(&self.kernel, &self.nodes, obs, cell, expansion)
        } else if cell.is_leaf() {
            // P2P
            direct_effect(&self.kernel, obs, cell, &self.src_pts, &self.values)
        } else {
            cell.children
                .iter()
                .zip(&expansion.children)
                .filter_map(|(child, child_expansion)| child.as_ref().zip(child_expansion.as_ref()))
                .map(|(child, child_expansion)| self.evaluate_cell(obs, child, child_expansion))
                .sum()
        }
    }
}

/// Source cells assigned to one observation cell by the dual tree traversal.
///
/// The lists mirror the structure of the observation octree.
#[derive(Debug)]
struct InteractionLists<'a> {
    p2p: Vec<&'a Octree<3>>,
    m2p: Vec<(&'a Octree<3>, &'a Expansion)>,
    m2l: Vec<(&'a Octree<3>, &'a Expansion)>,
    children: Vec<Option<InteractionLists<'a>>>,
}

impl<'a> InteractionLists<'a> {
    fn for_cell(cell: &Octree<3>) -> Self {
        Self {
            p2p: Vec::new(),
            m2p: Vec::new(),
            m2l: Vec::new(),
            children: cell
                .children
                .iter()
                .map(|child| child.as_ref().map(Self::for_cell))
                .collect(),
        }
    }

    /// Total number of P2P, M2P and M2L cell pairs in the subtree.
    fn counts(&self) -> [usize; 3] {
        self.children
            .iter()
            .flatten()
            .map(Self::counts)
            .fold([self.p2p.len(), self.m2p.len(), self.m2l.len()], |[a, b, c], [x, y, z]| {
                [a + x, b + y, c + z]
            })
    }
}

/// A dual tree fast multipole method with Chebyshev interpolation in 3D.
///
/// In addition to the multipole expansions of [`Treecode`], the observation points are
/// arranged in their own octree carrying local expansions at the same Chebyshev nodes.
/// Pairs of well-separated cells interact node-to-node (M2L). Local expansions are passed
/// down to the children (L2L) and finally interpolated to the observation points (L2P).
/// Cells with fewer points than expansion nodes use M2P or P2P instead.
pub struct Fmm<K> {
    kernel: K,
    settings: FmmSettings,
    src_pts: Vec<Point3<f64>>,
    values: Vec<f64>,
    src_octree: Octree<3>,
    nodes: Vec<Vector3<f64>>,
    multipoles: Expansion,
}

impl<K> Fmm<K>
where
    K: Fn(&Point3<f64>, &Point3<f64>) -> f64 + Sync,
{
    /// Builds the source octree and computes all multipole weights.
    ///
    /// The kernel is called as `kernel(obs, src)`.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not contain exactly one entry per source point, or if
    /// `settings.n_exp_pts == 0`.
    pub fn new(kernel: K, src_pts: &[Point3<f64>], values: &[f64], settings: FmmSettings) -> Self {
        check_inputs(src_pts, values, &settings);

        let src_octree = build_octree(src_pts, settings.max_pts_per_cell);
        let nodes = expansion_nodes(settings.n_exp_pts);
        let multipoles = multipole_expansion(&src_octree, &nodes, src_pts, values, settings.n_exp_pts);
        Self {
            kernel,
            settings,
            src_pts: src_pts.to_vec(),
            values: values.to_vec(),
            src_octree,
            nodes,
            multipoles,
        }
    }

    pub fn settings(&self) -> &FmmSettings {
        &self.settings
    }

    pub fn source_octree(&self) -> &Octree<3> {
        &self.src_octree
    }

    /// Evaluates `sum_j kernel(obs, src_j) * value_j` at every observation point.
    pub fn evaluate(&self, obs_pts: &[Point3<f64>]) -> Vec<f64> {
        let mut result = vec![0.0; obs_pts.len()];
        if obs_pts.is_empty() {
            return result;
        }

        let obs_octree = build_octree(obs_pts, self.settings.max_pts_per_cell);
        let mut lists = InteractionLists::for_cell(&obs_octree);
        self.process_cell_pair(&self.src_octree, &self.multipoles, &obs_octree, &mut lists);
        let [n_p2p, n_m2p, n_m2l] = lists.counts();
        debug!(
            "FMM with {} source cells and {} observation cells: {} P2P, {} M2P and {} M2L cell pairs",
            self.src_octree.n_cells(),
            obs_octree.n_cells(),
            n_p2p,
            n_m2p,
            n_m2l
        );

        for (i, effect) in self.downward_pass(obs_pts, &obs_octree, &lists, None) {
            result[i] += effect;
        }
        result
    }

    fn process_cell_pair<'a>(
        &'a self,
        m_cell: &'a Octree<3>,
        m_expansion: &'a Expansion,
        l_cell: &Octree<3>,
        lists: &mut InteractionLists<'a>,
    ) {
        let n_nodes = self.nodes.len();
        let mac2 = self.settings.mac * self.settings.mac;
        let dist2 = (l_cell.bounds.center() - m_cell.bounds.center()).norm_squared();
        let radii2 = m_cell.bounds.radius_squared() + l_cell.bounds.radius_squared();

        if 2.0 * dist2 > mac2 * radii2 {
            if l_cell.n_elements() >= n_nodes {
                lists.m2l.push((m_cell, m_expansion));
            } else if m_cell.n_elements() >= n_nodes {
                lists.m2p.push((m_cell, m_expansion));
            } else {
                lists.p2p.push(m_cell);
            }
        } else if m_cell.is_leaf() && l_cell.is_leaf() {
            lists.p2p.push(m_cell);
        } else if m_cell.is_leaf() || (l_cell.level <= m_cell.level && !l_cell.is_leaf()) {
            // Refining the observation cell gives every task its own output lists
            l_cell
                .children
                .par_iter()
                .zip(lists.children.par_iter_mut())
                .for_each(|(l_child, child_lists)| {
                    if let (Some(l_child), Some(child_lists)) = (l_child, child_lists) {
                        self.process_cell_pair(m_cell, m_expansion, l_child, child_lists);
                    }
                });
        } else {
            for (m_child, m_child_expansion) in m_cell.children.iter().zip(&m_expansion.children) {
                if let (Some(m_child), Some(m_child_expansion)) = (m_child, m_child_expansion) {
                    self.process_cell_pair(m_child, m_child_expansion, l_cell, lists);
                }
            }
        }
    }

    /// Returns `(observation index, effect)` pairs for the points of `l_cell`. A point may
    /// appear several times.
    fn downward_pass(
        &self,
        obs_pts: &[Point3<f64>],
        l_cell: &Octree<3>,
        lists: &InteractionLists,
        parent_local: Option<(&Aabb<3>, &[f64])>,
    ) -> Vec<(usize, f64)> {
        let n = self.settings.n_exp_pts;

        let mut effects = Vec::new();
        if !lists.p2p.is_empty() || !lists.m2p.is_empty() {
            effects.extend(l_cell.indices.iter().map(|&i| {
                let obs = &obs_pts[i];
                let p2p: f64 = lists
                    .p2p
                    .iter()
                    .map(|m_cell| direct_effect(&self.kernel, obs, m_cell, &self.src_pts, &self.values))
                    .sum();
                let m2p: f64 = lists
                    .m2p
                    .iter()
                    .map(|(m_cell, expansion)| multipole_effect(&self.kernel, &self.nodes, obs, m_cell, expansion))
                    .sum();
                (i, p2p + m2p)
            }));
        }

        let mut local: Option<Vec<f64>> = None;
        if let Some((parent_bounds, parent_weights)) = parent_local {
            // L2L
            let weights: Vec<f64> = self
                .nodes
                .iter()
                .map(|node| {
                    let mapped = node_to_real(node, &l_cell.bounds);
                    self.nodes
                        .iter()
                        .zip(parent_weights)
                        .map(|(parent_node, parent_weight)| {
                            parent_weight * interp_operator(parent_bounds, parent_node, &mapped, n)
                        })
                        .sum::<f64>()
                })
                .collect();
            local = Some(weights);
        }
        if !lists.m2l.is_empty() {
            let weights = local.get_or_insert_with(|| vec![0.0; self.nodes.len()]);
            for (weight, node) in weights.iter_mut().zip(&self.nodes) {
                let obs_node = node_to_real(node, &l_cell.bounds);
                // M2L
                *weight += lists
                    .m2l
                    .iter()
                    .map(|(m_cell, expansion)| multipole_effect(&self.kernel, &self.nodes, &obs_node, m_cell, expansion))
                    .sum::<f64>();
            }
        }

        if l_cell.is_leaf() {
            if let Some(weights) = &local {
                // L2P
                effects.extend(l_cell.indices.iter().map(|&i| {
                    let effect: f64 = self
                        .nodes
                        .iter()
                        .zip(weights)
                        .map(|(node, weight)| weight * interp_operator(&l_cell.bounds, node, &obs_pts[i], n))
                        .sum();
                    (i, effect)
                }));
            }
        } else {
            let child_local = local.as_deref().map(|weights| (&l_cell.bounds, weights));
            let child_effects: Vec<(usize, f64)> = l_cell
                .children
                .par_iter()
                .zip(lists.children.par_iter())
                .filter_map(|(child, child_lists)| child.as_ref().zip(child_lists.as_ref()))
                .flat_map_iter(|(child, child_lists)| self.downward_pass(obs_pts, child, child_lists, child_local))
                .collect();
            effects.extend(child_effects);
        }
        effects
    }
}

/// Computes `sum_j kernel(obs_i, src_j) * values_j` for every observation point directly.
pub fn direct_sum<K>(kernel: K, src_pts: &[Point3<f64>], values: &[f64], obs_pts: &[Point3<f64>]) -> Vec<f64>
where
    K: Fn(&Point3<f64>, &Point3<f64>) -> f64 + Sync,
{
    assert_eq!(src_pts.len(), values.len(), "one value per source point is required");
    obs_pts
        .par_iter()
        .map(|obs| {
            src_pts
                .iter()
                .zip(values)
                .map(|(src, value)| value * kernel(obs, src))
                .sum()
        })
        .collect()
}
