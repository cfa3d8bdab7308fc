//! Nearest facet queries and coincident point matching accelerated by an [`Octree`].
use crate::geometry::{closest_pt_facet, facet_ball, is_intersection_box_ball, Ball, Facet};
use crate::octree::{build_octree, Octree};
use nalgebra::Point;

/// Points closer than this, relative to their magnitude, are considered identical.
pub const IDENTICAL_POINT_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestNeighbor<const D: usize> {
    /// Index of the nearest facet.
    pub idx: usize,
    /// Closest point on the nearest facet.
    pub pt: Point<f64, D>,
    pub distance: f64,
}

/// Facets together with their bounding balls and a tree over those balls.
#[derive(Debug, Clone)]
pub struct NearestNeighborData<const D: usize> {
    pub facets: Vec<Facet<D>>,
    pub facet_balls: Vec<Ball<D>>,
    pub octree: Octree<D>,
}

impl<const D: usize> NearestNeighborData<D> {
    pub fn new(facets: Vec<Facet<D>>, n_facets_per_leaf: usize) -> Self {
        let facet_balls: Vec<_> = facets.iter().map(facet_ball).collect();
        let octree = Octree::build(&facet_balls, n_facets_per_leaf);
        Self {
            facets,
            facet_balls,
            octree,
        }
    }
}

/// Finds the nearest facet among the given subset of facets by checking each of them.
///
/// Returns `None` if `indices` is empty.
pub fn nearest_facet_brute_force_subset<const D: usize>(
    pt: &Point<f64, D>,
    data: &NearestNeighborData<D>,
    indices: &[usize],
) -> Option<NearestNeighbor<D>> {
    let mut nearest: Option<NearestNeighbor<D>> = None;
    for &idx in indices {
        let ball = &data.facet_balls[idx];
        if let Some(best) = &nearest {
            if (ball.center - pt).norm() > best.distance + ball.radius {
                continue;
            }
        }
        let closest = closest_pt_facet(pt, &data.facets[idx]);
        if nearest.map_or(true, |best| closest.distance < best.distance) {
            nearest = Some(NearestNeighbor {
                idx,
                pt: closest.pt,
                distance: closest.distance,
            });
        }
    }
    nearest
}

pub fn nearest_facet_brute_force<const D: usize>(
    pt: &Point<f64, D>,
    data: &NearestNeighborData<D>,
) -> Option<NearestNeighbor<D>> {
    let indices: Vec<_> = (0..data.facets.len()).collect();
    nearest_facet_brute_force_subset(pt, data, &indices)
}

/// Finds the nearest facet by descending the tree.
///
/// The closest child is searched first, after which only those siblings whose contents
/// intersect the ball around `pt` with the current best distance are visited. The
/// result has the same distance as [`nearest_facet_brute_force`].
pub fn nearest_facet<const D: usize>(pt: &Point<f64, D>, data: &NearestNeighborData<D>) -> Option<NearestNeighbor<D>> {
    nearest_facet_in_cell(pt, data, &data.octree)
}

fn nearest_facet_in_cell<const D: usize>(
    pt: &Point<f64, D>,
    data: &NearestNeighborData<D>,
    cell: &Octree<D>,
) -> Option<NearestNeighbor<D>> {
    let closest_child = match cell.find_closest_nonempty_child(pt) {
        Some(child) => child,
        None => return nearest_facet_brute_force_subset(pt, data, &cell.indices),
    };

    let mut nearest = cell.children[closest_child]
        .as_ref()
        .and_then(|child| nearest_facet_in_cell(pt, data, child));

    for (idx, child) in cell.nonempty_children() {
        if idx == closest_child {
            continue;
        }
        if let Some(best) = &nearest {
            if !is_intersection_box_ball(&child.true_bounds, &Ball::new(*pt, best.distance)) {
                continue;
            }
        }
        if let Some(candidate) = nearest_facet_in_cell(pt, data, child) {
            if nearest.map_or(true, |best| candidate.distance < best.distance) {
                nearest = Some(candidate);
            }
        }
    }
    nearest
}

fn is_identical<const D: usize>(a: &Point<f64, D>, b: &Point<f64, D>) -> bool {
    let scale = 1.0f64.max(a.coords.amax()).max(b.coords.amax());
    (a - b).norm() <= IDENTICAL_POINT_TOLERANCE * scale
}

/// Indices of all points in `points` which coincide with `pt`.
///
/// The octree must have been built from `points`, see [`build_octree`].
pub fn identical_points<const D: usize>(pt: &Point<f64, D>, points: &[Point<f64, D>], octree: &Octree<D>) -> Vec<usize> {
    let mut result = Vec::new();
    identical_points_in_cell(pt, points, octree, &mut result);
    result.sort_unstable();
    result
}

fn identical_points_in_cell<const D: usize>(
    pt: &Point<f64, D>,
    points: &[Point<f64, D>],
    cell: &Octree<D>,
    result: &mut Vec<usize>,
) {
    let tolerance = IDENTICAL_POINT_TOLERANCE * 1.0f64.max(pt.coords.amax());
    if !cell
        .true_bounds
        .grow_uniformly(tolerance)
        .contains_point(pt)
    {
        return;
    }
    if cell.is_leaf() {
        result.extend(
            cell.indices
                .iter()
                .copied()
                .filter(|&i| is_identical(pt, &points[i])),
        );
    } else {
        for (_, child) in cell.nonempty_children() {
            identical_points_in_cell(pt, points, child, result);
        }
    }
}

/// All pairs `(i, j)` such that `pts_a[i]` and `pts_b[j]` coincide, sorted lexicographically.
///
/// Both trees are traversed simultaneously, so that only pairs of leaves with overlapping
/// contents are compared point by point.
pub fn identical_points_all_pairs<const D: usize>(
    pts_a: &[Point<f64, D>],
    pts_b: &[Point<f64, D>],
    oct_a: &Octree<D>,
    oct_b: &Octree<D>,
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    if !pts_a.is_empty() && !pts_b.is_empty() {
        all_pairs_in_cells(pts_a, pts_b, oct_a, oct_b, &mut pairs);
    }
    pairs.sort_unstable();
    pairs
}

fn all_pairs_in_cells<const D: usize>(
    pts_a: &[Point<f64, D>],
    pts_b: &[Point<f64, D>],
    cell_a: &Octree<D>,
    cell_b: &Octree<D>,
    pairs: &mut Vec<(usize, usize)>,
) {
    let scale = 1.0f64
        .max(cell_a.true_bounds.min().amax())
        .max(cell_a.true_bounds.max().amax());
    let tolerance = IDENTICAL_POINT_TOLERANCE * scale;
    if !cell_a
        .true_bounds
        .grow_uniformly(tolerance)
        .intersects(&cell_b.true_bounds)
    {
        return;
    }

    match (cell_a.is_leaf(), cell_b.is_leaf()) {
        (true, true) => {
            for &i in &cell_a.indices {
                for &j in &cell_b.indices {
                    if is_identical(&pts_a[i], &pts_b[j]) {
                        pairs.push((i, j));
                    }
                }
            }
        }
        (false, true) => {
            for (_, child) in cell_a.nonempty_children() {
                all_pairs_in_cells(pts_a, pts_b, child, cell_b, pairs);
            }
        }
        (true, false) => {
            for (_, child) in cell_b.nonempty_children() {
                all_pairs_in_cells(pts_a, pts_b, cell_a, child, pairs);
            }
        }
        (false, false) => {
            if cell_a.n_elements() >= cell_b.n_elements() {
                for (_, child) in cell_a.nonempty_children() {
                    all_pairs_in_cells(pts_a, pts_b, child, cell_b, pairs);
                }
            } else {
                for (_, child) in cell_b.nonempty_children() {
                    all_pairs_in_cells(pts_a, pts_b, cell_a, child, pairs);
                }
            }
        }
    }
}

/// Convenience wrapper which builds the trees for [`identical_points_all_pairs`].
pub fn find_identical_point_pairs<const D: usize>(
    pts_a: &[Point<f64, D>],
    pts_b: &[Point<f64, D>],
    max_per_leaf: usize,
) -> Vec<(usize, usize)> {
    let oct_a = build_octree(pts_a, max_per_leaf);
    let oct_b = build_octree(pts_b, max_per_leaf);
    identical_points_all_pairs(pts_a, pts_b, &oct_a, &oct_b)
}
