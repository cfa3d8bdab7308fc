//! A `2^D`-ary spatial tree over balls (quadtree in 2D, octree in 3D).
use crate::geometry::{Aabb, Ball};
use nalgebra::{Point, SVector};

/// Cells at this depth are never split further.
pub const MAX_OCTREE_DEPTH: usize = 32;

/// A cell of the tree, owning its children.
///
/// Elements are distributed among the children according to the orthant of the cell
/// that contains the element's center. Only non-empty children are stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Octree<const D: usize> {
    /// The cube covered by the cell. Child cubes partition the parent cube.
    pub bounds: Aabb<D>,
    /// The smallest box containing every ball in the cell.
    pub true_bounds: Aabb<D>,
    /// Depth of the cell, zero for the root.
    pub level: usize,
    /// Indices of the elements contained in the cell.
    pub indices: Vec<usize>,
    /// Either empty (a leaf) or exactly `2^D` entries.
    pub children: Vec<Option<Octree<D>>>,
}

impl<const D: usize> Octree<D> {
    pub const SPLIT: usize = 1 << D;

    /// Builds a tree over the given balls with at most `max_per_leaf` balls in each leaf.
    ///
    /// Leaves may contain more balls when the depth limit is reached or when all
    /// contained centers coincide.
    pub fn build(balls: &[Ball<D>], max_per_leaf: usize) -> Self {
        let indices: Vec<usize> = (0..balls.len()).collect();
        let bounds = Aabb::from_points(balls.iter().map(|ball| &ball.center))
            .map(|aabb| aabb.cube())
            .unwrap_or_else(|| Aabb::new(SVector::zeros(), SVector::zeros()));
        Self::build_cell(balls, indices, bounds, 0, max_per_leaf.max(1))
    }

    fn build_cell(balls: &[Ball<D>], indices: Vec<usize>, bounds: Aabb<D>, level: usize, max_per_leaf: usize) -> Self {
        let true_bounds = indices
            .iter()
            .map(|&i| balls[i].bounding_box())
            .reduce(|a, b| a.enclose(&b))
            .unwrap_or(bounds);

        let all_centers_coincide = indices
            .first()
            .map(|&first| {
                indices
                    .iter()
                    .all(|&i| balls[i].center == balls[first].center)
            })
            .unwrap_or(true);

        let mut cell = Self {
            bounds,
            true_bounds,
            level,
            indices,
            children: Vec::new(),
        };
        if cell.indices.len() <= max_per_leaf || level >= MAX_OCTREE_DEPTH || all_centers_coincide {
            return cell;
        }

        let mut child_indices = vec![Vec::new(); Self::SPLIT];
        for &i in &cell.indices {
            child_indices[Self::find_containing_child(&bounds, &balls[i].center)].push(i);
        }
        cell.children = child_indices
            .into_iter()
            .enumerate()
            .map(|(child, indices)| {
                (!indices.is_empty()).then(|| {
                    Self::build_cell(balls, indices, Self::child_bounds(&bounds, child), level + 1, max_per_leaf)
                })
            })
            .collect();
        cell
    }

    /// The index of the child orthant of `bounds` that contains `pt`.
    ///
    /// Bit `d` of the index is set when the point lies above the midpoint along axis `d`.
    pub fn find_containing_child(bounds: &Aabb<D>, pt: &Point<f64, D>) -> usize {
        let center = bounds.center();
        (0..D)
            .filter(|&d| pt[d] > center[d])
            .map(|d| 1usize << d)
            .sum()
    }

    /// The cube covered by the given child of a cell with the given bounds.
    pub fn child_bounds(bounds: &Aabb<D>, child: usize) -> Aabb<D> {
        let center = bounds.center().coords;
        let upper = |d: usize| child & (1 << d) != 0;
        let min = SVector::from_fn(|d, _| if upper(d) { center[d] } else { bounds.min()[d] });
        let max = SVector::from_fn(|d, _| if upper(d) { bounds.max()[d] } else { center[d] });
        Aabb::new(min, max)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn n_elements(&self) -> usize {
        self.indices.len()
    }

    /// The non-empty child whose contents lie closest to `pt`.
    ///
    /// Returns `None` for leaves.
    pub fn find_closest_nonempty_child(&self, pt: &Point<f64, D>) -> Option<usize> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, child)| {
                child
                    .as_ref()
                    .map(|child| (i, child.true_bounds.distance_squared_to_point(pt)))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
    }

    /// Iterates over the existing children of the cell.
    pub fn nonempty_children(&self) -> impl '_ + Iterator<Item = (usize, &Octree<D>)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, child)| child.as_ref().map(|child| (i, child)))
    }

    /// Total number of cells in the tree, including the root.
    pub fn n_cells(&self) -> usize {
        1 + self
            .nonempty_children()
            .map(|(_, child)| child.n_cells())
            .sum::<usize>()
    }

    /// Collects all leaves of the tree in depth-first order.
    pub fn leaves(&self) -> Vec<&Octree<D>> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a Octree<D>>) {
        if self.is_leaf() {
            leaves.push(self);
        } else {
            for (_, child) in self.nonempty_children() {
                child.collect_leaves(leaves);
            }
        }
    }
}

/// Builds a tree over points, treated as balls of zero radius.
pub fn build_octree<const D: usize>(points: &[Point<f64, D>], max_per_leaf: usize) -> Octree<D> {
    let balls: Vec<_> = points.iter().map(|p| Ball::new(*p, 0.0)).collect();
    Octree::build(&balls, max_per_leaf)
}
