use crate::halton_points;
use nalgebra::{Point, Point2, Vector2};
use proptest::prelude::*;
use tbem::geometry::{Aabb, Ball};
use tbem::octree::{build_octree, Octree};

fn check_invariants<const D: usize>(cell: &Octree<D>, balls: &[Ball<D>], max_per_leaf: usize) {
    for &i in &cell.indices {
        let bb = balls[i].bounding_box();
        assert!(cell.true_bounds.contains_point(&Point::from(*bb.min())));
        assert!(cell.true_bounds.contains_point(&Point::from(*bb.max())));
    }
    if cell.is_leaf() {
        let centers_coincide = cell
            .indices
            .iter()
            .all(|&i| balls[i].center == balls[cell.indices[0]].center);
        assert!(cell.n_elements() <= max_per_leaf || centers_coincide);
    } else {
        assert_eq!(cell.children.len(), Octree::<D>::SPLIT);
        let mut child_indices: Vec<usize> = Vec::new();
        for (idx, child) in cell.nonempty_children() {
            assert_eq!(child.level, cell.level + 1);
            assert_eq!(child.bounds, Octree::child_bounds(&cell.bounds, idx));
            assert!(!child.indices.is_empty());
            child_indices.extend(&child.indices);
            check_invariants(child, balls, max_per_leaf);
        }
        child_indices.sort_unstable();
        let mut indices = cell.indices.clone();
        indices.sort_unstable();
        assert_eq!(child_indices, indices);
    }
}

#[test]
fn containing_child_and_child_bounds() {
    let bounds = Aabb::new(Vector2::new(0.0, 0.0), Vector2::new(2.0, 2.0));
    assert_eq!(Octree::find_containing_child(&bounds, &Point2::new(0.5, 0.5)), 0);
    assert_eq!(Octree::find_containing_child(&bounds, &Point2::new(1.5, 0.5)), 1);
    assert_eq!(Octree::find_containing_child(&bounds, &Point2::new(0.5, 1.5)), 2);
    assert_eq!(Octree::find_containing_child(&bounds, &Point2::new(1.5, 1.5)), 3);

    let child = Octree::child_bounds(&bounds, 1);
    assert_eq!(child.min(), &Vector2::new(1.0, 0.0));
    assert_eq!(child.max(), &Vector2::new(2.0, 1.0));
    assert_eq!(Octree::find_containing_child(&child, &Point2::new(1.8, 0.9)), 3);
}

#[test]
fn octree_over_halton_points() {
    let points = halton_points(2000);
    let balls: Vec<_> = points.iter().map(|p| Ball::new(*p, 0.01)).collect();
    let octree = Octree::build(&balls, 20);
    assert_eq!(octree.level, 0);
    assert_eq!(octree.n_elements(), 2000);
    assert!(!octree.is_leaf());
    check_invariants(&octree, &balls, 20);

    let leaf_total: usize = octree.leaves().iter().map(|leaf| leaf.n_elements()).sum();
    assert_eq!(leaf_total, 2000);
    assert!(octree.n_cells() > octree.leaves().len());
}

#[test]
fn coincident_points_stop_splitting() {
    let points = vec![Point2::new(1.0, 1.0); 10];
    let octree = build_octree(&points, 2);
    assert!(octree.is_leaf());
    assert_eq!(octree.n_elements(), 10);
}

#[test]
fn empty_octree_is_a_single_leaf() {
    let octree = build_octree::<3>(&[], 5);
    assert!(octree.is_leaf());
    assert_eq!(octree.n_elements(), 0);
    assert_eq!(octree.n_cells(), 1);
}

#[test]
fn closest_nonempty_child() {
    let points = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
    let octree = build_octree(&points, 1);
    let child = octree
        .find_closest_nonempty_child(&Point2::new(2.0, -1.0))
        .unwrap();
    assert_eq!(octree.children[child].as_ref().unwrap().indices, vec![1]);
    assert!(octree.children[3].is_none());
    let leaf = octree.leaves()[0];
    assert_eq!(leaf.find_closest_nonempty_child(&Point2::origin()), None);
}

proptest! {
    #[test]
    fn octree_invariants_hold_for_arbitrary_points(
        coords in proptest::collection::vec((-5.0..5.0f64, -5.0..5.0f64), 0..200),
        max_per_leaf in 1..10usize,
    ) {
        let balls: Vec<_> = coords.iter().map(|&(x, y)| Ball::new(Point2::new(x, y), 0.1)).collect();
        let octree = Octree::build(&balls, max_per_leaf);
        check_invariants(&octree, &balls, max_per_leaf);
    }
}
