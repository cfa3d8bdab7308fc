use nalgebra::{dvector, DVector};
use proptest::prelude::*;
use tbem::block_dof_map::{block_dof_map_from_functions, build_block_dof_map, concatenate, expand};
use util::{assert_panics, prefix_sum};

#[test]
fn build_from_component_sizes() {
    let map = build_block_dof_map(&[1, 2, 3, 4]);
    assert_eq!(map.n_components, 4);
    assert_eq!(map.n_dofs, 10);
    assert_eq!(map.start_positions, vec![0, 1, 3, 6]);
    assert_eq!(map.component_size(3), 4);

    let empty = build_block_dof_map(&[]);
    assert_eq!(empty.n_dofs, 0);
    assert!(empty.start_positions.is_empty());
}

#[test]
fn concatenate_and_expand_functions() {
    let functions = vec![dvector![1.0, 2.0], dvector![3.0, 4.0, 5.0], dvector![6.0]];
    let map = block_dof_map_from_functions(&functions);
    assert_eq!(map.start_positions, vec![0, 2, 5]);
    assert_eq!(map.n_dofs, 6);

    let all = concatenate(&map, &functions);
    assert_eq!(all, dvector![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(expand(&map, &all), functions);
}

#[test]
fn expand_splits_by_component_size() {
    let map = build_block_dof_map(&[1, 3, 1]);
    let parts = expand(&map, &dvector![1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(parts, vec![dvector![1.0], dvector![2.0, 3.0, 4.0], dvector![5.0]]);
}

#[test]
fn mismatched_layouts_panic() {
    let map = build_block_dof_map(&[2, 1]);
    assert_panics!(concatenate(&map, &[dvector![1.0, 2.0]]));
    assert_panics!(concatenate(&map, &[dvector![1.0], dvector![2.0, 3.0]]));
    assert_panics!(expand(&map, &dvector![1.0, 2.0]));
}

proptest! {
    #[test]
    fn expand_inverts_concatenate(sizes in proptest::collection::vec(0..6usize, 0..6)) {
        let functions: Vec<DVector<f64>> = sizes
            .iter()
            .enumerate()
            .map(|(i, &n)| DVector::from_fn(n, |j, _| (10 * i + j) as f64))
            .collect();
        let map = block_dof_map_from_functions(&functions);
        let expected_starts: Vec<usize> = prefix_sum(sizes.iter().copied(), 0).collect();
        prop_assert_eq!(&map.start_positions, &expected_starts);
        prop_assert_eq!(map.n_dofs, sizes.iter().sum::<usize>());
        prop_assert_eq!(expand(&map, &concatenate(&map, &functions)), functions);
    }
}
