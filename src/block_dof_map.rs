//! Concatenation of the degrees of freedom of several functions into one global numbering.
use nalgebra::DVector;

/// Describes how the degrees of freedom of `n_components` functions are laid out one after
/// another in a single vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDofMap {
    pub n_components: usize,
    pub n_dofs: usize,
    /// Index of the first degree of freedom of each component.
    pub start_positions: Vec<usize>,
}

impl BlockDofMap {
    /// The number of degrees of freedom of the given component.
    pub fn component_size(&self, component: usize) -> usize {
        let end = self
            .start_positions
            .get(component + 1)
            .copied()
            .unwrap_or(self.n_dofs);
        end - self.start_positions[component]
    }
}

pub fn build_block_dof_map(component_sizes: &[usize]) -> BlockDofMap {
    let start_positions = component_sizes
        .iter()
        .scan(0, |next, size| {
            let start = *next;
            *next += size;
            Some(start)
        })
        .collect();
    BlockDofMap {
        n_components: component_sizes.len(),
        n_dofs: component_sizes.iter().sum(),
        start_positions,
    }
}

pub fn block_dof_map_from_functions(functions: &[DVector<f64>]) -> BlockDofMap {
    let sizes: Vec<usize> = functions.iter().map(|f| f.len()).collect();
    build_block_dof_map(&sizes)
}

/// Concatenates the component functions into a single vector.
///
/// # Panics
///
/// Panics if the functions do not match the layout of `dof_map`.
pub fn concatenate(dof_map: &BlockDofMap, functions: &[DVector<f64>]) -> DVector<f64> {
    assert_eq!(functions.len(), dof_map.n_components, "wrong number of components");
    let mut out = DVector::zeros(dof_map.n_dofs);
    for (component, f) in functions.iter().enumerate() {
        assert_eq!(f.len(), dof_map.component_size(component), "wrong component size");
        out.rows_mut(dof_map.start_positions[component], f.len())
            .copy_from(f);
    }
    out
}

/// Splits a concatenated vector back into its component functions.
///
/// # Panics
///
/// Panics if the length of `function` is not the number of degrees of freedom of `dof_map`.
pub fn expand(dof_map: &BlockDofMap, function: &DVector<f64>) -> Vec<DVector<f64>> {
    assert_eq!(function.len(), dof_map.n_dofs, "wrong number of degrees of freedom");
    (0..dof_map.n_components)
        .map(|component| {
            function
                .rows(dof_map.start_positions[component], dof_map.component_size(component))
                .into_owned()
        })
        .collect()
}
