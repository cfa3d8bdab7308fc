use crate::geometry::facet_measure;
use crate::mesh::FacetMesh;
use nalgebra::{DMatrix, DVector, Point};
use rayon::prelude::*;

/// The consistent mass matrix of the piecewise linear basis on the mesh.
///
/// The matrix is block diagonal, since the basis functions of different facets do not overlap.
/// The block of a segment with length `L` is `L/6 [[2, 1], [1, 2]]`, and the block of a
/// triangle with area `A` is `A/12` times the matrix with `2` on the diagonal and `1` elsewhere.
pub fn mass_operator<const D: usize>(mesh: &FacetMesh<D>) -> DMatrix<f64> {
    let n_dofs = mesh.n_dofs();
    let mut mass = DMatrix::zeros(n_dofs, n_dofs);
    let denominator = (D * (D + 1)) as f64;
    for (i, facet) in mesh.facets().iter().enumerate() {
        let scale = facet_measure(facet) / denominator;
        for a in 0..D {
            for b in 0..D {
                let factor = if a == b { 2.0 } else { 1.0 };
                mass[(D * i + a, D * i + b)] = scale * factor;
            }
        }
    }
    mass
}

/// Evaluates the function at the vertex of every degree of freedom.
pub fn interpolate<const D: usize>(mesh: &FacetMesh<D>, f: impl Fn(&Point<f64, D>) -> f64) -> DVector<f64> {
    DVector::from_iterator(mesh.n_dofs(), mesh.vertices().map(f))
}

/// Computes the matrix-vector product, with rows processed in parallel.
///
/// # Panics
///
/// Panics if the number of columns does not match the length of `x`.
pub fn apply_operator(matrix: &DMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    assert_eq!(matrix.ncols(), x.len(), "operator and vector dimensions must agree");
    let values: Vec<f64> = (0..matrix.nrows())
        .into_par_iter()
        .map(|i| matrix.row(i).transpose().dot(x))
        .collect();
    DVector::from_vec(values)
}
