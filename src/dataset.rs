//! Facet datasets: facet geometry along with scalar fields sampled at facet vertices.
use crate::mesh::FacetMesh;
use eyre::eyre;
use nalgebra::{DMatrix, DVector};

/// How the rows of a facet matrix are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetLayout {
    /// Two 2D segment endpoints per row, `[x0, y0, x1, y1]`.
    Segment2d,
    /// Three 3D triangle vertices per row, `[x0, y0, z0, x1, y1, z1, x2, y2, z2]`.
    Triangle3d,
}

impl FacetLayout {
    /// Determines the layout from the number of columns of the facet matrix.
    pub fn from_columns(n_columns: usize) -> Option<Self> {
        match n_columns {
            4 => Some(Self::Segment2d),
            9 => Some(Self::Triangle3d),
            _ => None,
        }
    }

    /// The spatial dimension, which is also the number of vertices per facet.
    pub fn dim(&self) -> usize {
        match self {
            Self::Segment2d => 2,
            Self::Triangle3d => 3,
        }
    }
}

/// A facet matrix with one facet per row and a values matrix with one row per facet vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetDataset {
    pub facets: DMatrix<f64>,
    pub values: DMatrix<f64>,
}

impl FacetDataset {
    pub fn new(facets: DMatrix<f64>, values: DMatrix<f64>) -> Self {
        Self { facets, values }
    }

    /// Collects the facets of the mesh along with the given per degree of freedom fields.
    pub fn from_mesh<const D: usize>(mesh: &FacetMesh<D>, fields: &[DVector<f64>]) -> eyre::Result<Self> {
        let n_dofs = mesh.n_dofs();
        if let Some((i, field)) = fields
            .iter()
            .enumerate()
            .find(|(_, field)| field.len() != n_dofs)
        {
            return Err(eyre!(
                "field {} has {} values, but the mesh has {} degrees of freedom",
                i,
                field.len(),
                n_dofs
            ));
        }
        let values = DMatrix::from_fn(n_dofs, fields.len(), |dof, j| fields[j][dof]);
        Ok(Self {
            facets: mesh.to_facet_rows(),
            values,
        })
    }

    pub fn layout(&self) -> Option<FacetLayout> {
        FacetLayout::from_columns(self.facets.ncols())
    }

    /// The number of facet vertices, that is the number of values each field must have.
    pub fn n_vertices(&self) -> eyre::Result<usize> {
        let layout = self.layout().ok_or_else(|| {
            eyre!(
                "unsupported facet layout with {} columns, expected 4 (2D segments) or 9 (3D triangles)",
                self.facets.ncols()
            )
        })?;
        Ok(self.facets.nrows() * layout.dim())
    }

    /// Extracts the given column of the values matrix.
    pub fn values_column(&self, column: usize) -> eyre::Result<DVector<f64>> {
        if column >= self.values.ncols() {
            return Err(eyre!(
                "values column {} is out of range, the dataset has {} columns",
                column,
                self.values.ncols()
            ));
        }
        Ok(self.values.column(column).into_owned())
    }

    /// Resolves a possibly negative column index of the values array. Negative indices count
    /// from the last column, so `-1` selects the last one.
    pub fn resolve_column(&self, column: i64) -> eyre::Result<usize> {
        let n_cols = self.values.ncols() as i64;
        let resolved = if column < 0 { n_cols + column } else { column };
        if resolved < 0 || resolved >= n_cols {
            return Err(eyre!(
                "values column {} is out of range, the dataset has {} columns",
                column,
                n_cols
            ));
        }
        Ok(resolved as usize)
    }

    /// Reconstructs the facet mesh stored in the dataset.
    pub fn to_mesh<const D: usize>(&self) -> eyre::Result<FacetMesh<D>> {
        FacetMesh::from_facet_rows(&self.facets)
    }
}
