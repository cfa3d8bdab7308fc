use crate::geometry::{facet_from_slice, Facet};
use eyre::eyre;
use nalgebra::{center, DMatrix, Point, SVector};

pub mod procedural;

/// A boundary mesh stored as an unconnected "soup" of facets.
///
/// Every facet owns its vertices, so each vertex of each facet is a separate degree of freedom.
/// The degree of freedom `D * i + v` refers to vertex `v` of facet `i`. Continuity between
/// coincident vertices is imposed separately through constraints, see
/// [`mesh_continuity`](crate::continuity::mesh_continuity).
#[derive(Debug, Clone, PartialEq)]
pub struct FacetMesh<const D: usize> {
    facets: Vec<Facet<D>>,
}

pub type FacetMesh2d = FacetMesh<2>;
pub type FacetMesh3d = FacetMesh<3>;

impl<const D: usize> Default for FacetMesh<D> {
    fn default() -> Self {
        Self { facets: Vec::new() }
    }
}

impl<const D: usize> FacetMesh<D> {
    pub fn from_facets(facets: Vec<Facet<D>>) -> Self {
        Self { facets }
    }

    pub fn facets(&self) -> &[Facet<D>] {
        &self.facets
    }

    pub fn n_facets(&self) -> usize {
        self.facets.len()
    }

    pub fn n_dofs(&self) -> usize {
        D * self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Returns the vertex associated with the given degree of freedom.
    ///
    /// # Panics
    ///
    /// Panics if `dof >= self.n_dofs()`.
    pub fn vertex(&self, dof: usize) -> &Point<f64, D> {
        &self.facets[dof / D][dof % D]
    }

    /// Iterates over all vertices in degree of freedom order.
    pub fn vertices(&self) -> impl '_ + Iterator<Item = &Point<f64, D>> {
        self.facets.iter().flat_map(|facet| facet.iter())
    }

    /// Uniformly refines every facet once.
    ///
    /// Segments are split at their midpoint. Triangles are split into four triangles through
    /// their edge midpoints. The orientation of each child matches the orientation of its parent.
    pub fn refine(&self) -> Self {
        let facets = self.facets.iter().flat_map(refine_facet).collect();
        Self { facets }
    }

    pub fn refine_repeatedly(&self, times: usize) -> Self {
        let mut mesh = self.clone();
        for _ in 0..times {
            mesh = mesh.refine();
        }
        mesh
    }

    /// Applies the given map to every vertex of the mesh.
    pub fn map_vertices(&self, f: impl Fn(&Point<f64, D>) -> Point<f64, D>) -> Self {
        let facets = self
            .facets
            .iter()
            .map(|facet| facet.map(|v| f(&v)))
            .collect();
        Self { facets }
    }

    /// Returns a new mesh with the facets of `other` appended after the facets of `self`.
    pub fn concat(&self, other: &Self) -> Self {
        let mut facets = self.facets.clone();
        facets.extend_from_slice(&other.facets);
        Self { facets }
    }

    /// Builds a mesh from a matrix with one facet per row.
    ///
    /// Each row stores the coordinates of the facet vertices one after another, so the
    /// coordinate `d` of vertex `v` is found in column `D * v + d`.
    pub fn from_facet_rows(rows: &DMatrix<f64>) -> eyre::Result<Self> {
        if rows.ncols() != D * D {
            return Err(eyre!(
                "facet rows for dimension {} must have {} columns, but have {}",
                D,
                D * D,
                rows.ncols()
            ));
        }
        let facets = rows
            .row_iter()
            .map(|row| std::array::from_fn(|v| Point::from(SVector::from_fn(|d, _| row[D * v + d]))))
            .collect();
        Ok(Self { facets })
    }

    /// The inverse of [`from_facet_rows`](Self::from_facet_rows).
    pub fn to_facet_rows(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.n_facets(), D * D, |i, j| self.facets[i][j / D][j % D])
    }
}

fn refine_facet<const D: usize>(facet: &Facet<D>) -> Vec<Facet<D>> {
    let vertices: &[Point<f64, D>] = facet;
    match D {
        2 => {
            let (a, b) = (vertices[0], vertices[1]);
            let m = center(&a, &b);
            vec![facet_from_slice(&[a, m]), facet_from_slice(&[m, b])]
        }
        3 => {
            let (a, b, c) = (vertices[0], vertices[1], vertices[2]);
            let ab = center(&a, &b);
            let bc = center(&b, &c);
            let ca = center(&c, &a);
            vec![
                facet_from_slice(&[a, ab, ca]),
                facet_from_slice(&[ab, b, bc]),
                facet_from_slice(&[ca, bc, c]),
                facet_from_slice(&[ab, bc, ca]),
            ]
        }
        _ => panic!("facets are only supported in 2 and 3 dimensions, got {D}"),
    }
}
