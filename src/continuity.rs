//! Constraints which tie together the degrees of freedom of coincident facet vertices and
//! impose boundary conditions.
use crate::constraint::{ConstraintEquation, LinearTerm};
use crate::geometry::{facet_centroid, facet_normal};
use crate::mesh::FacetMesh;
use crate::nearest_neighbors::{identical_points_all_pairs, nearest_facet, NearestNeighborData};
use crate::octree::build_octree;
use nalgebra::Point;

/// Pairs of coincident degrees of freedom.
pub type OverlapMap = Vec<(usize, usize)>;

const VERTICES_PER_LEAF: usize = 50;

/// Vertices closer to a cut mesh than this, relative to their magnitude, lie on the cut.
const ON_CUT_TOLERANCE: f64 = 1e-10;

fn vertices<const D: usize>(mesh: &FacetMesh<D>) -> Vec<Point<f64, D>> {
    mesh.vertices().copied().collect()
}

/// Finds all pairs `(dof_a, dof_b)` of coincident vertices in the two meshes.
pub fn find_overlapping_vertices<const D: usize>(mesh_a: &FacetMesh<D>, mesh_b: &FacetMesh<D>) -> OverlapMap {
    let pts_a = vertices(mesh_a);
    let pts_b = vertices(mesh_b);
    let oct_a = build_octree(&pts_a, VERTICES_PER_LEAF);
    let oct_b = build_octree(&pts_b, VERTICES_PER_LEAF);
    identical_points_all_pairs(&pts_a, &pts_b, &oct_a, &oct_b)
}

/// Finds all pairs `(a, b)` with `a < b` of distinct coincident vertices in the mesh.
pub fn find_overlapping_vertices_same_mesh<const D: usize>(mesh: &FacetMesh<D>) -> OverlapMap {
    let pts = vertices(mesh);
    let oct = build_octree(&pts, VERTICES_PER_LEAF);
    identical_points_all_pairs(&pts, &pts, &oct, &oct)
        .into_iter()
        .filter(|(a, b)| a < b)
        .collect()
}

/// The pairs of degrees of freedom which must agree for the mesh to carry a continuous field.
pub fn mesh_continuity<const D: usize>(mesh: &FacetMesh<D>) -> OverlapMap {
    find_overlapping_vertices_same_mesh(mesh)
}

/// Turns each overlapping pair `(a, b)` into the constraint `u_a - u_b = 0`.
pub fn convert_to_constraints(overlaps: &[(usize, usize)]) -> Vec<ConstraintEquation> {
    overlaps
        .iter()
        .map(|&(a, b)| ConstraintEquation::new(vec![LinearTerm::new(a, 1.0), LinearTerm::new(b, -1.0)], 0.0))
        .collect()
}

/// Constrains the degrees of freedom of `neighbor` which coincide with a vertex of `mesh`
/// to the boundary value given at that vertex.
///
/// # Panics
///
/// Panics if `bcs` does not have one entry per degree of freedom of `mesh`.
pub fn form_neighbor_bcs<const D: usize>(
    mesh: &FacetMesh<D>,
    neighbor: &FacetMesh<D>,
    bcs: &[f64],
) -> Vec<ConstraintEquation> {
    assert_eq!(bcs.len(), mesh.n_dofs(), "one boundary value per degree of freedom is required");
    find_overlapping_vertices(mesh, neighbor)
        .into_iter()
        .map(|(mesh_dof, neighbor_dof)| {
            ConstraintEquation::new(vec![LinearTerm::new(neighbor_dof, 1.0)], bcs[mesh_dof])
        })
        .collect()
}

/// Constrains each of the given degrees of freedom to the function value at its vertex.
pub fn interpolate_bc_constraints<const D: usize>(
    mesh: &FacetMesh<D>,
    dofs: &[usize],
    f: impl Fn(&Point<f64, D>) -> f64,
) -> Vec<ConstraintEquation> {
    dofs.iter()
        .map(|&dof| ConstraintEquation::new(vec![LinearTerm::new(dof, 1.0)], f(mesh.vertex(dof))))
        .collect()
}

/// Constrains the normal component of a vector field with one block of degrees of freedom
/// per component.
///
/// For each degree of freedom `i` of the mesh, the constraint is
/// `sum_d n_d u[d * n_dofs + i] = values[i]`, where `n` is the normal of the facet of `i`.
///
/// # Panics
///
/// Panics if `values` does not have one entry per degree of freedom of the mesh.
pub fn normal_constraints<const D: usize>(mesh: &FacetMesh<D>, values: &[f64]) -> Vec<ConstraintEquation> {
    let n_dofs = mesh.n_dofs();
    assert_eq!(values.len(), n_dofs, "one value per degree of freedom is required");
    (0..n_dofs)
        .map(|i| {
            let normal = facet_normal(&mesh.facets()[i / D]);
            let terms = (0..D)
                .map(|d| LinearTerm::new(d * n_dofs + i, normal[d]))
                .collect();
            ConstraintEquation::new(terms, values[i])
        })
        .collect()
}

/// Removes the continuity between facets on opposite sides of a cut.
///
/// A pair is dropped when its vertex lies on `cut_mesh` and the centroids of the two facets
/// owning the pair lie on opposite sides of the nearest cut facet.
pub fn cut_at_intersection<const D: usize>(
    overlaps: &[(usize, usize)],
    mesh: &FacetMesh<D>,
    cut_mesh: &FacetMesh<D>,
) -> OverlapMap {
    let cut = NearestNeighborData::new(cut_mesh.facets().to_vec(), VERTICES_PER_LEAF);
    overlaps
        .iter()
        .copied()
        .filter(|&(a, b)| {
            let pt = mesh.vertex(a);
            let nearest = match nearest_facet(pt, &cut) {
                Some(nearest) => nearest,
                None => return true,
            };
            let tolerance = ON_CUT_TOLERANCE * 1.0f64.max(pt.coords.amax());
            if nearest.distance > tolerance {
                return true;
            }
            let normal = facet_normal(&cut.facets[nearest.idx]);
            let side = |dof: usize| normal.dot(&(facet_centroid(&mesh.facets()[dof / D]) - pt)) > 0.0;
            side(a) == side(b)
        })
        .collect()
}
