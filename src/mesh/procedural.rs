//! Basic procedural mesh generation routines.
use crate::mesh::{FacetMesh2d, FacetMesh3d};
use nalgebra::{Point2, Point3, Vector3};
use std::f64::consts::PI;

/// A mesh consisting of the single segment `a -> b`.
pub fn line_mesh(a: Point2<f64>, b: Point2<f64>) -> FacetMesh2d {
    FacetMesh2d::from_facets(vec![[a, b]])
}

/// A planar quadrilateral split into the two triangles `[a, b, c]` and `[a, c, d]`.
pub fn rect_mesh(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>, d: Point3<f64>) -> FacetMesh3d {
    FacetMesh3d::from_facets(vec![[a, b, c], [a, c, d]])
}

/// A regular polygon with `n_segments` edges inscribed in the given circle.
///
/// The polygon is traversed clockwise so that the facet normals point outwards.
///
/// # Panics
///
/// Panics if `n_segments < 3`.
pub fn circle_mesh(center: Point2<f64>, radius: f64, n_segments: usize) -> FacetMesh2d {
    assert!(n_segments >= 3, "a closed polygon needs at least three segments");
    let vertex = |i: usize| {
        let theta = -2.0 * PI * (i % n_segments) as f64 / n_segments as f64;
        Point2::new(center.x + radius * theta.cos(), center.y + radius * theta.sin())
    };
    let facets = (0..n_segments).map(|i| [vertex(i), vertex(i + 1)]).collect();
    FacetMesh2d::from_facets(facets)
}

/// Approximates a sphere by repeatedly refining an octahedron.
///
/// After each refinement the new vertices are projected onto the sphere. The facets are
/// oriented with outward normals. With `refinements` refinements the mesh has
/// `8 * 4^refinements` facets.
pub fn sphere_mesh(center: Point3<f64>, radius: f64, refinements: usize) -> FacetMesh3d {
    let x = center + radius * Vector3::x();
    let mx = center - radius * Vector3::x();
    let y = center + radius * Vector3::y();
    let my = center - radius * Vector3::y();
    let z = center + radius * Vector3::z();
    let mz = center - radius * Vector3::z();

    let octahedron = FacetMesh3d::from_facets(vec![
        [x, y, z],
        [y, mx, z],
        [mx, my, z],
        [my, x, z],
        [y, x, mz],
        [mx, y, mz],
        [my, mx, mz],
        [x, my, mz],
    ]);

    let project = |p: &Point3<f64>| center + radius * (p - center).normalize();
    let mut mesh = octahedron;
    for _ in 0..refinements {
        mesh = mesh.refine().map_vertices(&project);
    }
    mesh
}
