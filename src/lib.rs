//! Building blocks for boundary element methods on facet meshes.
//!
//! Meshes are soups of straight segments (2D) or flat triangles (3D) carrying one linear
//! basis function per facet vertex. On top of these, the crate provides kernel integration
//! with near-field and singular treatment, dense Galerkin operators, a Chebyshev treecode,
//! constraint handling for continuity and boundary conditions, and the `data_plotter`
//! utility that exports facet datasets to VTK.
pub mod block_dof_map;
pub mod constraint;
pub mod continuity;
pub mod dataset;
pub mod dense_builder;
pub mod fmm;
pub mod geometry;
pub mod integral;
pub mod io;
pub mod kernels;
pub mod mesh;
pub mod nearest_neighbors;
pub mod octree;
pub mod operators;
pub mod plot;
pub mod quadrature;
pub mod richardson;
pub mod test_info;

pub extern crate nalgebra;
pub extern crate vtkio;
