pub mod dataset;
pub mod vtk;
