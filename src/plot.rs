//! Turning facet datasets into plots.
//!
//! Segment datasets produce a 2D line plot of the data against the vertex `x` coordinate,
//! drawn together with the analytical surface displacement of a unit slip antiplane fault.
//! Triangle datasets produce a triangle mesh colored by the per-vertex data.
use crate::dataset::{FacetDataset, FacetLayout};
use eyre::{eyre, Context};
use nalgebra::{DMatrix, DVector, Point2, Point3};
use std::f64::consts::PI;

/// Number of samples of the reference curve in 2D plots.
pub const REFERENCE_SAMPLES: usize = 1000;
/// The reference curve is sampled on `[-REFERENCE_EXTENT, REFERENCE_EXTENT]`.
pub const REFERENCE_EXTENT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlotKind {
    Plot2d,
    Plot3d,
}

impl From<FacetLayout> for PlotKind {
    fn from(layout: FacetLayout) -> Self {
        match layout {
            FacetLayout::Segment2d => Self::Plot2d,
            FacetLayout::Triangle3d => Self::Plot3d,
        }
    }
}

/// Chooses the plot from the number of facet columns: 9 for triangles, 4 for segments.
pub fn select_plot(facet_columns: usize) -> Option<PlotKind> {
    FacetLayout::from_columns(facet_columns).map(PlotKind::from)
}

/// A polyline given by its coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plot2d {
    /// Segment endpoints in row-major facet order.
    pub vertices: Vec<Point2<f64>>,
    /// The data plotted against the `x` coordinate of each vertex.
    pub data: Series,
    /// The analytical antiplane fault displacement.
    pub reference: Series,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plot3d {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<[usize; 3]>,
    pub scalars: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Plot {
    Plot2d(Plot2d),
    Plot3d(Plot3d),
}

/// `n` evenly spaced samples on `[a, b]`, including both end points.
pub fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let step = (b - a) / (n - 1) as f64;
            (0..n).map(|i| a + step * i as f64).collect()
        }
    }
}

/// Surface displacement `s / (2 pi) * atan(1 / x)` caused by slip `s` on a vertical fault
/// reaching the surface at `x = 0`.
pub fn antiplane_surface_displacement(x: f64, slip: f64) -> f64 {
    slip / (2.0 * PI) * (1.0 / x).atan()
}

fn check_shape(facets: &DMatrix<f64>, data: &DVector<f64>, columns: usize, vertices_per_row: usize) -> eyre::Result<()> {
    if facets.ncols() != columns {
        return Err(eyre!(
            "expected {} facet columns, but the facets have {}",
            columns,
            facets.ncols()
        ));
    }
    let n_vertices = facets.nrows() * vertices_per_row;
    if data.len() != n_vertices {
        return Err(eyre!(
            "the data has {} values, but the facets have {} vertices",
            data.len(),
            n_vertices
        ));
    }
    Ok(())
}

/// Builds the 2D plot from segment facets `[x0, y0, x1, y1]` and one value per vertex.
pub fn plot2d(facets: &DMatrix<f64>, data: &DVector<f64>) -> eyre::Result<Plot2d> {
    check_shape(facets, data, 4, 2)?;
    let vertices: Vec<_> = facets
        .row_iter()
        .flat_map(|row| [Point2::new(row[0], row[1]), Point2::new(row[2], row[3])])
        .collect();

    let reference_x = linspace(-REFERENCE_EXTENT, REFERENCE_EXTENT, REFERENCE_SAMPLES);
    let reference_y = reference_x
        .iter()
        .map(|&x| antiplane_surface_displacement(x, 1.0))
        .collect();

    Ok(Plot2d {
        data: Series {
            x: vertices.iter().map(|v| v.x).collect(),
            y: data.iter().copied().collect(),
        },
        vertices,
        reference: Series {
            x: reference_x,
            y: reference_y,
        },
    })
}

/// Builds the 3D plot from triangle facets with nine coordinates per row and one value per vertex.
pub fn plot3d(facets: &DMatrix<f64>, data: &DVector<f64>) -> eyre::Result<Plot3d> {
    check_shape(facets, data, 9, 3)?;
    let vertices: Vec<_> = facets
        .row_iter()
        .flat_map(|row| {
            [
                Point3::new(row[0], row[1], row[2]),
                Point3::new(row[3], row[4], row[5]),
                Point3::new(row[6], row[7], row[8]),
            ]
        })
        .collect();
    let faces = (0..facets.nrows())
        .map(|i| [3 * i, 3 * i + 1, 3 * i + 2])
        .collect();
    Ok(Plot3d {
        vertices,
        faces,
        scalars: data.iter().copied().collect(),
    })
}

/// Builds the plot of the given values column, choosing the kind of plot from the facet layout.
pub fn build_plot(dataset: &FacetDataset, column: usize) -> eyre::Result<Plot> {
    let kind = select_plot(dataset.facets.ncols()).ok_or_else(|| {
        eyre!(
            "unsupported facet layout with {} columns, expected 4 (2D segments) or 9 (3D triangles)",
            dataset.facets.ncols()
        )
    })?;
    let data = dataset.values_column(column)?;
    match kind {
        PlotKind::Plot2d => plot2d(&dataset.facets, &data)
            .map(Plot::Plot2d)
            .wrap_err("failed to build 2D plot"),
        PlotKind::Plot3d => plot3d(&dataset.facets, &data)
            .map(Plot::Plot3d)
            .wrap_err("failed to build 3D plot"),
    }
}
