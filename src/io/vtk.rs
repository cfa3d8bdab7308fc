//! Export of plots to legacy VTK files.
use crate::plot::{Plot, Plot2d, Plot3d};
use eyre::{eyre, Context};
use std::convert::TryInto;
use std::fs;
use std::path::Path;
use vtkio::model::{
    Attribute, Attributes, ByteOrder, CellType, Cells, DataArray, DataSet, ElementType, Piece, UnstructuredGridPiece,
    Version, VertexNumbers, Vtk,
};

fn scalars(name: &str, data: Vec<f64>) -> Attribute {
    Attribute::DataArray(DataArray {
        name: name.to_string(),
        elem: ElementType::Scalars {
            num_comp: 1,
            lookup_table: None,
        },
        data: data.into(),
    })
}

fn index(i: usize) -> eyre::Result<u32> {
    i.try_into()
        .map_err(|_| eyre!("index {} does not fit in a VTK cell", i))
}

fn unstructured_grid(
    points: Vec<f64>,
    num_cells: usize,
    vertices: Vec<u32>,
    types: Vec<CellType>,
    data: Attributes,
) -> eyre::Result<DataSet> {
    let piece = UnstructuredGridPiece {
        points: points.into(),
        cells: Cells {
            cell_verts: VertexNumbers::Legacy {
                num_cells: index(num_cells)?,
                vertices,
            },
            types,
        },
        data,
    };
    Ok(DataSet::UnstructuredGrid {
        meta: None,
        pieces: vec![Piece::Inline(Box::new(piece))],
    })
}

/// A triangle grid with the plot scalars attached to the points as `values`.
pub fn plot3d_to_vtk(plot: &Plot3d) -> eyre::Result<DataSet> {
    let points = plot
        .vertices
        .iter()
        .flat_map(|v| v.coords.iter().copied())
        .collect();

    // Vertices are laid out as N, i_1, ..., i_N for each cell
    let mut vertices = Vec::with_capacity(4 * plot.faces.len());
    for face in &plot.faces {
        vertices.push(3);
        for &i in face {
            vertices.push(index(i)?);
        }
    }

    let data = Attributes {
        point: vec![scalars("values", plot.scalars.clone())],
        cell: Vec::new(),
    };
    unstructured_grid(
        points,
        plot.faces.len(),
        vertices,
        vec![CellType::Triangle; plot.faces.len()],
        data,
    )
}

/// Two polylines in the `(x, value)` plane: the reference curve and the data series.
///
/// The cell data `series` is 0 for the reference curve and 1 for the data.
pub fn plot2d_to_vtk(plot: &Plot2d) -> eyre::Result<DataSet> {
    let series = [&plot.reference, &plot.data];
    let mut points = Vec::new();
    let mut values = Vec::new();
    let mut vertices = Vec::new();
    let mut offset = 0;
    for s in series {
        vertices.push(index(s.x.len())?);
        for (i, (&x, &y)) in s.x.iter().zip(&s.y).enumerate() {
            points.extend_from_slice(&[x, y, 0.0]);
            values.push(y);
            vertices.push(index(offset + i)?);
        }
        offset += s.x.len();
    }

    let data = Attributes {
        point: vec![scalars("values", values)],
        cell: vec![scalars("series", vec![0.0, 1.0])],
    };
    unstructured_grid(points, series.len(), vertices, vec![CellType::PolyLine; series.len()], data)
}

/// Writes the plot to a legacy VTK file, creating the output directory if necessary.
///
/// The file stem is used as the title if none is given.
pub fn export_plot(plot: &Plot, path: impl AsRef<Path>, title: Option<&str>) -> eyre::Result<()> {
    let path = path.as_ref();
    let data = match plot {
        Plot::Plot2d(plot) => plot2d_to_vtk(plot)?,
        Plot::Plot3d(plot) => plot3d_to_vtk(plot)?,
    };
    let title = title.map(str::to_string).unwrap_or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "untitled".to_string())
    });

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).wrap_err("failed to create VTK output directory")?;
    }
    Vtk {
        version: Version { major: 4, minor: 1 },
        title,
        byte_order: ByteOrder::BigEndian,
        data,
        file_path: None,
    }
    .export(path)
    .map_err(|err| eyre!("failed to export VTK file {}: {:?}", path.display(), err))
}
