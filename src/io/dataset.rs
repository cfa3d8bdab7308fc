//! Reading and writing facet datasets.
//!
//! A dataset file is a JSON document holding the two row-major arrays `facets` and `values`:
//!
//! ```json
//! {
//!     "facets": { "shape": [2, 4], "data": [0, 0, 1, 0, 1, 0, 2, 0] },
//!     "values": { "shape": [4, 1], "data": [1, 2, 2, 3] }
//! }
//! ```
use crate::dataset::FacetDataset;
use eyre::{eyre, Context};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArrayRecord {
    shape: [usize; 2],
    data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DatasetRecord {
    facets: ArrayRecord,
    values: ArrayRecord,
}

impl ArrayRecord {
    fn from_matrix(matrix: &DMatrix<f64>) -> Self {
        Self {
            shape: [matrix.nrows(), matrix.ncols()],
            data: matrix.transpose().iter().copied().collect(),
        }
    }

    fn into_matrix(self, name: &str) -> eyre::Result<DMatrix<f64>> {
        let [rows, cols] = self.shape;
        if rows * cols != self.data.len() {
            return Err(eyre!(
                "dataset {} has shape [{}, {}], but holds {} values",
                name,
                rows,
                cols,
                self.data.len()
            ));
        }
        Ok(DMatrix::from_row_slice(rows, cols, &self.data))
    }
}

/// Parses a dataset from the contents of a dataset file.
pub fn load_dataset_from_bytes(bytes: &[u8]) -> eyre::Result<FacetDataset> {
    let record: DatasetRecord = serde_json::from_slice(bytes).wrap_err("failed to parse dataset")?;
    let facets = record.facets.into_matrix("facets")?;
    let values = record.values.into_matrix("values")?;
    Ok(FacetDataset::new(facets, values))
}

pub fn load_dataset_from_file(path: impl AsRef<Path>) -> eyre::Result<FacetDataset> {
    let path = path.as_ref();
    let bytes = fs::read(path).wrap_err_with(|| format!("failed to read dataset file {}", path.display()))?;
    load_dataset_from_bytes(&bytes).wrap_err_with(|| format!("failed to load dataset from {}", path.display()))
}

/// Writes the dataset to the given path, creating parent directories as needed.
pub fn save_dataset_to_file(dataset: &FacetDataset, path: impl AsRef<Path>) -> eyre::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).wrap_err("failed to create dataset output directory")?;
    }
    let record = DatasetRecord {
        facets: ArrayRecord::from_matrix(&dataset.facets),
        values: ArrayRecord::from_matrix(&dataset.values),
    };
    let json = serde_json::to_string(&record).wrap_err("failed to serialize dataset")?;
    fs::write(path, json).wrap_err_with(|| format!("failed to write dataset file {}", path.display()))
}
