//! Registry of the unit test executables, consumed by the external build tool.
//!
//! Each test `name` is built from the source `test_<name>`, optionally together with extra
//! library sources, and is linked against the main library unless it is self-contained.
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// The names of all unit test executables, in alphabetical order.
pub const UNIT_TEST_NAMES: [&str; 21] = [
    "basis",
    "block_dof_map",
    "closest_pt",
    "constraint",
    "constraint_matrix",
    "continuity_builder",
    "dense_builder",
    "elastic_kernels",
    "fmm",
    "function",
    "integral_term",
    "mass_operator",
    "mesh",
    "numbers",
    "numerics",
    "octree",
    "operator",
    "quadrature",
    "richardson",
    "vec",
    "vertex_iterator",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTestInfo {
    pub src: String,
    pub lib_srcs: Vec<String>,
    pub link_lib: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subdirs {
    pub src_dir: String,
}

impl Default for Subdirs {
    fn default() -> Self {
        Self {
            src_dir: "src".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub subdirs: Subdirs,
}

impl BuildConfig {
    pub fn from_json_str(json: &str) -> eyre::Result<Self> {
        serde_json::from_str(json).wrap_err("failed to parse build configuration")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read build configuration {}", path.display()))?;
        Self::from_json_str(&json)
    }
}

/// Builds the test registry for the given build configuration.
pub fn unit_test_info(config: &BuildConfig) -> BTreeMap<String, UnitTestInfo> {
    let src_dir = &config.subdirs.src_dir;
    UNIT_TEST_NAMES
        .iter()
        .map(|&name| {
            let lib_srcs = match name {
                "integral_term" | "quadrature" => vec![format!("{}/{}", src_dir, name)],
                _ => Vec::new(),
            };
            let info = UnitTestInfo {
                src: format!("test_{}", name),
                lib_srcs,
                link_lib: name != "richardson",
            };
            (name.to_string(), info)
        })
        .collect()
}
