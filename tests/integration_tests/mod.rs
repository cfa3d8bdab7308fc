use std::path::PathBuf;

mod laplace;

fn data_output_path() -> PathBuf {
    PathBuf::from("data/integration_tests/")
}
