use clap::Parser;
use eyre::Context;
use std::path::PathBuf;
use tbem::test_info::{unit_test_info, BuildConfig};

#[derive(Parser)]
#[command(name = "test_info")]
#[command(about = "Prints the unit test registry as JSON")]
struct Cli {
    /// JSON build configuration, `{"subdirs": {"src_dir": ...}}`
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Overrides the source directory of the build configuration
    #[arg(long)]
    src_dir: Option<String>,
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => BuildConfig::from_json_file(path)?,
        None => BuildConfig::default(),
    };
    if let Some(src_dir) = cli.src_dir {
        config.subdirs.src_dir = src_dir;
    }

    let info = unit_test_info(&config);
    let json = serde_json::to_string_pretty(&info).wrap_err("failed to serialize test info")?;
    println!("{}", json);
    Ok(())
}
