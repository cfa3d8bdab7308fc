use clap::{CommandFactory, Parser};
use eyre::Context;
use log::{info, warn};
use std::path::PathBuf;
use tbem::io::dataset::load_dataset_from_file;
use tbem::io::vtk::export_plot;
use tbem::plot::{build_plot, Plot};

#[derive(Parser)]
#[command(name = "data_plotter")]
#[command(about = "Plots a facet dataset by writing it to a VTK file")]
#[command(after_help = COLUMN_ADVICE)]
struct Cli {
    /// The dataset file holding the `facets` and `values` arrays
    filename: PathBuf,
    /// The column of the values dataspace to display, negative columns count from the last
    #[arg(allow_negative_numbers = true)]
    column: i64,
    /// Path of the VTK output file, defaults to the input path with the extension `.vtu`
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Extra arguments are accepted and ignored
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    rest: Vec<String>,
}

const COLUMN_ADVICE: &str = "The column specifies the column of the values dataspace to display, \
negative columns count from the last one. \
Datasets with 4 facet columns are plotted as 2D segments, datasets with 9 facet columns as 3D triangles.";

/// Parses the command line, printing the usage and column advice on malformed arguments.
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let message = err.to_string();
            eprintln!("{}", message.trim_end());
            if !message.contains("Usage:") {
                eprintln!("\n{}", Cli::command().render_usage());
            }
            eprintln!("\n{COLUMN_ADVICE}");
            std::process::exit(2);
        }
    }
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_cli();
    if !cli.rest.is_empty() {
        warn!("Ignoring extra arguments {:?}", cli.rest);
    }
    let dataset = load_dataset_from_file(&cli.filename)?;
    info!(
        "Loaded {} facets and {} value columns from {}",
        dataset.facets.nrows(),
        dataset.values.ncols(),
        cli.filename.display()
    );

    let column = dataset
        .resolve_column(cli.column)
        .wrap_err_with(|| format!("failed to plot column {} of {}", cli.column, cli.filename.display()))?;
    let plot = build_plot(&dataset, column)
        .wrap_err_with(|| format!("failed to plot column {} of {}", cli.column, cli.filename.display()))?;
    let output = cli
        .output
        .unwrap_or_else(|| cli.filename.with_extension("vtu"));
    export_plot(&plot, &output, None)?;

    let kind = match plot {
        Plot::Plot2d(_) => "2D",
        Plot::Plot3d(_) => "3D",
    };
    info!("Wrote {} plot to {}", kind, output.display());
    println!("{}", output.display());
    Ok(())
}
