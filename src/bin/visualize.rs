#![cfg(not(tarpaulin_include))]

use clap::Parser;
use sheetdash::dashboard::load_dashboard;
use sheetdash::graph::render_svg;
use std::fs::File;
use std::path::PathBuf;

/// Render one CSV result file as a dashboard of line charts
#[derive(Parser)]
#[command(name = "sheetdash-visualize")]
struct Args {
    /// CSV file to visualize
    input: PathBuf,

    /// Where to write the SVG; defaults to the input path with an `.svg` extension
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("svg"));

    let file = File::open(&args.input)?;
    let spec = load_dashboard(file, &args.input.display().to_string())?;
    let svg = render_svg(&spec)?;
    std::fs::write(&output, svg)?;

    println!(
        "Wrote {} panels to {}",
        spec.panels.len(),
        output.display()
    );
    Ok(())
}
