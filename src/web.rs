#![cfg(not(tarpaulin_include))]

use clap::Parser;
use sheetdash::app;
use sheetdash::config::Config;

/// Main entry point for the web application
///
/// Reads the configuration from flags and `SHEETDASH_*` environment variables,
/// makes sure both storage directories exist and serves the API.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::info!(
        "Uploads go to {}, results are read from {}",
        config.upload_dir.display(),
        config.output_dir.display()
    );

    app::run(config).await
}
