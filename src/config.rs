use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration, from command-line flags or `SHEETDASH_*` environment variables
#[derive(Clone, Debug, Parser)]
#[command(name = "sheetdash-server", about = "Upload spreadsheets and browse result dashboards")]
pub struct Config {
    /// Interface to bind
    #[arg(long, env = "SHEETDASH_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "SHEETDASH_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Pending namespace: where uploaded spreadsheets are written
    #[arg(long, env = "SHEETDASH_UPLOAD_DIR", default_value = "[2]_Drop_xlsx_here")]
    pub upload_dir: PathBuf,

    /// Result namespace: holds one `Upload-<id>` folder per processing run
    #[arg(long, env = "SHEETDASH_OUTPUT_DIR", default_value = "[4]_output_csv_files")]
    pub output_dir: PathBuf,

    /// Largest accepted upload, in megabytes
    #[arg(long, env = "SHEETDASH_MAX_UPLOAD_MB", default_value_t = 50)]
    pub max_upload_mb: usize,
}

impl Config {
    /// Address string for the listener, e.g. `0.0.0.0:8000`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed socket address, if `host` is an IP literal
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.bind_address().parse().ok()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
