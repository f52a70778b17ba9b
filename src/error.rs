//! Error types for the artifact store and the dashboard builder.

use thiserror::Error;

/// Result type for artifact store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for dashboard building and rendering
pub type DashboardResult<T> = std::result::Result<T, DashboardError>;

/// Errors raised by an [`ArtifactStore`](crate::store::ArtifactStore)
#[derive(Debug, Error)]
pub enum StoreError {
    /// The submitted filename does not end in an accepted spreadsheet extension
    #[error("Only Excel files are allowed (got '{0}')")]
    UnsupportedFileType(String),

    /// A filename or folder identifier would escape its namespace
    #[error("Invalid name: '{0}'")]
    InvalidFileName(String),

    /// Writing an upload into the pending namespace failed
    #[error("Failed to store upload: {0}")]
    StorageWrite(#[source] std::io::Error),

    /// No directory with this identifier exists in the result namespace
    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    /// The folder exists but the requested file does not
    #[error("File not found: {folder}/{file}")]
    FileNotFound { folder: String, file: String },

    /// Any other I/O failure while reading a namespace
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the failure was caused by the caller's input rather than the storage medium.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::UnsupportedFileType(_)
                | StoreError::InvalidFileName(_)
                | StoreError::FolderNotFound(_)
                | StoreError::FileNotFound { .. }
        )
    }
}

/// Errors raised while turning a result file into a dashboard
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The result file could not be parsed as a table
    #[error("Dataset could not be read: {0}")]
    DatasetUnreadable(String),

    /// The table has no columns at all
    #[error("Dataset has no columns")]
    EmptyDataset,

    /// The chart backend failed while drawing
    #[error("Failed to render dashboard: {0}")]
    Render(String),
}

impl From<csv::Error> for DashboardError {
    fn from(err: csv::Error) -> Self {
        DashboardError::DatasetUnreadable(err.to_string())
    }
}
