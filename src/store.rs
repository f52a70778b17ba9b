//! Storage of uploads and result folders.
//!
//! Two namespaces are managed: a flat *pending* namespace holding uploaded
//! spreadsheets by filename, and a *result* namespace holding one
//! `Upload-<id>` folder per processing run. Result folders are created by the
//! external producer only; stores discover and serve them.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Read;

/// Filename suffixes accepted by [`ArtifactStore::accept_upload`] (case-sensitive)
pub const ACCEPTED_EXTENSIONS: &[&str] = &[".xlsx", ".xls"];

/// Prefix every listed result folder name carries
pub const RESULT_FOLDER_PREFIX: &str = "Upload-";

/// Media type for downloads
pub const BINARY_MEDIA_TYPE: &str = "application/octet-stream";

/// Name used for the pending namespace in error messages
pub const PENDING_NAMESPACE: &str = "pending";

/// An upload written into the pending namespace
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingUpload {
    pub filename: String,
    pub size: u64,
}

/// Summary of one result folder
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultFolder {
    /// Folder name, e.g. `Upload-42`
    pub id: String,
    pub modified: DateTime<Utc>,
    pub file_count: usize,
}

/// Summary of one file inside a result folder
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResultFile {
    pub name: String,
    pub size: u64,
    /// Relative download path, `download/{folder_id}/{name}`
    pub path: String,
}

impl ResultFile {
    pub fn new(folder_id: &str, name: &str, size: u64) -> Self {
        Self {
            name: name.to_string(),
            size,
            path: format!("download/{}/{}", folder_id, name),
        }
    }
}

/// A result file ready to be transferred byte-for-byte
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileHandle {
    /// Original filename, preserved for the download
    pub filename: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

impl FileHandle {
    pub fn new(filename: &str, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.to_string(),
            media_type: BINARY_MEDIA_TYPE,
            bytes,
        }
    }
}

/// Injectable storage for uploads and result folders
///
/// Every call reads the backing medium afresh; nothing is cached between calls.
pub trait ArtifactStore: Send + Sync {
    /// Write an upload into the pending namespace, replacing any file of the same name
    ///
    /// # Errors
    /// * `UnsupportedFileType` if `filename` does not end in an accepted extension
    /// * `InvalidFileName` if `filename` contains a path component
    /// * `StorageWrite` if writing fails
    fn accept_upload(&self, filename: &str, content: &mut dyn Read) -> StoreResult<PendingUpload>;

    /// Read an upload back from the pending namespace
    fn read_pending(&self, filename: &str) -> StoreResult<Vec<u8>>;

    /// Result folders, most recently modified first
    ///
    /// Returns an empty list if the result namespace does not exist yet.
    fn list_result_folders(&self) -> StoreResult<Vec<ResultFolder>>;

    /// Files directly inside one result folder, sorted by name
    fn list_folder_contents(&self, folder_id: &str) -> StoreResult<Vec<ResultFile>>;

    /// Open one result file for transfer
    fn get_file(&self, folder_id: &str, filename: &str) -> StoreResult<FileHandle>;
}

/// Reject names that are not accepted spreadsheets
pub fn check_upload_name(filename: &str) -> StoreResult<()> {
    check_segment(filename)?;
    if !ACCEPTED_EXTENSIONS.iter().any(|ext| filename.ends_with(ext)) {
        return Err(StoreError::UnsupportedFileType(filename.to_string()));
    }
    Ok(())
}

/// A single path segment: non-empty, no separators, not `.` or `..`
pub fn check_segment(name: &str) -> StoreResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StoreError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

/// Whether an entry would match the `*.*` pattern used to count folder files
///
/// Hidden names are not special: `.hidden.csv` and `.env` both match.
pub fn counts_as_file(name: &str) -> bool {
    name.contains('.')
}

/// Newest first; equal timestamps fall back to name order.
pub fn sort_newest_first(folders: &mut [ResultFolder]) {
    folders.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.id.cmp(&b.id)));
}
