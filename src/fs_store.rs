use crate::error::{StoreError, StoreResult};
use crate::store::{
    ArtifactStore, FileHandle, PENDING_NAMESPACE, PendingUpload, RESULT_FOLDER_PREFIX, ResultFile,
    ResultFolder, check_segment, check_upload_name, counts_as_file, sort_newest_first,
};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::fs::{self, File, create_dir_all};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Artifact store backed by two directories on disk
///
/// # Examples
/// ```
/// use sheetdash::fs_store::FsArtifactStore;
/// use sheetdash::store::ArtifactStore;
///
/// let root = tempfile::tempdir().unwrap();
/// let store = FsArtifactStore::new(root.path().join("uploads"), root.path().join("results"));
///
/// // Nothing has been produced yet
/// assert!(store.list_result_folders().unwrap().is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct FsArtifactStore {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(upload_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create both namespace directories if they don't exist
    ///
    /// Called once at server startup; the store operations never create
    /// directories in the result namespace.
    pub fn ensure_namespaces(&self) -> io::Result<()> {
        create_dir_all(&self.upload_dir)?;
        create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Resolve a result folder, failing if it is not an existing directory
    fn folder_path(&self, folder_id: &str) -> StoreResult<PathBuf> {
        check_segment(folder_id).map_err(|_| StoreError::FolderNotFound(folder_id.to_string()))?;
        let path = self.output_dir.join(folder_id);
        if !path.is_dir() {
            return Err(StoreError::FolderNotFound(folder_id.to_string()));
        }
        Ok(path)
    }

    fn write_upload(path: &Path, content: &mut dyn Read) -> io::Result<u64> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let size = io::copy(content, &mut writer)?;
        writer.flush()?;
        Ok(size)
    }
}

/// Number of direct entries of `dir` matching the `*.*` pattern.
///
/// Names that are not valid UTF-8 are never counted.
fn count_files(dir: &Path) -> io::Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_str().is_some_and(counts_as_file) {
            count += 1;
        }
    }
    Ok(count)
}

impl ArtifactStore for FsArtifactStore {
    fn accept_upload(&self, filename: &str, content: &mut dyn Read) -> StoreResult<PendingUpload> {
        check_upload_name(filename)?;

        let path = self.upload_dir.join(filename);
        let size = Self::write_upload(&path, content).map_err(StoreError::StorageWrite)?;

        info!("Stored upload {} ({} bytes)", path.display(), size);
        Ok(PendingUpload {
            filename: filename.to_string(),
            size,
        })
    }

    fn read_pending(&self, filename: &str) -> StoreResult<Vec<u8>> {
        check_segment(filename)?;
        let path = self.upload_dir.join(filename);
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::FileNotFound {
                folder: PENDING_NAMESPACE.to_string(),
                file: filename.to_string(),
            },
            _ => StoreError::Io(e),
        })
    }

    fn list_result_folders(&self) -> StoreResult<Vec<ResultFolder>> {
        let entries = match fs::read_dir(&self.output_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Result namespace {} does not exist yet", self.output_dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut folders = Vec::new();
        for entry in entries.flatten() {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!("Skipping non UTF-8 entry {:?}", raw);
                    continue;
                }
            };
            if !name.starts_with(RESULT_FOLDER_PREFIX) {
                continue;
            }

            // Entries may vanish mid-enumeration; skip them
            let metadata = match entry.metadata() {
                Ok(meta) if meta.is_dir() => meta,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    continue;
                }
            };
            let modified: DateTime<Utc> = match metadata.modified() {
                Ok(time) => time.into(),
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    continue;
                }
            };

            let file_count = match count_files(&entry.path()) {
                Ok(count) => count,
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    continue;
                }
            };

            folders.push(ResultFolder {
                id: name,
                modified,
                file_count,
            });
        }

        sort_newest_first(&mut folders);
        Ok(folders)
    }

    fn list_folder_contents(&self, folder_id: &str) -> StoreResult<Vec<ResultFile>> {
        let folder = self.folder_path(folder_id)?;

        let mut files = Vec::new();
        for entry in fs::read_dir(&folder)?.flatten() {
            let metadata = match entry.metadata() {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            let Ok(name) = entry.file_name().into_string() else {
                warn!("Skipping non UTF-8 file in {}", folder_id);
                continue;
            };
            files.push(ResultFile::new(folder_id, &name, metadata.len()));
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn get_file(&self, folder_id: &str, filename: &str) -> StoreResult<FileHandle> {
        let folder = self.folder_path(folder_id)?;

        let not_found = || StoreError::FileNotFound {
            folder: folder_id.to_string(),
            file: filename.to_string(),
        };
        check_segment(filename).map_err(|_| not_found())?;

        let path = folder.join(filename);
        if !path.is_file() {
            return Err(not_found());
        }
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => not_found(),
            _ => StoreError::Io(e),
        })?;

        debug!("Serving {} ({} bytes)", path.display(), bytes.len());
        Ok(FileHandle::new(filename, bytes))
    }
}
