use crate::error::{StoreError, StoreResult};
use crate::store::{
    ArtifactStore, FileHandle, PENDING_NAMESPACE, PendingUpload, RESULT_FOLDER_PREFIX, ResultFile,
    ResultFolder, check_segment, check_upload_name, counts_as_file, sort_newest_first,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
struct MemoryFolder {
    modified: DateTime<Utc>,
    files: BTreeMap<String, Vec<u8>>,
}

/// In-memory artifact store, used in place of the filesystem in tests
///
/// The result namespace starts out absent. [`insert_result_file`](Self::insert_result_file)
/// plays the part of the external producer.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    pending: RwLock<HashMap<String, Vec<u8>>>,
    results: RwLock<Option<BTreeMap<String, MemoryFolder>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to a result folder, creating the folder and namespace as needed
    pub fn insert_result_file(
        &self,
        folder_id: &str,
        filename: &str,
        bytes: impl Into<Vec<u8>>,
        modified: DateTime<Utc>,
    ) {
        let mut results = self.results.write().unwrap_or_else(PoisonError::into_inner);
        let folder = results
            .get_or_insert_with(BTreeMap::new)
            .entry(folder_id.to_string())
            .or_default();
        folder.modified = modified;
        folder.files.insert(filename.to_string(), bytes.into());
    }

    /// Create an empty folder
    pub fn insert_result_folder(&self, folder_id: &str, modified: DateTime<Utc>) {
        let mut results = self.results.write().unwrap_or_else(PoisonError::into_inner);
        let folder = results
            .get_or_insert_with(BTreeMap::new)
            .entry(folder_id.to_string())
            .or_default();
        folder.modified = modified;
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn accept_upload(&self, filename: &str, content: &mut dyn Read) -> StoreResult<PendingUpload> {
        check_upload_name(filename)?;

        let mut bytes = Vec::new();
        content
            .read_to_end(&mut bytes)
            .map_err(StoreError::StorageWrite)?;
        let size = bytes.len() as u64;

        self.pending
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(filename.to_string(), bytes);

        Ok(PendingUpload {
            filename: filename.to_string(),
            size,
        })
    }

    fn read_pending(&self, filename: &str) -> StoreResult<Vec<u8>> {
        check_segment(filename)?;
        self.pending
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(filename)
            .cloned()
            .ok_or_else(|| StoreError::FileNotFound {
                folder: PENDING_NAMESPACE.to_string(),
                file: filename.to_string(),
            })
    }

    fn list_result_folders(&self) -> StoreResult<Vec<ResultFolder>> {
        let results = self.results.read().unwrap_or_else(PoisonError::into_inner);
        let Some(results) = results.as_ref() else {
            return Ok(Vec::new());
        };

        let mut folders: Vec<ResultFolder> = results
            .iter()
            .filter(|(id, _)| id.starts_with(RESULT_FOLDER_PREFIX))
            .map(|(id, folder)| ResultFolder {
                id: id.clone(),
                modified: folder.modified,
                file_count: folder.files.keys().filter(|n| counts_as_file(n)).count(),
            })
            .collect();

        sort_newest_first(&mut folders);
        Ok(folders)
    }

    fn list_folder_contents(&self, folder_id: &str) -> StoreResult<Vec<ResultFile>> {
        let results = self.results.read().unwrap_or_else(PoisonError::into_inner);
        let folder = results
            .as_ref()
            .and_then(|r| r.get(folder_id))
            .ok_or_else(|| StoreError::FolderNotFound(folder_id.to_string()))?;

        Ok(folder
            .files
            .iter()
            .map(|(name, bytes)| ResultFile::new(folder_id, name, bytes.len() as u64))
            .collect())
    }

    fn get_file(&self, folder_id: &str, filename: &str) -> StoreResult<FileHandle> {
        let results = self.results.read().unwrap_or_else(PoisonError::into_inner);
        let folder = results
            .as_ref()
            .and_then(|r| r.get(folder_id))
            .ok_or_else(|| StoreError::FolderNotFound(folder_id.to_string()))?;

        folder
            .files
            .get(filename)
            .map(|bytes| FileHandle::new(filename, bytes.clone()))
            .ok_or_else(|| StoreError::FileNotFound {
                folder: folder_id.to_string(),
                file: filename.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn upload_overwrites_same_name() {
        let store = MemoryArtifactStore::new();
        store.accept_upload("a.xlsx", &mut "first".as_bytes()).unwrap();
        store.accept_upload("a.xlsx", &mut "second".as_bytes()).unwrap();
        assert_eq!(store.read_pending("a.xlsx").unwrap(), b"second");
    }

    #[test]
    fn non_prefixed_folders_are_hidden() {
        let store = MemoryArtifactStore::new();
        let t = Utc.timestamp_opt(100, 0).unwrap();
        store.insert_result_file("scratch", "x.csv", "1", t);
        store.insert_result_file("Upload-1", "x.csv", "1", t);
        let ids: Vec<String> = store
            .list_result_folders()
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["Upload-1".to_string()]);
    }
}
