use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use sheetdash::error::StoreError;
use sheetdash::fs_store::FsArtifactStore;
use sheetdash::memory_store::MemoryArtifactStore;
use sheetdash::store::{ArtifactStore, BINARY_MEDIA_TYPE};
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn fs_store() -> (TempDir, FsArtifactStore) {
    let root = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(root.path().join("uploads"), root.path().join("results"));
    store.ensure_namespaces().unwrap();
    (root, store)
}

fn set_mtime(path: &Path, secs: u64) {
    let time = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
    File::open(path).unwrap().set_modified(time).unwrap();
}

#[test]
fn csv_upload_is_rejected() {
    let (_root, store) = fs_store();
    let err = store.accept_upload("report.csv", &mut "a,b".as_bytes()).unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedFileType(_)));
    assert!(!store.upload_dir().join("report.csv").exists());
}

#[test]
fn xlsx_upload_is_stored_byte_for_byte() {
    let (_root, store) = fs_store();
    let content: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

    let upload = store.accept_upload("report.xlsx", &mut content.as_slice()).unwrap();
    assert_eq!(upload.filename, "report.xlsx");
    assert_eq!(upload.size, 4096);

    assert_eq!(fs::read(store.upload_dir().join("report.xlsx")).unwrap(), content);
    assert_eq!(store.read_pending("report.xlsx").unwrap(), content);
}

#[test]
fn later_upload_overwrites() {
    let (_root, store) = fs_store();
    store.accept_upload("a.xls", &mut "first version".as_bytes()).unwrap();
    store.accept_upload("a.xls", &mut "v2".as_bytes()).unwrap();
    assert_eq!(store.read_pending("a.xls").unwrap(), b"v2");
}

#[test]
fn write_failure_is_storage_error() {
    let root = tempfile::tempdir().unwrap();
    // Pending namespace missing, so the write cannot succeed
    let store = FsArtifactStore::new(root.path().join("missing"), root.path().join("results"));
    let err = store.accept_upload("a.xlsx", &mut "x".as_bytes()).unwrap_err();
    assert!(matches!(err, StoreError::StorageWrite(_)));
}

#[test]
fn missing_result_namespace_lists_nothing() {
    let root = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(root.path().join("uploads"), root.path().join("results"));
    assert!(store.list_result_folders().unwrap().is_empty());
}

#[test]
fn folders_are_listed_newest_first() {
    let (_root, store) = fs_store();
    let results = store.output_dir();

    for (name, files, mtime) in [
        ("Upload-old", vec!["a.csv"], 1_000),
        ("Upload-new", vec!["a.csv", "b.csv", "notes"], 3_000),
        ("Upload-mid", vec![], 2_000),
        ("scratch", vec!["x.csv"], 4_000),
    ] {
        let dir = results.join(name);
        fs::create_dir(&dir).unwrap();
        for file in files {
            fs::write(dir.join(file), "1,2\n").unwrap();
        }
        set_mtime(&dir, mtime);
    }
    fs::write(results.join("Upload-file.csv"), "not a folder").unwrap();

    let folders = store.list_result_folders().unwrap();
    let summary: Vec<(&str, usize)> = folders
        .iter()
        .map(|f| (f.id.as_str(), f.file_count))
        .collect();
    assert_eq!(
        summary,
        vec![("Upload-new", 2), ("Upload-mid", 0), ("Upload-old", 1)]
    );
    assert_eq!(folders[0].modified.timestamp(), 3_000);
}

#[test]
fn folder_contents_have_download_paths() {
    let (_root, store) = fs_store();
    let dir = store.output_dir().join("Upload-7");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("b.csv"), "12345").unwrap();
    fs::write(dir.join("a.csv"), "1").unwrap();
    fs::create_dir(dir.join("nested")).unwrap();

    let files = store.list_folder_contents("Upload-7").unwrap();
    let listed: Vec<(&str, u64, &str)> = files
        .iter()
        .map(|f| (f.name.as_str(), f.size, f.path.as_str()))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("a.csv", 1, "download/Upload-7/a.csv"),
            ("b.csv", 5, "download/Upload-7/b.csv"),
        ]
    );
}

#[test]
fn hidden_files_are_counted() {
    let (_root, store) = fs_store();
    let dir = store.output_dir().join("Upload-3");
    fs::create_dir(&dir).unwrap();
    for name in ["out.csv", ".hidden.csv", "Makefile"] {
        fs::write(dir.join(name), "1").unwrap();
    }

    let folders = store.list_result_folders().unwrap();
    assert_eq!(folders[0].file_count, 2);
}

#[cfg(unix)]
#[test]
fn unreadable_folder_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let (_root, store) = fs_store();
    let results = store.output_dir();
    fs::create_dir(results.join("Upload-ok")).unwrap();
    let locked = results.join("Upload-locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("a.csv"), "1").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can still open the folder, in which case it is listed
    let readable = fs::read_dir(&locked).is_ok();
    let listed = store.list_result_folders();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let ids: Vec<String> = listed.unwrap().into_iter().map(|f| f.id).collect();
    if readable {
        assert_eq!(ids.len(), 2);
    } else {
        assert_eq!(ids, vec!["Upload-ok".to_string()]);
    }
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_names_are_skipped() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let (_root, store) = fs_store();
    let results = store.output_dir();
    let dir = results.join("Upload-1");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("a.csv"), "1").unwrap();
    fs::write(dir.join(OsStr::from_bytes(b"bad\xff.csv")), "2").unwrap();
    fs::create_dir(results.join(OsStr::from_bytes(b"Upload-\xff"))).unwrap();

    let folders = store.list_result_folders().unwrap();
    let ids: Vec<(&str, usize)> = folders.iter().map(|f| (f.id.as_str(), f.file_count)).collect();
    assert_eq!(ids, vec![("Upload-1", 1)]);

    let files = store.list_folder_contents("Upload-1").unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.csv"]);
}

#[test]
fn unknown_folder_is_not_found() {
    let (_root, store) = fs_store();
    assert!(matches!(
        store.list_folder_contents("Upload-404"),
        Err(StoreError::FolderNotFound(_))
    ));
    assert!(matches!(
        store.get_file("Upload-404", "anything.csv"),
        Err(StoreError::FolderNotFound(_))
    ));
    assert!(matches!(
        store.get_file("..", "etc"),
        Err(StoreError::FolderNotFound(_))
    ));
}

#[test]
fn get_file_returns_exact_bytes() {
    let (_root, store) = fs_store();
    let dir = store.output_dir().join("Upload-1");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("out.csv"), "time,v\n0,1\n").unwrap();

    let handle = store.get_file("Upload-1", "out.csv").unwrap();
    assert_eq!(handle.filename, "out.csv");
    assert_eq!(handle.media_type, BINARY_MEDIA_TYPE);
    assert_eq!(handle.bytes, b"time,v\n0,1\n");

    assert!(matches!(
        store.get_file("Upload-1", "missing.csv"),
        Err(StoreError::FileNotFound { .. })
    ));
}

#[test]
fn memory_store_matches_filesystem_semantics() {
    let store = MemoryArtifactStore::new();
    assert!(store.list_result_folders().unwrap().is_empty());

    store.insert_result_file("Upload-a", "x.csv", "1", Utc.timestamp_opt(10, 0).unwrap());
    store.insert_result_folder("Upload-b", Utc.timestamp_opt(20, 0).unwrap());

    let ids: Vec<String> = store
        .list_result_folders()
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(ids, vec!["Upload-b".to_string(), "Upload-a".to_string()]);

    assert!(store.list_folder_contents("Upload-b").unwrap().is_empty());
    assert!(matches!(
        store.get_file("Upload-zzz", "x.csv"),
        Err(StoreError::FolderNotFound(_))
    ));
    assert_eq!(store.get_file("Upload-a", "x.csv").unwrap().bytes, b"1");
}
