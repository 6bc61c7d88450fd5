//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use tempfile::TempDir;

use dropbin::config::StorageConfig;
use dropbin::db::Database;
use dropbin::locks::SubmissionLocks;
use dropbin::services::archive::UploadPayload;
use dropbin::storage::LocalStorage;

pub struct TestEnv {
    pub db: Database,
    pub storage: Arc<LocalStorage>,
    pub locks: SubmissionLocks,
    _temp: TempDir,
}

/// Fresh database and blob store rooted in a temp directory
pub async fn setup() -> TestEnv {
    let temp = TempDir::new().expect("Failed to create temp dir");

    let db_path = temp.path().join("test.db");
    let db = Database::new(db_path.to_str().expect("temp path is valid UTF-8"))
        .await
        .expect("Failed to open database");
    db.run_migrations().await.expect("Migrations failed");

    let storage_config = StorageConfig {
        local_path: temp.path().join("storage").to_string_lossy().into_owned(),
        max_upload_size: 1024 * 1024,
    };
    std::fs::create_dir_all(&storage_config.local_path).expect("Failed to create storage dir");
    let storage = Arc::new(LocalStorage::new(&storage_config));

    TestEnv {
        db,
        storage,
        locks: SubmissionLocks::new(),
        _temp: temp,
    }
}

pub fn payload(name: &str, contents: &[u8]) -> UploadPayload {
    UploadPayload {
        file_name: name.to_string(),
        data: Bytes::copy_from_slice(contents),
    }
}

/// Decode a zip blob into (entry name, contents) pairs in insertion order
pub fn read_zip_entries(data: &[u8]) -> Vec<(String, Vec<u8>)> {
    use std::io::Read;

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data)).expect("valid zip archive");
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).expect("zip entry");
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).expect("zip entry bytes");
        entries.push((file.name().to_string(), contents));
    }
    entries
}
