use bytes::Bytes;
use chrono::Utc;
use std::io::{Cursor, Write};
use std::path::Path;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{AppError, Result};
use crate::storage::{self, StorageProvider};

/// One uploaded file part
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub file_name: String,
    pub data: Bytes,
}

/// Naming parameters shared by every file of one archive operation.
///
/// The stamp is fixed once per operation and carries a random suffix, so two
/// concurrent requests with the same title and password cannot collide on
/// the same wall-clock second.
#[derive(Debug, Clone)]
pub struct NamingContext {
    pub title_slug: String,
    pub password_slug: String,
    pub stamp: String,
}

impl NamingContext {
    pub fn new(title: &str, password: Option<&str>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        let stamp = format!("{}_{}", Utc::now().format("%Y-%m-%d_%H%M%S"), &suffix[..8]);
        Self {
            title_slug: slugify(title, "untitled"),
            password_slug: slugify(password.unwrap_or(""), "open"),
            stamp,
        }
    }
}

/// Upload archiver service
pub struct ArchiveService;

impl ArchiveService {
    /// Store each valid payload, bundle the stored files into a single zip
    /// archive, then delete the now-redundant individual files.
    ///
    /// Returns the archive's store-relative path. On any failure after the
    /// first payload was stored, the per-file blobs are removed again so a
    /// failed create leaves nothing behind.
    pub async fn archive(
        store: &dyn StorageProvider,
        payloads: &[UploadPayload],
        naming: &NamingContext,
    ) -> Result<String> {
        let mut stored: Vec<String> = Vec::new();
        let mut index = 1;

        for payload in payloads {
            if payload.data.is_empty() {
                tracing::warn!("Skipping empty upload part: {}", payload.file_name);
                continue;
            }

            let name = match file_extension(&payload.file_name) {
                Some(ext) => format!("{}_{}_{}.{}", index, naming.title_slug, naming.stamp, ext),
                None => format!("{}_{}_{}", index, naming.title_slug, naming.stamp),
            };
            let path = format!("{}/{}", storage::UPLOAD_DIR, name);

            if let Err(e) = store.put(&path, payload.data.clone()).await {
                Self::remove_stored(store, &stored).await;
                return Err(e);
            }

            tracing::debug!("Stored upload part {} as {}", payload.file_name, path);
            stored.push(path);
            index += 1;
        }

        if stored.is_empty() {
            return Err(AppError::NoValidFiles);
        }

        // Archive the bytes as the store holds them, keyed by basename
        let mut entries = Vec::with_capacity(stored.len());
        for path in &stored {
            match store.get(path).await {
                Ok(data) => entries.push((storage::basename(path).to_string(), data)),
                Err(e) => {
                    Self::remove_stored(store, &stored).await;
                    return Err(e);
                }
            }
        }

        let zip_name = format!(
            "{}_{}_{}.zip",
            naming.password_slug, naming.title_slug, naming.stamp
        );
        let zip_path = format!("{}/{}", storage::UPLOAD_DIR, zip_name);

        // Zip assembly is CPU-bound; keep it off the request-handling runtime
        let zip_bytes = match tokio::task::spawn_blocking(move || build_zip(entries)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                Self::remove_stored(store, &stored).await;
                return Err(AppError::ArchiveCreateFailed(e.to_string()));
            }
            Err(e) => {
                Self::remove_stored(store, &stored).await;
                return Err(AppError::Internal(format!("Archive task failed: {}", e)));
            }
        };

        if let Err(e) = store.put(&zip_path, Bytes::from(zip_bytes)).await {
            Self::remove_stored(store, &stored).await;
            return Err(AppError::ArchiveCreateFailed(e.to_string()));
        }

        // The individual files are redundant once the archive exists
        Self::remove_stored(store, &stored).await;

        tracing::info!("Archived {} file(s) into {}", index - 1, zip_path);
        Ok(zip_path)
    }

    /// Store a single payload under a generated unique name without
    /// archiving. Used by update, which appends loose files instead of
    /// re-archiving.
    pub async fn store_loose(store: &dyn StorageProvider, payload: &UploadPayload) -> Result<String> {
        let name = match file_extension(&payload.file_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let path = format!("{}/{}", storage::UPLOAD_DIR, name);
        store.put(&path, payload.data.clone()).await?;
        Ok(path)
    }

    /// Best-effort removal of stored per-file blobs; failures are logged,
    /// never propagated.
    async fn remove_stored(store: &dyn StorageProvider, paths: &[String]) {
        for path in paths {
            if let Err(e) = store.delete(path).await {
                tracing::warn!("Failed to remove stored upload {}: {}", path, e);
            }
        }
    }
}

fn build_zip(entries: Vec<(String, Bytes)>) -> zip::result::ZipResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, data) in entries {
        writer.start_file(name, options)?;
        writer.write_all(&data)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

/// Reduce user text to a filename-safe fragment
fn slugify(value: &str, fallback: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.chars().take(64).collect()
    }
}

fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| slugify(e, "bin").to_lowercase())
}
