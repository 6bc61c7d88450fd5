use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Storage provider trait
///
/// Paths are store-relative (e.g. `uploads/archive.zip`); the provider owns
/// the mapping to its backing medium.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Upload data to storage
    async fn put(&self, path: &str, data: Bytes) -> Result<()>;

    /// Download data from storage
    async fn get(&self, path: &str) -> Result<Bytes>;

    /// Delete data from storage
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check if a file exists
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Move data to a new path within the store
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Get the storage type name
    fn storage_type(&self) -> &'static str;
}
