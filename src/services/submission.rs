use chrono::Utc;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::locks::SubmissionLocks;
use crate::models::{
    NewSubmission, Paginated, Submission, SubmissionResponse, SubmissionUpdate,
};
use crate::services::archive::{ArchiveService, NamingContext, UploadPayload};
use crate::services::fingerprint::{FingerprintService, GuardOutcome};
use crate::storage::{self, StorageProvider};

const MAX_FIELD_LEN: usize = 255;
const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

/// Submission lifecycle service
pub struct SubmissionService;

impl SubmissionService {
    /// Create a submission: guard check, archive the uploads, persist the row.
    ///
    /// Nothing is persisted when validation or the guard rejects the request,
    /// and an archiving failure aborts the create before a row is written.
    pub async fn create(
        db: &Database,
        store: &dyn StorageProvider,
        input: NewSubmission,
        files: Vec<UploadPayload>,
        owner_ip: String,
    ) -> Result<Submission> {
        Self::validate_new(&input)?;

        if FingerprintService::check(db, &input.fingerprint).await? == GuardOutcome::Blocked {
            return Err(AppError::Forbidden(
                "You are blocked and cannot proceed.".to_string(),
            ));
        }

        let file_paths = if files.is_empty() {
            Vec::new()
        } else {
            let naming = NamingContext::new(&input.title, input.password.as_deref());
            let archive_path = ArchiveService::archive(store, &files, &naming).await?;
            vec![archive_path]
        };

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let paths_json = encode_paths(&file_paths)?;

        sqlx::query(
            r#"
            INSERT INTO submissions (id, title, description, password, owner_ip, fingerprint, file_paths, is_deleted, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.password)
        .bind(&owner_ip)
        .bind(&input.fingerprint)
        .bind(&paths_json)
        .bind(&now)
        .bind(&now)
        .execute(db.pool())
        .await?;

        Self::get(db, &id).await
    }

    /// Get a submission by ID
    pub async fn get(db: &Database, id: &str) -> Result<Submission> {
        let submission: Submission = sqlx::query_as("SELECT * FROM submissions WHERE id = ?")
            .bind(id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        Ok(submission)
    }

    /// List submissions newest-first with a page-based envelope
    pub async fn list(
        db: &Database,
        page: Option<u32>,
        per_page: Option<u32>,
        include_deleted: bool,
    ) -> Result<Paginated<SubmissionResponse>> {
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let page = page.unwrap_or(1).max(1);
        let offset = (page as i64 - 1) * per_page as i64;

        let (total,): (i64,) = if include_deleted {
            sqlx::query_as("SELECT COUNT(*) FROM submissions")
                .fetch_one(db.pool())
                .await?
        } else {
            sqlx::query_as("SELECT COUNT(*) FROM submissions WHERE is_deleted = 0")
                .fetch_one(db.pool())
                .await?
        };

        let rows: Vec<Submission> = if include_deleted {
            sqlx::query_as("SELECT * FROM submissions ORDER BY created_at DESC LIMIT ? OFFSET ?")
                .bind(per_page as i64)
                .bind(offset)
                .fetch_all(db.pool())
                .await?
        } else {
            sqlx::query_as(
                "SELECT * FROM submissions WHERE is_deleted = 0 ORDER BY created_at DESC LIMIT ? OFFSET ?",
            )
            .bind(per_page as i64)
            .bind(offset)
            .fetch_all(db.pool())
            .await?
        };

        let last_page = ((total as f64) / (per_page as f64)).ceil().max(1.0) as u32;

        Ok(Paginated {
            data: rows.into_iter().map(SubmissionResponse::from).collect(),
            total,
            current_page: page,
            last_page,
            per_page,
        })
    }

    /// Update scalar fields and append any new files as loose blobs.
    ///
    /// Unlike create, update never archives: new paths are appended to the
    /// existing list individually.
    pub async fn update(
        db: &Database,
        store: &dyn StorageProvider,
        locks: &SubmissionLocks,
        id: &str,
        fields: SubmissionUpdate,
        files: Vec<UploadPayload>,
    ) -> Result<Submission> {
        let _guard = locks.acquire(id).await;

        let existing = Self::get(db, id).await?;
        Self::validate_update(&fields)?;

        let mut file_paths = existing.paths();
        for payload in &files {
            if payload.data.is_empty() {
                tracing::warn!("Skipping empty upload part: {}", payload.file_name);
                continue;
            }
            let path = ArchiveService::store_loose(store, payload).await?;
            file_paths.push(path);
        }

        let title = fields.title.unwrap_or(existing.title);
        let description = fields.description.or(existing.description);
        let is_deleted = fields.is_deleted.unwrap_or(existing.is_deleted);
        let paths_json = encode_paths(&file_paths)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "UPDATE submissions SET title = ?, description = ?, is_deleted = ?, file_paths = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&title)
        .bind(&description)
        .bind(is_deleted)
        .bind(&paths_json)
        .bind(&now)
        .bind(id)
        .execute(db.pool())
        .await?;

        Self::get(db, id).await
    }

    /// Flip the soft-delete flag, relocating every blob into the delete
    /// sub-path (or back out of it). Applied twice this restores both the
    /// flag and the paths.
    pub async fn toggle_soft_delete(
        db: &Database,
        store: &dyn StorageProvider,
        locks: &SubmissionLocks,
        id: &str,
    ) -> Result<Submission> {
        let _guard = locks.acquire(id).await;

        let existing = Self::get(db, id).await?;
        let restoring = existing.is_deleted;

        let mut new_paths = Vec::new();
        for path in existing.paths() {
            let base = storage::basename(&path);
            let new_path = if restoring {
                format!("{}/{}", storage::UPLOAD_DIR, base)
            } else {
                format!("{}/{}", storage::DELETED_DIR, base)
            };

            // A missing blob is consistency drift, not a reason to fail the
            // toggle; the would-be destination is still recorded.
            if store.exists(&path).await? {
                store.rename(&path, &new_path).await?;
            } else {
                tracing::warn!("Blob missing during soft-delete toggle: {}", path);
            }
            new_paths.push(new_path);
        }

        let paths_json = encode_paths(&new_paths)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "UPDATE submissions SET is_deleted = ?, file_paths = ?, updated_at = ? WHERE id = ?",
        )
        .bind(!existing.is_deleted)
        .bind(&paths_json)
        .bind(&now)
        .bind(id)
        .execute(db.pool())
        .await?;

        Self::get(db, id).await
    }

    /// Remove the row and its blobs. When the record carries a password the
    /// supplied credential must match it, or the configured operator
    /// override secret. Blob deletion is best-effort.
    pub async fn hard_delete(
        db: &Database,
        store: &dyn StorageProvider,
        locks: &SubmissionLocks,
        id: &str,
        credential: Option<&str>,
        override_secret: &str,
    ) -> Result<Submission> {
        let _guard = locks.acquire(id).await;

        let existing = Self::get(db, id).await?;

        if existing.has_password() {
            let supplied = credential.unwrap_or("");
            let stored = existing.password.as_deref().unwrap_or("");
            let matches_password = supplied == stored;
            let matches_override = !override_secret.is_empty()
                && constant_time_eq(supplied.as_bytes(), override_secret.as_bytes());
            if !matches_password && !matches_override {
                return Err(AppError::Forbidden(
                    "You are not authorized to delete this item.".to_string(),
                ));
            }
        }

        for path in existing.paths() {
            if let Err(e) = store.delete(&path).await {
                tracing::warn!("Failed to delete blob {}: {}", path, e);
            }
        }

        sqlx::query("DELETE FROM submissions WHERE id = ?")
            .bind(id)
            .execute(db.pool())
            .await?;

        tracing::info!("Hard-deleted submission {}", id);
        Ok(existing)
    }

    /// Resolve the first stored path to its basename and bytes for download
    pub async fn download(
        db: &Database,
        store: &dyn StorageProvider,
        id: &str,
    ) -> Result<(String, bytes::Bytes)> {
        let existing = Self::get(db, id).await?;

        let paths = existing.paths();
        let path = paths
            .first()
            .ok_or_else(|| AppError::NoContent("No file path found".to_string()))?;

        let data = store.get(path).await.map_err(|e| match e {
            AppError::NotFound(_) => AppError::MissingBlob(format!("File does not exist: {}", path)),
            other => other,
        })?;

        Ok((storage::basename(path).to_string(), data))
    }

    fn validate_new(input: &NewSubmission) -> Result<()> {
        if input.title.trim().is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }
        if input.title.len() > MAX_FIELD_LEN {
            return Err(AppError::Validation(
                "title must be at most 255 characters".to_string(),
            ));
        }
        if input.fingerprint.trim().is_empty() {
            return Err(AppError::Validation("fingerprint is required".to_string()));
        }
        if let Some(description) = &input.description {
            if description.len() > MAX_FIELD_LEN {
                return Err(AppError::Validation(
                    "description must be at most 255 characters".to_string(),
                ));
            }
        }
        if let Some(password) = &input.password {
            if password.len() > MAX_FIELD_LEN {
                return Err(AppError::Validation(
                    "password must be at most 255 characters".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn validate_update(fields: &SubmissionUpdate) -> Result<()> {
        if let Some(title) = &fields.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation("title must not be empty".to_string()));
            }
            if title.len() > MAX_FIELD_LEN {
                return Err(AppError::Validation(
                    "title must be at most 255 characters".to_string(),
                ));
            }
        }
        if let Some(description) = &fields.description {
            if description.len() > MAX_FIELD_LEN {
                return Err(AppError::Validation(
                    "description must be at most 255 characters".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn encode_paths(paths: &[String]) -> Result<String> {
    serde_json::to_string(paths)
        .map_err(|e| AppError::Internal(format!("Failed to encode file paths: {}", e)))
}

/// Compare credentials without leaking a length-dependent timing signal
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::constant_time_eq;

    #[test]
    fn constant_time_eq_matches_equal_slices() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secrets"));
        assert!(constant_time_eq(b"", b""));
    }
}
