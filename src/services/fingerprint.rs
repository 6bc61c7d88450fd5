use chrono::Utc;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::Fingerprint;

/// Guard decision for a submitted fingerprint token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Allowed,
    Blocked,
}

/// Fingerprint guard service
pub struct FingerprintService;

impl FingerprintService {
    /// Look up a fingerprint token, creating an unblocked entry on first
    /// sight. A seen, unblocked token performs no write.
    pub async fn check(db: &Database, token: &str) -> Result<GuardOutcome> {
        let existing: Option<Fingerprint> =
            sqlx::query_as("SELECT * FROM fingerprints WHERE fingerprint = ?")
                .bind(token)
                .fetch_optional(db.pool())
                .await?;

        if let Some(entry) = existing {
            if entry.is_blocked {
                return Ok(GuardOutcome::Blocked);
            }
            return Ok(GuardOutcome::Allowed);
        }

        // First-seen wins: a concurrent insert must not clobber is_blocked
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO fingerprints (fingerprint, name, is_blocked, created_at, updated_at)
            VALUES (?, NULL, 0, ?, ?)
            ON CONFLICT(fingerprint) DO NOTHING
            "#,
        )
        .bind(token)
        .bind(&now)
        .bind(&now)
        .execute(db.pool())
        .await?;

        tracing::info!("Registered new fingerprint");
        Ok(GuardOutcome::Allowed)
    }

    /// Flip the blocked flag on a seen fingerprint; its own inverse
    pub async fn toggle_block(db: &Database, token: &str) -> Result<Fingerprint> {
        let entry: Fingerprint = sqlx::query_as("SELECT * FROM fingerprints WHERE fingerprint = ?")
            .bind(token)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound("Fingerprint not found".to_string()))?;

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE fingerprints SET is_blocked = ?, updated_at = ? WHERE fingerprint = ?")
            .bind(!entry.is_blocked)
            .bind(&now)
            .bind(token)
            .execute(db.pool())
            .await?;

        let updated: Fingerprint = sqlx::query_as("SELECT * FROM fingerprints WHERE fingerprint = ?")
            .bind(token)
            .fetch_one(db.pool())
            .await?;

        tracing::info!(
            "Fingerprint {} is now {}",
            token,
            if updated.is_blocked { "blocked" } else { "unblocked" }
        );
        Ok(updated)
    }

    /// Administrative listing of all guard entries
    pub async fn list(db: &Database) -> Result<Vec<Fingerprint>> {
        let entries: Vec<Fingerprint> =
            sqlx::query_as("SELECT * FROM fingerprints ORDER BY created_at DESC")
                .fetch_all(db.pool())
                .await?;
        Ok(entries)
    }
}
