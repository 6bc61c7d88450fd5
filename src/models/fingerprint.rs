use serde::Serialize;
use sqlx::FromRow;

/// Guard entry for a client-supplied device fingerprint token
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Fingerprint {
    pub fingerprint: String,
    pub name: Option<String>,
    pub is_blocked: bool,
    pub created_at: String,
    pub updated_at: String,
}
