use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Submission row model
///
/// `file_paths` is stored as a JSON array of store-relative path strings.
#[derive(Debug, Clone, FromRow)]
pub struct Submission {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub password: Option<String>,
    pub owner_ip: String,
    pub fingerprint: String,
    pub file_paths: String,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Submission {
    /// Decode the stored JSON path list. A row never holds malformed JSON
    /// (writes go through `serde_json`), but decode defensively to an empty
    /// list rather than failing a read.
    pub fn paths(&self) -> Vec<String> {
        serde_json::from_str(&self.file_paths).unwrap_or_default()
    }

    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Submission response; the deletion password never leaves the server
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub owner_ip: String,
    pub fingerprint: String,
    pub file_paths: Vec<String>,
    pub is_deleted: bool,
    pub created_at: String,
}

impl From<Submission> for SubmissionResponse {
    fn from(submission: Submission) -> Self {
        let file_paths = submission.paths();
        Self {
            id: submission.id,
            title: submission.title,
            description: submission.description,
            owner_ip: submission.owner_ip,
            fingerprint: submission.fingerprint,
            file_paths,
            is_deleted: submission.is_deleted,
            created_at: submission.created_at,
        }
    }
}

/// Scalar fields of a create request (file parts are handled separately)
#[derive(Debug, Default)]
pub struct NewSubmission {
    pub title: String,
    pub description: Option<String>,
    pub password: Option<String>,
    pub fingerprint: String,
}

/// Scalar fields of an update request; absent fields keep their stored value
#[derive(Debug, Default)]
pub struct SubmissionUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_deleted: Option<bool>,
}

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct SubmissionQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    #[serde(default)]
    pub include_deleted: bool,
}

/// Page-based list envelope
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
}
