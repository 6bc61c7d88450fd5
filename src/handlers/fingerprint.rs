use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{ApiResponse, Result};
use crate::models::Fingerprint;
use crate::services::FingerprintService;
use crate::AppState;

/// List all guard entries
/// GET /api/v1/fingerprints
pub async fn list_fingerprints(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Fingerprint>>>> {
    let entries = FingerprintService::list(&state.db).await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// Toggle the blocked flag on a seen fingerprint
/// POST /api/v1/fingerprints/:fingerprint/block
pub async fn toggle_block(
    State(state): State<AppState>,
    Path(fingerprint): Path<String>,
) -> Result<Json<ApiResponse<Fingerprint>>> {
    let entry = FingerprintService::toggle_block(&state.db, &fingerprint).await?;
    Ok(Json(ApiResponse::success(entry)))
}
