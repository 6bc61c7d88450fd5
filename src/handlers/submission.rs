use axum::{
    body::Body,
    extract::{ConnectInfo, Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    Json,
};
use std::net::SocketAddr;

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{
    NewSubmission, Paginated, SubmissionQuery, SubmissionResponse, SubmissionUpdate,
};
use crate::services::archive::UploadPayload;
use crate::services::SubmissionService;
use crate::AppState;

/// Create a submission with optional file attachments
/// POST /api/v1/submissions
pub async fn create_submission(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<SubmissionResponse>>)> {
    let mut input = NewSubmission::default();
    let mut files = Vec::new();

    // Process multipart fields
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to process multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "title" => {
                input.title = field.text().await.unwrap_or_default();
            }
            "description" => {
                let text = field.text().await.unwrap_or_default();
                if !text.is_empty() {
                    input.description = Some(text);
                }
            }
            "password" => {
                let text = field.text().await.unwrap_or_default();
                if !text.is_empty() {
                    input.password = Some(text);
                }
            }
            "fingerprint" => {
                input.fingerprint = field.text().await.unwrap_or_default();
            }
            "files" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                match field.bytes().await {
                    Ok(data) => files.push(UploadPayload { file_name, data }),
                    Err(e) => {
                        tracing::warn!("Skipping unreadable upload part {}: {}", file_name, e);
                    }
                }
            }
            _ => {}
        }
    }

    let owner_ip = client_ip(&headers, addr);
    let submission =
        SubmissionService::create(&state.db, state.storage.as_ref(), input, files, owner_ip)
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(SubmissionResponse::from(submission))),
    ))
}

/// List submissions
/// GET /api/v1/submissions?page=1&per_page=20&include_deleted=false
pub async fn list_submissions(
    State(state): State<AppState>,
    Query(query): Query<SubmissionQuery>,
) -> Result<Json<ApiResponse<Paginated<SubmissionResponse>>>> {
    let page = SubmissionService::list(
        &state.db,
        query.page,
        query.per_page,
        query.include_deleted,
    )
    .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// Get a specific submission
/// GET /api/v1/submissions/:id
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SubmissionResponse>>> {
    let submission = SubmissionService::get(&state.db, &id).await?;
    Ok(Json(ApiResponse::success(SubmissionResponse::from(
        submission,
    ))))
}

/// Update a submission; new files are appended as loose blobs
/// PUT /api/v1/submissions/:id
pub async fn update_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<SubmissionResponse>>> {
    let mut fields = SubmissionUpdate::default();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to process multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "title" => {
                let text = field.text().await.unwrap_or_default();
                if !text.is_empty() {
                    fields.title = Some(text);
                }
            }
            "description" => {
                let text = field.text().await.unwrap_or_default();
                if !text.is_empty() {
                    fields.description = Some(text);
                }
            }
            "is_deleted" => {
                let text = field.text().await.unwrap_or_default();
                fields.is_deleted = parse_bool(&text);
            }
            "files" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                match field.bytes().await {
                    Ok(data) => files.push(UploadPayload { file_name, data }),
                    Err(e) => {
                        tracing::warn!("Skipping unreadable upload part {}: {}", file_name, e);
                    }
                }
            }
            _ => {}
        }
    }

    let submission = SubmissionService::update(
        &state.db,
        state.storage.as_ref(),
        &state.locks,
        &id,
        fields,
        files,
    )
    .await?;
    Ok(Json(ApiResponse::success(SubmissionResponse::from(
        submission,
    ))))
}

/// Toggle soft-delete, relocating blobs into or out of the delete sub-path
/// POST /api/v1/submissions/:id/toggle-delete
pub async fn toggle_delete_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SubmissionResponse>>> {
    let submission =
        SubmissionService::toggle_soft_delete(&state.db, state.storage.as_ref(), &state.locks, &id)
            .await?;
    Ok(Json(ApiResponse::success(SubmissionResponse::from(
        submission,
    ))))
}

/// Hard-delete a submission without a credential
/// DELETE /api/v1/submissions/:id
pub async fn delete_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SubmissionResponse>>> {
    hard_delete(&state, &id, None).await
}

/// Hard-delete a submission with a path-embedded credential
/// DELETE /api/v1/submissions/:id/:credential
pub async fn delete_submission_with_credential(
    State(state): State<AppState>,
    Path((id, credential)): Path<(String, String)>,
) -> Result<Json<ApiResponse<SubmissionResponse>>> {
    hard_delete(&state, &id, Some(credential)).await
}

async fn hard_delete(
    state: &AppState,
    id: &str,
    credential: Option<String>,
) -> Result<Json<ApiResponse<SubmissionResponse>>> {
    let deleted = SubmissionService::hard_delete(
        &state.db,
        state.storage.as_ref(),
        &state.locks,
        id,
        credential.as_deref(),
        &state.config.admin.override_secret,
    )
    .await?;
    Ok(Json(ApiResponse::success(SubmissionResponse::from(
        deleted,
    ))))
}

/// Download the first stored file of a submission
/// GET /api/v1/submissions/:id/download
pub async fn download_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let (file_name, data) =
        SubmissionService::download(&state.db, state.storage.as_ref(), &id).await?;

    let content_type = if file_name.ends_with(".zip") {
        "application/zip"
    } else {
        "application/octet-stream"
    };

    let fallback_name = file_name.replace(['"', '\\'], "_");
    let encoded_name = urlencoding::encode(&file_name);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"; filename*=UTF-8''{}",
                fallback_name, encoded_name
            ),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// Client address for the audit fields, preferring the proxy header
fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
