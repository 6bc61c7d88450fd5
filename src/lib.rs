pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod locks;
pub mod models;
pub mod services;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use crate::config::Config;
pub use crate::db::Database;
pub use crate::error::AppError;
use crate::locks::SubmissionLocks;
use crate::storage::StorageProvider;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub storage: Arc<dyn StorageProvider>,
    pub locks: Arc<SubmissionLocks>,
}

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Submissions
        .route(
            "/submissions",
            get(handlers::submission::list_submissions)
                .post(handlers::submission::create_submission),
        )
        .route(
            "/submissions/:id",
            get(handlers::submission::get_submission)
                .put(handlers::submission::update_submission)
                .delete(handlers::submission::delete_submission),
        )
        .route(
            "/submissions/:id/toggle-delete",
            post(handlers::submission::toggle_delete_submission),
        )
        .route(
            "/submissions/:id/download",
            get(handlers::submission::download_submission),
        )
        .route(
            "/submissions/:id/:credential",
            delete(handlers::submission::delete_submission_with_credential),
        )
        // Fingerprint guard (administrative)
        .route("/fingerprints", get(handlers::fingerprint::list_fingerprints))
        .route(
            "/fingerprints/:fingerprint/block",
            post(handlers::fingerprint::toggle_block),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::max(state.config.storage.max_upload_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
