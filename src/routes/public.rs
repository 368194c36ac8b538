use crate::{
    AppState,
    handlers::{self, badges, study_docs, tags, threads},
};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only endpoints. Handlers that accept an optional identity build a
/// guest ability set when there is none, which hides hidden content.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check.
        .route("/health", get(handlers::health))
        // GET /threads?page=..&per_page=..&sort=..&tag=..
        .route("/threads", get(threads::list_threads))
        // GET /threads/{id}
        // Thread, opening post and the readable part of its discussion.
        .route("/threads/{id}", get(threads::get_thread))
        .route("/tags", get(tags::list_tags))
        .route("/badges", get(badges::list_badges))
        .route("/study-docs/{id}", get(study_docs::get_study_doc))
}
