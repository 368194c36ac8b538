use crate::{
    AppState,
    handlers::{badges, contents, study_docs, tags, threads, users},
};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Authenticated Router Module
///
/// Every handler here receives a resolved `AuthUser`; the middleware layered
/// on this router in `create_router` rejects unauthenticated requests with
/// 401 before any handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Profile ---
        .route("/me", get(users::get_me))
        // GET /me/abilities
        // The caller's rule list, mirrored by clients to grey out controls.
        .route("/me/abilities", get(users::get_my_abilities))
        .route("/users/{id}", patch(users::update_user))
        // --- Threads ---
        .route("/threads", post(threads::create_thread))
        .route(
            "/threads/{id}",
            patch(threads::update_thread).delete(threads::delete_thread),
        )
        // --- Posts ---
        // DELETE is always refused; posts go away with their thread.
        .route(
            "/posts/{id}",
            patch(contents::update_post).delete(contents::delete_post),
        )
        .route("/posts/{id}/vote", post(contents::vote_post))
        .route("/posts/{id}/comments", post(contents::create_comment))
        // --- Comments ---
        .route(
            "/comments/{id}",
            patch(contents::update_comment).delete(contents::delete_comment),
        )
        .route("/comments/{id}/vote", post(contents::vote_comment))
        .route("/comments/{id}/replies", post(contents::create_reply))
        // --- Replies ---
        .route(
            "/replies/{id}",
            patch(contents::update_reply).delete(contents::delete_reply),
        )
        .route("/replies/{id}/vote", post(contents::vote_reply))
        // --- Tags ---
        .route("/tags", post(tags::create_tag))
        .route(
            "/tags/{name}",
            patch(tags::update_tag).delete(tags::delete_tag),
        )
        // --- Study documents ---
        // POST /files/upload
        // Signs a short-lived upload URL; the client uploads straight to S3.
        .route("/files/upload", post(study_docs::get_presigned_url))
        .route("/study-docs", post(study_docs::create_study_doc))
        .route(
            "/study-docs/{id}",
            patch(study_docs::update_study_doc).delete(study_docs::delete_study_doc),
        )
        // --- Badges ---
        .route("/badges/{id}", patch(badges::update_badge))
}
