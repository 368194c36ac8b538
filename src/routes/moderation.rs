use crate::{AppState, handlers::threads};
use axum::{Router, routing::put};

/// Moderation Router Module
///
/// Switches that change what members can do with a thread. Mounted behind
/// the same authentication layer as `authenticated_routes`; the handlers
/// check `Update` on the `locked` and `is_visible` fields, which only
/// moderator and administrator rule sets cover.
pub fn moderation_routes() -> Router<AppState> {
    Router::new()
        // PUT /threads/{id}/lock
        // Freezes the thread's post, comments and replies for plain members.
        .route("/threads/{id}/lock", put(threads::set_thread_lock))
        // PUT /threads/{id}/visibility
        // Hides the thread from everyone who cannot see hidden content.
        .route("/threads/{id}/visibility", put(threads::set_thread_visibility))
}
