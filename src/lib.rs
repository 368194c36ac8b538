use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Policy engine: pure, synchronous, request-scoped.
pub mod authorization;

// Application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod storage;

pub mod routes;
use auth::AuthUser;
use routes::{authenticated, moderation, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document generated from the `#[utoipa::path]` handlers and the
/// `ToSchema` models, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::threads::list_threads, handlers::threads::get_thread,
        handlers::threads::create_thread, handlers::threads::update_thread,
        handlers::threads::delete_thread, handlers::threads::set_thread_lock,
        handlers::threads::set_thread_visibility,
        handlers::contents::update_post, handlers::contents::delete_post,
        handlers::contents::vote_post, handlers::contents::create_comment,
        handlers::contents::update_comment, handlers::contents::delete_comment,
        handlers::contents::vote_comment, handlers::contents::create_reply,
        handlers::contents::update_reply, handlers::contents::delete_reply,
        handlers::contents::vote_reply,
        handlers::tags::list_tags, handlers::tags::create_tag,
        handlers::tags::update_tag, handlers::tags::delete_tag,
        handlers::study_docs::get_presigned_url, handlers::study_docs::get_study_doc,
        handlers::study_docs::create_study_doc, handlers::study_docs::update_study_doc,
        handlers::study_docs::delete_study_doc,
        handlers::users::get_me, handlers::users::get_my_abilities, handlers::users::update_user,
        handlers::badges::list_badges, handlers::badges::update_badge,
    ),
    components(
        schemas(
            models::User, models::Thread, models::Post, models::Comment, models::Reply,
            models::Tag, models::StudyDoc, models::Badge, models::CommentWithReplies,
            models::ThreadDetails, models::VoteTally, models::UserProfile, models::RuleResponse,
            models::UpdateUserRequest, models::CreateThreadRequest, models::UpdateThreadRequest,
            models::ThreadLockRequest, models::ThreadVisibilityRequest,
            models::ContentBodyRequest, models::VoteRequest, models::CreateTagRequest,
            models::UpdateTagRequest, models::CreateStudyDocRequest,
            models::UpdateStudyDocRequest, models::UpdateBadgeRequest,
            models::PresignedUrlRequest, models::PresignedUrlResponse,
            pagination::SortOrder,
        )
    ),
    tags(
        (name = "campus-forum", description = "Campus forum API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared state: persistence, object storage and the immutable
/// configuration. Cloned per request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Runs the `AuthUser` extractor ahead of the handler; a failed extraction
/// short-circuits with 401.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routers, the authentication layer, the observability stack
/// and CORS around the shared state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let protected = authenticated::authenticated_routes()
        .merge(moderation::moderation_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(protected)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                // Outermost: every request gets an id before its span opens.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span carrying method, URI and `x-request-id`, so
/// every log line of a request (ability decisions included) is correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_forum_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/threads",
            "/threads/{id}",
            "/threads/{id}/lock",
            "/posts/{id}/vote",
            "/comments/{id}/replies",
            "/tags/{name}",
            "/files/upload",
            "/me/abilities",
            "/badges/{id}",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }
}
