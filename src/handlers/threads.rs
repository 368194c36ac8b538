use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::{ensure_readable, require_fields, require_text, viewer_ability};
use crate::{
    AppState,
    auth::AuthUser,
    authorization::{AbilityFactory, Action, SubjectAttributes, SubjectKind},
    error::{ApiError, ApiResult},
    models::{
        CommentWithReplies, CreateThreadRequest, Reply, Thread, ThreadDetails, ThreadLockRequest,
        ThreadVisibilityRequest, UpdateThreadRequest,
    },
    pagination::{ListOptions, Page},
};

/// list_threads
///
/// [Public Route] Paged thread listing. Hidden threads are filtered out in the
/// query unless the caller passes the visibility gate.
#[utoipa::path(
    get,
    path = "/threads",
    params(ListOptions),
    responses((status = 200, description = "One page of threads", body = Page<Thread>))
)]
pub async fn list_threads(
    viewer: Option<AuthUser>,
    State(state): State<AppState>,
    Query(options): Query<ListOptions>,
) -> Json<Page<Thread>> {
    let include_hidden = viewer
        .as_ref()
        .is_some_and(|user| AbilityFactory::can_see_hidden_content(user));
    Json(state.repo.list_threads(&options, include_hidden).await)
}

/// get_thread
///
/// [Public Route] A thread with its opening post, comments and replies.
/// Comments and replies the viewer may not read are left out.
#[utoipa::path(
    get,
    path = "/threads/{id}",
    responses(
        (status = 200, description = "Thread details", body = ThreadDetails),
        (status = 404, description = "Missing or hidden")
    )
)]
pub async fn get_thread(
    viewer: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ThreadDetails>> {
    let thread = state.repo.get_thread(id).await.ok_or(ApiError::NotFound)?;
    let ability = viewer_ability(viewer.as_ref());
    ensure_readable(&ability, &thread)?;

    let post = state
        .repo
        .get_thread_post(id)
        .await
        .ok_or_else(|| ApiError::Internal(format!("thread {id} has no opening post")))?;

    let mut replies_by_comment: HashMap<Uuid, Vec<Reply>> = HashMap::new();
    for reply in state.repo.list_replies_for_post(post.id).await {
        if ability.can(Action::Read, &reply, None) {
            replies_by_comment.entry(reply.comment_id).or_default().push(reply);
        }
    }

    let comments = state
        .repo
        .list_comments(post.id)
        .await
        .into_iter()
        .filter(|comment| ability.can(Action::Read, comment, None))
        .map(|comment| CommentWithReplies {
            replies: replies_by_comment.remove(&comment.id).unwrap_or_default(),
            comment,
        })
        .collect();

    Ok(Json(ThreadDetails {
        thread,
        post,
        comments,
    }))
}

/// create_thread
///
/// [Authenticated Route] Opens a thread and its first post. Tags that do not
/// exist are dropped.
#[utoipa::path(
    post,
    path = "/threads",
    request_body = CreateThreadRequest,
    responses(
        (status = 201, description = "Thread created", body = ThreadDetails),
        (status = 400, description = "Empty title or body")
    )
)]
pub async fn create_thread(
    user: AuthUser,
    State(state): State<AppState>,
    Json(mut payload): Json<CreateThreadRequest>,
) -> ApiResult<(StatusCode, Json<ThreadDetails>)> {
    AbilityFactory::create_for_user(&user).check(
        Action::Create,
        &SubjectAttributes::of_kind(SubjectKind::Thread),
        &[],
    )?;
    require_text("title", &payload.title)?;
    require_text("body", &payload.body)?;

    payload.tags = state.repo.filter_known_tags(&payload.tags).await;

    let (thread, post) = state
        .repo
        .create_thread(user.id, payload)
        .await
        .ok_or_else(|| ApiError::Internal("thread insert failed".to_string()))?;

    tracing::info!(thread_id = %thread.id, author_id = %user.id, "thread created");
    Ok((
        StatusCode::CREATED,
        Json(ThreadDetails {
            thread,
            post,
            comments: vec![],
        }),
    ))
}

/// update_thread
///
/// [Authenticated Route] Partial update. Every provided field is checked, so
/// an author can retitle their thread but a moderator-only field fails the
/// whole request.
#[utoipa::path(
    patch,
    path = "/threads/{id}",
    request_body = UpdateThreadRequest,
    responses(
        (status = 200, description = "Thread updated", body = Thread),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_thread(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateThreadRequest>,
) -> ApiResult<Json<Thread>> {
    let thread = state.repo.get_thread(id).await.ok_or(ApiError::NotFound)?;
    let fields = payload.field_names();
    require_fields(&fields)?;
    let ability = AbilityFactory::create_for_user(&user);
    ensure_readable(&ability, &thread)?;
    ability.check(Action::Update, &thread, &fields)?;

    if let Some(title) = &payload.title {
        require_text("title", title)?;
    }
    if let Some(tags) = payload.tags.take() {
        payload.tags = Some(state.repo.filter_known_tags(&tags).await);
    }

    state
        .repo
        .update_thread(id, payload)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// delete_thread
///
/// [Authenticated Route] Removes the thread with its post and discussion.
#[utoipa::path(
    delete,
    path = "/threads/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_thread(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let thread = state.repo.get_thread(id).await.ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    ensure_readable(&ability, &thread)?;
    ability.check(Action::Delete, &thread, &[])?;

    if state.repo.delete_thread(id).await {
        tracing::info!(thread_id = %id, user_id = %user.id, "thread deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// set_thread_lock
///
/// [Moderation Route] Locks or unlocks a thread. A locked thread freezes its
/// post, comments and replies for plain members.
#[utoipa::path(
    put,
    path = "/threads/{id}/lock",
    request_body = ThreadLockRequest,
    responses(
        (status = 200, description = "Lock updated", body = Thread),
        (status = 403, description = "Not a moderator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn set_thread_lock(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ThreadLockRequest>,
) -> ApiResult<Json<Thread>> {
    let thread = state.repo.get_thread(id).await.ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    ensure_readable(&ability, &thread)?;
    ability.check(Action::Update, &thread, &["locked"])?;

    let thread = state
        .repo
        .set_thread_locked(id, payload.locked)
        .await
        .ok_or(ApiError::NotFound)?;
    tracing::info!(thread_id = %id, locked = payload.locked, moderator_id = %user.id, "thread lock changed");
    Ok(Json(thread))
}

/// set_thread_visibility
///
/// [Moderation Route] Hides or restores a thread and its opening post.
#[utoipa::path(
    put,
    path = "/threads/{id}/visibility",
    request_body = ThreadVisibilityRequest,
    responses(
        (status = 200, description = "Visibility updated", body = Thread),
        (status = 403, description = "Not a moderator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn set_thread_visibility(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ThreadVisibilityRequest>,
) -> ApiResult<Json<Thread>> {
    let thread = state.repo.get_thread(id).await.ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    ensure_readable(&ability, &thread)?;
    ability.check(Action::Update, &thread, &["is_visible"])?;

    let thread = state
        .repo
        .set_thread_visibility(id, payload.is_visible)
        .await
        .ok_or(ApiError::NotFound)?;
    tracing::info!(thread_id = %id, is_visible = payload.is_visible, moderator_id = %user.id, "thread visibility changed");
    Ok(Json(thread))
}
