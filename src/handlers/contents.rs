use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{ensure_readable, require_text};
use crate::{
    AppState,
    auth::AuthUser,
    authorization::{AbilityFactory, AbilitySet, Action, Subject, SubjectAttributes, SubjectKind},
    error::{ApiError, ApiResult},
    models::{Comment, ContentBodyRequest, Post, Reply, VoteRequest, VoteTally, VoteTarget},
};

fn validate_vote(value: i16) -> ApiResult<()> {
    if matches!(value, -1..=1) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "vote value must be -1, 0 or 1".to_string(),
        ))
    }
}

/// Shared tail of the three vote endpoints.
async fn cast_vote<S: Subject>(
    state: &AppState,
    ability: &AbilitySet,
    subject: &S,
    target: VoteTarget,
    value: i16,
) -> ApiResult<Json<VoteTally>> {
    validate_vote(value)?;
    ensure_readable(ability, subject)?;
    ability.check(Action::Interact, subject, &[])?;

    let requester = ability
        .requester()
        .ok_or_else(|| ApiError::Internal("vote without a requester".to_string()))?;
    state
        .repo
        .vote(target, requester, value)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

// --- POSTS ---

/// update_post
///
/// [Authenticated Route] Edits the body of a thread's opening post.
#[utoipa::path(
    patch,
    path = "/posts/{id}",
    request_body = ContentBodyRequest,
    responses(
        (status = 200, description = "Post updated", body = Post),
        (status = 403, description = "Not the author, or locked"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContentBodyRequest>,
) -> ApiResult<Json<Post>> {
    let post = state.repo.get_post(id).await.ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    ensure_readable(&ability, &post)?;
    ability.check(Action::Update, &post, &["body"])?;
    require_text("body", &payload.body)?;

    state
        .repo
        .update_post(id, payload.body)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// delete_post
///
/// [Authenticated Route] Always refused: a post only goes away together with
/// its thread (DELETE /threads/{id}).
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    responses(
        (status = 403, description = "Posts are deleted through their thread"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let post = state.repo.get_post(id).await.ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    ensure_readable(&ability, &post)?;
    ability.check(Action::Delete, &post, &[])?;

    if state.repo.delete_thread(post.thread_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

#[utoipa::path(
    post,
    path = "/posts/{id}/vote",
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Tally after the vote", body = VoteTally),
        (status = 400, description = "Invalid value"),
        (status = 403, description = "Locked")
    )
)]
pub async fn vote_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> ApiResult<Json<VoteTally>> {
    let post = state.repo.get_post(id).await.ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    cast_vote(&state, &ability, &post, VoteTarget::Post(id), payload.value).await
}

// --- COMMENTS ---

/// create_comment
///
/// [Authenticated Route] Answers a post. Refused for plain members once the
/// thread is locked.
#[utoipa::path(
    post,
    path = "/posts/{id}/comments",
    request_body = ContentBodyRequest,
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 403, description = "Post is locked"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn create_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<ContentBodyRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let post = state.repo.get_post(post_id).await.ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    ensure_readable(&ability, &post)?;
    ability.check(
        Action::Create,
        &SubjectAttributes::of_kind(SubjectKind::Comment).parent_locked(post.locked),
        &[],
    )?;
    require_text("body", &payload.body)?;

    let comment = state
        .repo
        .create_comment(post_id, user.id, payload.body)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[utoipa::path(
    patch,
    path = "/comments/{id}",
    request_body = ContentBodyRequest,
    responses(
        (status = 200, description = "Comment updated", body = Comment),
        (status = 403, description = "Not the author, or locked"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContentBodyRequest>,
) -> ApiResult<Json<Comment>> {
    let comment = state.repo.get_comment(id).await.ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    ensure_readable(&ability, &comment)?;
    ability.check(Action::Update, &comment, &["body"])?;
    require_text("body", &payload.body)?;

    state
        .repo
        .update_comment(id, payload.body)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// delete_comment
///
/// [Authenticated Route] Removes a comment and its replies.
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let comment = state.repo.get_comment(id).await.ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    ensure_readable(&ability, &comment)?;
    ability.check(Action::Delete, &comment, &[])?;

    if state.repo.delete_comment(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

#[utoipa::path(
    post,
    path = "/comments/{id}/vote",
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Tally after the vote", body = VoteTally),
        (status = 400, description = "Invalid value"),
        (status = 403, description = "Locked")
    )
)]
pub async fn vote_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> ApiResult<Json<VoteTally>> {
    let comment = state.repo.get_comment(id).await.ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    cast_vote(&state, &ability, &comment, VoteTarget::Comment(id), payload.value).await
}

// --- REPLIES ---

#[utoipa::path(
    post,
    path = "/comments/{id}/replies",
    request_body = ContentBodyRequest,
    responses(
        (status = 201, description = "Reply created", body = Reply),
        (status = 403, description = "Post is locked"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn create_reply(
    user: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<ContentBodyRequest>,
) -> ApiResult<(StatusCode, Json<Reply>)> {
    let comment = state
        .repo
        .get_comment(comment_id)
        .await
        .ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    ensure_readable(&ability, &comment)?;
    ability.check(
        Action::Create,
        &SubjectAttributes::of_kind(SubjectKind::Reply).parent_locked(comment.post_locked),
        &[],
    )?;
    require_text("body", &payload.body)?;

    let reply = state
        .repo
        .create_reply(comment_id, user.id, payload.body)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok((StatusCode::CREATED, Json(reply)))
}

#[utoipa::path(
    patch,
    path = "/replies/{id}",
    request_body = ContentBodyRequest,
    responses(
        (status = 200, description = "Reply updated", body = Reply),
        (status = 403, description = "Not the author, or locked"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_reply(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContentBodyRequest>,
) -> ApiResult<Json<Reply>> {
    let reply = state.repo.get_reply(id).await.ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    ensure_readable(&ability, &reply)?;
    ability.check(Action::Update, &reply, &["body"])?;
    require_text("body", &payload.body)?;

    state
        .repo
        .update_reply(id, payload.body)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

#[utoipa::path(
    delete,
    path = "/replies/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_reply(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let reply = state.repo.get_reply(id).await.ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    ensure_readable(&ability, &reply)?;
    ability.check(Action::Delete, &reply, &[])?;

    if state.repo.delete_reply(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

#[utoipa::path(
    post,
    path = "/replies/{id}/vote",
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Tally after the vote", body = VoteTally),
        (status = 400, description = "Invalid value"),
        (status = 403, description = "Locked")
    )
)]
pub async fn vote_reply(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> ApiResult<Json<VoteTally>> {
    let reply = state.repo.get_reply(id).await.ok_or(ApiError::NotFound)?;
    let ability = AbilityFactory::create_for_user(&user);
    cast_vote(&state, &ability, &reply, VoteTarget::Reply(id), payload.value).await
}
