use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use super::{require_fields, require_text};
use crate::{
    AppState,
    auth::AuthUser,
    authorization::{AbilityFactory, Action},
    error::{ApiError, ApiResult},
    models::{RuleResponse, UpdateUserRequest, User, UserProfile},
};

/// get_me
///
/// [Authenticated Route] The caller's profile plus the visibility gate, so
/// clients know whether hidden content will show up in listings.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<UserProfile>> {
    let profile = state.repo.get_user(user.id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(UserProfile {
        can_see_hidden_content: AbilityFactory::can_see_hidden_content(&user),
        user: profile,
    }))
}

/// get_my_abilities
///
/// [Authenticated Route] The caller's rules in declaration order, for
/// clients that mirror decisions when rendering controls.
#[utoipa::path(
    get,
    path = "/me/abilities",
    responses((status = 200, description = "Rules of the caller", body = [RuleResponse]))
)]
pub async fn get_my_abilities(user: AuthUser) -> Json<Vec<RuleResponse>> {
    let ability = AbilityFactory::create_for_user(&user);
    Json(ability.rules().iter().map(RuleResponse::from).collect())
}

/// update_user
///
/// [Authenticated Route] Profile edit. Only the profile's owner passes the
/// check, administrators included.
#[utoipa::path(
    patch,
    path = "/users/{id}",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 403, description = "Cannot update another user's profile"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let target = state.repo.get_user(id).await.ok_or(ApiError::NotFound)?;
    let fields = payload.field_names();
    require_fields(&fields)?;
    AbilityFactory::create_for_user(&user).check(Action::Update, &target, &fields)?;

    if let Some(username) = &payload.username {
        require_text("username", username)?;
    }

    state
        .repo
        .update_user(id, payload)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}
