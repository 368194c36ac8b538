use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use super::require_fields;
use crate::{
    AppState,
    auth::AuthUser,
    authorization::{AbilityFactory, Action},
    error::{ApiError, ApiResult},
    models::{Badge, UpdateBadgeRequest},
};

#[utoipa::path(
    get,
    path = "/badges",
    responses((status = 200, description = "All badges", body = [Badge]))
)]
pub async fn list_badges(State(state): State<AppState>) -> Json<Vec<Badge>> {
    Json(state.repo.list_badges().await)
}

/// update_badge
///
/// [Authenticated Route] Badges are administered, never edited by members or
/// moderators.
#[utoipa::path(
    patch,
    path = "/badges/{id}",
    request_body = UpdateBadgeRequest,
    responses(
        (status = 200, description = "Badge updated", body = Badge),
        (status = 403, description = "Badges are managed by administrators"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_badge(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBadgeRequest>,
) -> ApiResult<Json<Badge>> {
    let badge = state.repo.get_badge(id).await.ok_or(ApiError::NotFound)?;
    let fields = payload.field_names();
    require_fields(&fields)?;
    AbilityFactory::create_for_user(&user).check(Action::Update, &badge, &fields)?;

    state
        .repo
        .update_badge(id, payload)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}
