use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::require_fields;
use crate::{
    AppState,
    auth::AuthUser,
    authorization::{AbilityFactory, Action, SubjectAttributes, SubjectKind},
    error::{ApiError, ApiResult},
    models::{CreateTagRequest, Tag, UpdateTagRequest},
};

const MAX_TAG_NAME_LEN: usize = 50;

/// validate_tag_name
///
/// Names are 1 to 50 characters of lowercase letters, digits, `:` and `-`.
pub fn validate_tag_name(name: &str) -> ApiResult<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_TAG_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ':' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "invalid tag name '{name}': use 1-{MAX_TAG_NAME_LEN} characters of a-z, 0-9, ':' or '-'"
        )))
    }
}

/// normalize_color
///
/// Accepts `#abc`, `abc`, `#a1b2c3` or `a1b2c3` and returns the digits
/// without the `#`.
pub fn normalize_color(color: &str) -> ApiResult<String> {
    let digits = color.strip_prefix('#').unwrap_or(color);
    let valid = matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit());

    if valid {
        Ok(digits.to_string())
    } else {
        Err(ApiError::BadRequest(format!("invalid color '{color}'")))
    }
}

/// list_tags
///
/// [Public Route] Every tag, ordered by name.
#[utoipa::path(
    get,
    path = "/tags",
    responses((status = 200, description = "All tags", body = [Tag]))
)]
pub async fn list_tags(State(state): State<AppState>) -> Json<Vec<Tag>> {
    Json(state.repo.list_tags().await)
}

#[utoipa::path(
    post,
    path = "/tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = Tag),
        (status = 400, description = "Invalid name or color"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn create_tag(
    user: AuthUser,
    State(state): State<AppState>,
    Json(mut payload): Json<CreateTagRequest>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    AbilityFactory::create_for_user(&user).check(
        Action::Create,
        &SubjectAttributes::of_kind(SubjectKind::Tag),
        &[],
    )?;
    validate_tag_name(&payload.name)?;
    payload.color = normalize_color(&payload.color)?;

    let name = payload.name.clone();
    match state.repo.create_tag(payload).await {
        Some(tag) => Ok((StatusCode::CREATED, Json(tag))),
        None => Err(ApiError::Conflict(format!("tag '{name}' already exists"))),
    }
}

/// update_tag
///
/// [Authenticated Route] Recolors or redescribes a tag. Names are immutable.
#[utoipa::path(
    patch,
    path = "/tags/{name}",
    request_body = UpdateTagRequest,
    responses(
        (status = 200, description = "Tag updated", body = Tag),
        (status = 403, description = "Not a moderator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_tag(
    user: AuthUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(mut payload): Json<UpdateTagRequest>,
) -> ApiResult<Json<Tag>> {
    let tag = state.repo.get_tag(&name).await.ok_or(ApiError::NotFound)?;
    let fields = payload.field_names();
    require_fields(&fields)?;
    AbilityFactory::create_for_user(&user).check(Action::Update, &tag, &fields)?;

    if let Some(color) = &payload.color {
        payload.color = Some(normalize_color(color)?);
    }

    state
        .repo
        .update_tag(&name, payload)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

#[utoipa::path(
    delete,
    path = "/tags/{name}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not a moderator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_tag(
    user: AuthUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    let tag = state.repo.get_tag(&name).await.ok_or(ApiError::NotFound)?;
    AbilityFactory::create_for_user(&user).check(Action::Delete, &tag, &[])?;

    if state.repo.delete_tag(&name).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
