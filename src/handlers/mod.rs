//! HTTP handlers.
//!
//! Every mutating handler follows the same sequence: load the subject (404
//! when missing), build the caller's ability set, check the action with the
//! field names the payload is about to write, then call the repository.
//! Repositories never authorize.

use crate::{
    auth::AuthUser,
    authorization::{AbilityFactory, AbilitySet, Action, Subject},
    error::{ApiError, ApiResult},
};

pub mod badges;
pub mod contents;
pub mod study_docs;
pub mod tags;
pub mod threads;
pub mod users;

/// Ability set of an optional viewer; guests get read-only rules.
pub(crate) fn viewer_ability(viewer: Option<&AuthUser>) -> AbilitySet {
    match viewer {
        Some(user) => AbilityFactory::create_for_user(user),
        None => AbilityFactory::create_for_guest(),
    }
}

/// Content the caller may not read is reported as missing, so hidden
/// content does not leak its existence.
pub(crate) fn ensure_readable<S: Subject + ?Sized>(
    ability: &AbilitySet,
    subject: &S,
) -> ApiResult<()> {
    if ability.can(Action::Read, subject, None) {
        Ok(())
    } else {
        Err(ApiError::NotFound)
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Partial updates must name at least one field.
pub(crate) fn require_fields(fields: &[&str]) -> ApiResult<()> {
    if fields.is_empty() {
        return Err(ApiError::BadRequest("nothing to update".to_string()));
    }
    Ok(())
}

/// health
///
/// Liveness check for load balancers.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}
