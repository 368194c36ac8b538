use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{require_fields, require_text};
use crate::{
    AppState,
    auth::AuthUser,
    authorization::{AbilityFactory, Action, SubjectAttributes, SubjectKind},
    error::{ApiError, ApiResult},
    models::{
        CreateStudyDocRequest, PresignedUrlRequest, PresignedUrlResponse, StudyDoc,
        UpdateStudyDocRequest,
    },
    storage::study_doc_key,
};

/// get_presigned_url
///
/// [Authenticated Route] First step of the upload flow: signs a 10-minute PUT
/// URL the client uploads to directly, then registers the document with the
/// returned `resource_key`.
#[utoipa::path(
    post,
    path = "/files/upload",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "Upload URL", body = PresignedUrlResponse),
        (status = 400, description = "Missing filename or type"),
        (status = 500, description = "Storage error")
    )
)]
pub async fn get_presigned_url(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> ApiResult<Json<PresignedUrlResponse>> {
    AbilityFactory::create_for_user(&user).check(
        Action::Create,
        &SubjectAttributes::of_kind(SubjectKind::StudyDoc),
        &[],
    )?;
    require_text("filename", &payload.filename)?;
    require_text("file_type", &payload.file_type)?;

    let key = study_doc_key(user.id, &payload.filename);
    let upload_url = state
        .storage
        .get_presigned_upload_url(&key, &payload.file_type)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key: key,
    }))
}

#[utoipa::path(
    get,
    path = "/study-docs/{id}",
    responses(
        (status = 200, description = "Study document", body = StudyDoc),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_study_doc(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StudyDoc>> {
    state
        .repo
        .get_study_doc(id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// create_study_doc
///
/// [Authenticated Route] Registers an uploaded document. The file key must
/// be one issued to the caller by POST /files/upload.
#[utoipa::path(
    post,
    path = "/study-docs",
    request_body = CreateStudyDocRequest,
    responses(
        (status = 201, description = "Registered", body = StudyDoc),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_study_doc(
    user: AuthUser,
    State(state): State<AppState>,
    Json(mut payload): Json<CreateStudyDocRequest>,
) -> ApiResult<(StatusCode, Json<StudyDoc>)> {
    AbilityFactory::create_for_user(&user).check(
        Action::Create,
        &SubjectAttributes::of_kind(SubjectKind::StudyDoc),
        &[],
    )?;
    require_text("name", &payload.name)?;
    require_text("subject", &payload.subject)?;

    let own_prefix = format!("study-docs/{}/", user.id);
    if !payload.file_key.starts_with(&own_prefix) || payload.file_key.contains("..") {
        return Err(ApiError::BadRequest(
            "file_key was not issued to this user".to_string(),
        ));
    }

    payload.tags = state.repo.filter_known_tags(&payload.tags).await;

    let doc = state
        .repo
        .create_study_doc(user.id, payload)
        .await
        .ok_or_else(|| ApiError::Internal("study doc insert failed".to_string()))?;
    Ok((StatusCode::CREATED, Json(doc)))
}

#[utoipa::path(
    patch,
    path = "/study-docs/{id}",
    request_body = UpdateStudyDocRequest,
    responses(
        (status = 200, description = "Updated", body = StudyDoc),
        (status = 403, description = "Not the uploader"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_study_doc(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateStudyDocRequest>,
) -> ApiResult<Json<StudyDoc>> {
    let doc = state.repo.get_study_doc(id).await.ok_or(ApiError::NotFound)?;
    let fields = payload.field_names();
    require_fields(&fields)?;
    AbilityFactory::create_for_user(&user).check(Action::Update, &doc, &fields)?;

    if let Some(name) = &payload.name {
        require_text("name", name)?;
    }
    if let Some(subject) = &payload.subject {
        require_text("subject", subject)?;
    }
    if let Some(tags) = payload.tags.take() {
        payload.tags = Some(state.repo.filter_known_tags(&tags).await);
    }

    state
        .repo
        .update_study_doc(id, payload)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

#[utoipa::path(
    delete,
    path = "/study-docs/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the uploader"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_study_doc(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let doc = state.repo.get_study_doc(id).await.ok_or(ApiError::NotFound)?;
    AbilityFactory::create_for_user(&user).check(Action::Delete, &doc, &[])?;

    if state.repo.delete_study_doc(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
