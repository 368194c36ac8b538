use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use campus_forum::{
    AppConfig, AppState, InMemoryRepository, MockStorageService, create_router,
    authorization::Role, models::User,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

// --- Harness ---

struct UploadApp {
    router: Router,
    member: Uuid,
    other: Uuid,
    moderator: Uuid,
}

async fn upload_app(storage: MockStorageService) -> UploadApp {
    let repo = Arc::new(InMemoryRepository::new());
    let mut ids = Vec::new();
    for (name, roles) in [
        ("member", vec![Role::User]),
        ("other", vec![Role::User]),
        ("mod", vec![Role::Moderator]),
    ] {
        let id = Uuid::new_v4();
        repo.insert_user(User {
            id,
            username: name.to_string(),
            email: format!("{name}@campus.test"),
            roles,
            ..User::default()
        })
        .await;
        ids.push(id);
    }

    let router = create_router(AppState {
        repo,
        storage: Arc::new(storage),
        config: AppConfig::default(),
    });

    UploadApp {
        router,
        member: ids[0],
        other: ids[1],
        moderator: ids[2],
    }
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    user: Uuid,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", user.to_string())
        .header("content-type", "application/json");
    let body = body.map(|value| Body::from(value.to_string())).unwrap_or_default();
    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn study_doc_payload(file_key: &str) -> Value {
    json!({
        "name": "Linear Algebra 2023 exam",
        "subject": "MA4101",
        "year": 2023,
        "file_key": file_key
    })
}

// --- Tests ---

#[tokio::test]
async fn test_presigned_url_is_scoped_to_the_caller() {
    let app = upload_app(MockStorageService::new()).await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/files/upload",
        app.member,
        Some(json!({ "filename": "Exam.PDF", "file_type": "application/pdf" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let key = body["resource_key"].as_str().unwrap();
    assert!(key.starts_with(&format!("study-docs/{}/", app.member)));
    assert!(key.ends_with(".pdf"));
    assert!(body["upload_url"].as_str().unwrap().contains(key));
}

#[tokio::test]
async fn test_presigned_url_requires_filename() {
    let app = upload_app(MockStorageService::new()).await;

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/files/upload",
        app.member,
        Some(json!({ "filename": "  ", "file_type": "application/pdf" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_storage_outage_is_an_opaque_500() {
    let app = upload_app(MockStorageService::new_failing()).await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/files/upload",
        app.member,
        Some(json!({ "filename": "notes.pdf", "file_type": "application/pdf" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "INTERNAL_ERROR");
    assert_eq!(body["message"], "An internal error occurred");
}

#[tokio::test]
async fn test_study_doc_must_use_an_issued_key() {
    let app = upload_app(MockStorageService::new()).await;

    // Someone else's prefix.
    let foreign_key = format!("study-docs/{}/stolen.pdf", app.other);
    let (status, _) = send(
        &app.router,
        Method::POST,
        "/study-docs",
        app.member,
        Some(study_doc_payload(&foreign_key)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let escaping_key = format!("study-docs/{}/../{}/x.pdf", app.member, app.other);
    let (status, _) = send(
        &app.router,
        Method::POST,
        "/study-docs",
        app.member,
        Some(study_doc_payload(&escaping_key)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_study_doc_lifecycle_and_ownership() {
    let app = upload_app(MockStorageService::new()).await;

    let (_, upload) = send(
        &app.router,
        Method::POST,
        "/files/upload",
        app.member,
        Some(json!({ "filename": "exam.pdf", "file_type": "application/pdf" })),
    )
    .await;
    let key = upload["resource_key"].as_str().unwrap().to_string();

    let (status, doc) = send(
        &app.router,
        Method::POST,
        "/study-docs",
        app.member,
        Some(study_doc_payload(&key)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(doc["uploader_id"], app.member.to_string());
    let uri = format!("/study-docs/{}", doc["id"].as_str().unwrap());

    let (status, body) = send(
        &app.router,
        Method::PATCH,
        &uri,
        app.other,
        Some(json!({ "name": "Mine now" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "Not the author");

    let (status, doc) = send(
        &app.router,
        Method::PATCH,
        &uri,
        app.member,
        Some(json!({ "year": 2024 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["year"], 2024);

    let (status, _) = send(&app.router, Method::DELETE, &uri, app.other, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Moderators manage study documents regardless of uploader.
    let (status, _) = send(&app.router, Method::DELETE, &uri, app.moderator, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app.router, Method::GET, &uri, app.member, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_study_doc_update_rejects_blank_name_or_subject() {
    let app = upload_app(MockStorageService::new()).await;

    let (_, upload) = send(
        &app.router,
        Method::POST,
        "/files/upload",
        app.member,
        Some(json!({ "filename": "notes.pdf", "file_type": "application/pdf" })),
    )
    .await;
    let key = upload["resource_key"].as_str().unwrap().to_string();
    let (status, doc) = send(
        &app.router,
        Method::POST,
        "/study-docs",
        app.member,
        Some(study_doc_payload(&key)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/study-docs/{}", doc["id"].as_str().unwrap());

    for patch in [json!({ "name": "   " }), json!({ "subject": "" })] {
        let (status, _) = send(&app.router, Method::PATCH, &uri, app.member, Some(patch)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, doc) = send(&app.router, Method::GET, &uri, app.member, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["name"], "Linear Algebra 2023 exam");
    assert_eq!(doc["subject"], "MA4101");
}
