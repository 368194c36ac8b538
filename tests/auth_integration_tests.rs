use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use campus_forum::{
    AppState, InMemoryRepository,
    auth::{AuthUser, Claims},
    authorization::Role,
    config::{AppConfig, Env},
    models::User,
    storage::MockStorageService,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn create_token(user_id: Uuid, exp_offset: i64, secret: &str) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

async fn seeded_repo(roles: &[Role]) -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.insert_user(User {
        id: TEST_USER_ID,
        username: "tester".to_string(),
        email: "test@example.com".to_string(),
        roles: roles.to_vec(),
        ..User::default()
    })
    .await;
    repo
}

fn create_app_state(env: Env, repo: InMemoryRepository, jwt_secret: String) -> AppState {
    let mut config = AppConfig::default();
    config.env = env.clone();
    config.jwt_secret = jwt_secret;

    if env == Env::Production {
        config.s3_endpoint = "http://mock-prod-storage".to_string();
        config.s3_key = "prod_key_stub".to_string();
        config.s3_secret = "prod_secret_stub".to_string();
    }

    AppState {
        repo: Arc::new(repo),
        storage: Arc::new(MockStorageService::new()),
        config,
    }
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(parts: &mut Parts, token: &str) {
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
}

fn with_local_user(parts: &mut Parts, id: Uuid) {
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&id.to_string()).unwrap(),
    );
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let token = create_token(TEST_USER_ID, 3600, TEST_JWT_SECRET);
    let repo = seeded_repo(&[Role::User, Role::Moderator]).await;
    let app_state = create_app_state(Env::Production, repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let user = <AuthUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();
    assert_eq!(user.id, TEST_USER_ID);
    // Roles come from the stored user, not from the token.
    assert_eq!(user.roles, vec![Role::User, Role::Moderator]);
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let repo = seeded_repo(&[Role::User]).await;
    let app_state = create_app_state(Env::Production, repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    let auth_user = <AuthUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    // Well past the validator's default leeway.
    let token = create_token(TEST_USER_ID, -3600, TEST_JWT_SECRET);
    let repo = seeded_repo(&[Role::User]).await;
    let app_state = create_app_state(Env::Production, repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let auth_user = <AuthUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_foreign_signature() {
    let token = create_token(TEST_USER_ID, 3600, "some-other-secret");
    let repo = seeded_repo(&[Role::User]).await;
    let app_state = create_app_state(Env::Production, repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let auth_user = <AuthUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_for_deleted_user() {
    let token = create_token(Uuid::new_v4(), 3600, TEST_JWT_SECRET);
    let repo = seeded_repo(&[Role::User]).await;
    let app_state = create_app_state(Env::Production, repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let auth_user = <AuthUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_local_bypass_success() {
    let repo = seeded_repo(&[Role::Admin]).await;
    let app_state = create_app_state(Env::Local, repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_local_user(&mut parts, TEST_USER_ID);

    let user = <AuthUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();
    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.roles, vec![Role::Admin]);
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let repo = seeded_repo(&[Role::Admin]).await;
    let app_state = create_app_state(Env::Production, repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_local_user(&mut parts, TEST_USER_ID);

    let auth_user = <AuthUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_optional_extractor_yields_guest_without_credentials() {
    let repo = seeded_repo(&[Role::User]).await;
    let app_state = create_app_state(Env::Production, repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/threads".parse().unwrap());
    let viewer =
        <AuthUser as OptionalFromRequestParts<AppState>>::from_request_parts(&mut parts, &app_state)
            .await
            .unwrap();
    assert!(viewer.is_none());
}

#[tokio::test]
async fn test_optional_extractor_rejects_bad_credentials() {
    let repo = seeded_repo(&[Role::User]).await;
    let app_state = create_app_state(Env::Production, repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/threads".parse().unwrap());
    with_bearer(&mut parts, "not-a-jwt");

    let viewer =
        <AuthUser as OptionalFromRequestParts<AppState>>::from_request_parts(&mut parts, &app_state)
            .await;
    assert_eq!(viewer.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_optional_extractor_resolves_valid_token() {
    let token = create_token(TEST_USER_ID, 3600, TEST_JWT_SECRET);
    let repo = seeded_repo(&[Role::User]).await;
    let app_state = create_app_state(Env::Production, repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/threads".parse().unwrap());
    with_bearer(&mut parts, &token);

    let viewer =
        <AuthUser as OptionalFromRequestParts<AppState>>::from_request_parts(&mut parts, &app_state)
            .await
            .unwrap();
    assert_eq!(viewer.map(|user| user.id), Some(TEST_USER_ID));
}
