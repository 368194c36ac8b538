use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use campus_forum::{
    AppState, InMemoryRepository,
    auth::AuthUser,
    authorization::{Action, Role, SubjectKind},
    config::AppConfig,
    error::ApiError,
    handlers,
    models::{
        ContentBodyRequest, CreateThreadRequest, ThreadLockRequest, UpdateThreadRequest, User,
        VoteRequest,
    },
    pagination::ListOptions,
    repository::Repository,
    storage::MockStorageService,
};
use std::sync::Arc;
use tokio::test;
use uuid::Uuid;

// --- Test Fixtures ---

struct Fixture {
    state: AppState,
    repo: Arc<InMemoryRepository>,
}

fn fixture() -> Fixture {
    let repo = Arc::new(InMemoryRepository::new());
    let state = AppState {
        repo: repo.clone(),
        storage: Arc::new(MockStorageService::new()),
        config: AppConfig::default(),
    };
    Fixture { state, repo }
}

impl Fixture {
    async fn user(&self, roles: &[Role]) -> AuthUser {
        let id = Uuid::new_v4();
        self.repo
            .insert_user(User {
                id,
                username: format!("user-{}", id.simple()),
                email: format!("{id}@campus.test"),
                roles: roles.to_vec(),
                ..User::default()
            })
            .await;
        AuthUser {
            id,
            roles: roles.to_vec(),
        }
    }

    async fn thread_by(&self, author: &AuthUser) -> (Uuid, Uuid) {
        let (status, Json(details)) = handlers::threads::create_thread(
            author.clone(),
            State(self.state.clone()),
            Json(CreateThreadRequest {
                title: "Where is room B2-014?".to_string(),
                body: "First week, completely lost".to_string(),
                ..CreateThreadRequest::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        (details.thread.id, details.post.id)
    }
}

fn expect_denied(err: ApiError) -> campus_forum::authorization::AuthorizationDenied {
    match err {
        ApiError::Forbidden(denied) => denied,
        other => panic!("expected a denial, got {other:?}"),
    }
}

// --- Thread Handlers ---

#[test]
async fn test_create_thread_rejects_blank_title() {
    let fx = fixture();
    let author = fx.user(&[Role::User]).await;

    let result = handlers::threads::create_thread(
        author,
        State(fx.state.clone()),
        Json(CreateThreadRequest {
            title: "   ".to_string(),
            body: "body".to_string(),
            ..CreateThreadRequest::default()
        }),
    )
    .await;

    assert!(matches!(result, Err(ApiError::BadRequest(_))));
    let page = fx.repo.list_threads(&ListOptions::default(), true).await;
    assert_eq!(page.total, 0);
}

#[test]
async fn test_update_thread_denial_leaves_thread_untouched() {
    let fx = fixture();
    let author = fx.user(&[Role::User]).await;
    let stranger = fx.user(&[Role::User]).await;
    let (thread_id, _) = fx.thread_by(&author).await;

    let err = handlers::threads::update_thread(
        stranger,
        State(fx.state.clone()),
        Path(thread_id),
        Json(UpdateThreadRequest {
            title: Some("Hijacked".to_string()),
            ..UpdateThreadRequest::default()
        }),
    )
    .await
    .unwrap_err();

    let denied = expect_denied(err);
    assert_eq!(denied.action, Action::Update);
    assert_eq!(denied.subject_kind, SubjectKind::Thread);
    assert_eq!(denied.field.as_deref(), Some("title"));
    assert_eq!(denied.reason.as_deref(), Some("Not the author"));

    let thread = fx.repo.get_thread(thread_id).await.unwrap();
    assert_eq!(thread.title, "Where is room B2-014?");
}

#[test]
async fn test_author_cannot_lock_own_thread() {
    let fx = fixture();
    let author = fx.user(&[Role::User]).await;
    let (thread_id, _) = fx.thread_by(&author).await;

    let err = handlers::threads::set_thread_lock(
        author,
        State(fx.state.clone()),
        Path(thread_id),
        Json(ThreadLockRequest { locked: true }),
    )
    .await
    .unwrap_err();

    // The author rule lists its fields; `locked` is not among them.
    assert_eq!(expect_denied(err).field.as_deref(), Some("locked"));
    assert!(!fx.repo.get_thread(thread_id).await.unwrap().locked);
}

#[test]
async fn test_lock_propagates_to_post_and_comments() {
    let fx = fixture();
    let author = fx.user(&[Role::User]).await;
    let moderator = fx.user(&[Role::Moderator]).await;
    let (thread_id, post_id) = fx.thread_by(&author).await;

    let (_, Json(comment)) = handlers::contents::create_comment(
        author.clone(),
        State(fx.state.clone()),
        Path(post_id),
        Json(ContentBodyRequest {
            body: "Found it, second floor".to_string(),
        }),
    )
    .await
    .unwrap();

    let Json(thread) = handlers::threads::set_thread_lock(
        moderator,
        State(fx.state.clone()),
        Path(thread_id),
        Json(ThreadLockRequest { locked: true }),
    )
    .await
    .unwrap();
    assert!(thread.locked);

    assert!(fx.repo.get_post(post_id).await.unwrap().locked);
    assert!(fx.repo.get_comment(comment.id).await.unwrap().post_locked);

    let err = handlers::contents::update_comment(
        author,
        State(fx.state.clone()),
        Path(comment.id),
        Json(ContentBodyRequest {
            body: "edit".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(expect_denied(err).reason.as_deref(), Some("Post is locked"));
}

#[test]
async fn test_list_threads_hides_hidden_threads_from_members() {
    let fx = fixture();
    let author = fx.user(&[Role::User]).await;
    let admin = fx.user(&[Role::Admin]).await;
    let (thread_id, _) = fx.thread_by(&author).await;
    fx.thread_by(&author).await;
    fx.repo.set_thread_visibility(thread_id, false).await.unwrap();

    let Json(page) = handlers::threads::list_threads(
        Some(author),
        State(fx.state.clone()),
        Query(ListOptions::default()),
    )
    .await;
    assert_eq!(page.total, 1);

    let Json(page) = handlers::threads::list_threads(
        Some(admin),
        State(fx.state.clone()),
        Query(ListOptions::default()),
    )
    .await;
    assert_eq!(page.total, 2);
}

#[test]
async fn test_get_thread_missing_is_not_found() {
    let fx = fixture();

    let response = handlers::threads::get_thread(None, State(fx.state.clone()), Path(Uuid::new_v4()))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// --- Content Handlers ---

#[test]
async fn test_delete_post_is_refused_and_thread_survives() {
    let fx = fixture();
    let admin = fx.user(&[Role::Admin]).await;
    let (thread_id, post_id) = fx.thread_by(&admin).await;

    let err = handlers::contents::delete_post(admin, State(fx.state.clone()), Path(post_id))
        .await
        .unwrap_err();

    let denied = expect_denied(err);
    assert_eq!(denied.subject_kind, SubjectKind::Post);
    assert_eq!(
        denied.reason.as_deref(),
        Some("Posts are deleted through their thread")
    );
    assert!(fx.repo.get_thread(thread_id).await.is_some());
}

#[test]
async fn test_vote_out_of_range_never_reaches_repository() {
    let fx = fixture();
    let author = fx.user(&[Role::User]).await;
    let voter = fx.user(&[Role::User]).await;
    let (_, post_id) = fx.thread_by(&author).await;

    let result = handlers::contents::vote_post(
        voter.clone(),
        State(fx.state.clone()),
        Path(post_id),
        Json(VoteRequest { value: -2 }),
    )
    .await;
    assert!(matches!(result, Err(ApiError::BadRequest(_))));

    let Json(tally) = handlers::contents::vote_post(
        voter,
        State(fx.state.clone()),
        Path(post_id),
        Json(VoteRequest { value: -1 }),
    )
    .await
    .unwrap();
    assert_eq!((tally.upvotes, tally.downvotes, tally.value), (0, 1, -1));
}

#[test]
async fn test_reply_to_missing_comment_is_not_found() {
    let fx = fixture();
    let member = fx.user(&[Role::User]).await;

    let result = handlers::contents::create_reply(
        member,
        State(fx.state.clone()),
        Path(Uuid::new_v4()),
        Json(ContentBodyRequest {
            body: "hello".to_string(),
        }),
    )
    .await;
    assert!(matches!(result, Err(ApiError::NotFound)));
}

// --- User Handlers ---

#[test]
async fn test_abilities_mirror_role_rules() {
    let fx = fixture();
    let member = fx.user(&[Role::User]).await;
    let moderator = fx.user(&[Role::Moderator]).await;

    let Json(member_rules) = handlers::users::get_my_abilities(member).await;
    let Json(moderator_rules) = handlers::users::get_my_abilities(moderator).await;

    assert!(
        member_rules
            .iter()
            .any(|rule| rule.reason.as_deref() == Some("Post is locked"))
    );
    assert!(
        moderator_rules
            .iter()
            .all(|rule| rule.reason.as_deref() != Some("Post is locked"))
    );
    assert!(moderator_rules.iter().any(|rule| {
        rule.effect == "forbid" && rule.subjects == vec!["badge".to_string()]
    }));
}
