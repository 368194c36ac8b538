//! PostgresRepository against a live database. Run with
//! `DATABASE_URL=... cargo test -- --ignored`.

use campus_forum::{
    models::{
        CreateStudyDocRequest, CreateTagRequest, CreateThreadRequest, UpdateThreadRequest,
        UpdateUserRequest, VoteTarget,
    },
    pagination::ListOptions,
    repository::{PostgresRepository, Repository},
};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }

    async fn create_user(&self, roles: &[&str]) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, username, email, roles) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(format!("user-{}", id.simple()))
            .bind(format!("{}@campus.test", id.simple()))
            .bind(roles.iter().map(|role| role.to_string()).collect::<Vec<_>>())
            .execute(&self.pool)
            .await
            .expect("Failed to create test user");
        id
    }

    async fn create_tag(&self) -> String {
        let name = format!("t-{}", Uuid::new_v4().simple());
        self.repository()
            .create_tag(CreateTagRequest {
                name: name.clone(),
                color: "00ff00".to_string(),
                description: None,
            })
            .await
            .expect("Failed to create test tag");
        name
    }
}

fn thread_request(title: &str, tags: Vec<String>) -> CreateThreadRequest {
    CreateThreadRequest {
        title: title.to_string(),
        body: "Opening post".to_string(),
        tags,
        ..CreateThreadRequest::default()
    }
}

// --- Tests ---

#[test]
#[ignore = "requires a running Postgres instance"]
async fn test_user_roles_round_trip() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let id = ctx.create_user(&["user", "moderator", "unknown-role"]).await;

    let user = repo.get_user(id).await.unwrap();
    assert_eq!(
        user.roles,
        vec![
            campus_forum::authorization::Role::User,
            campus_forum::authorization::Role::Moderator
        ]
    );

    let updated = repo
        .update_user(
            id,
            UpdateUserRequest {
                avatar: Some("avatars/me.png".to_string()),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.avatar.as_deref(), Some("avatars/me.png"));
    assert_eq!(updated.username, user.username);
}

#[test]
#[ignore = "requires a running Postgres instance"]
async fn test_thread_creation_and_tag_filtering() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = ctx.create_user(&["user"]).await;
    let tag = ctx.create_tag().await;

    let known = repo
        .filter_known_tags(&["missing".to_string(), tag.clone()])
        .await;
    assert_eq!(known, vec![tag.clone()]);

    let (thread, post) = repo
        .create_thread(author, thread_request("Tagged", known))
        .await
        .unwrap();
    assert_eq!(post.thread_id, thread.id);
    assert_eq!(repo.get_thread_post(thread.id).await.unwrap().id, post.id);

    let options = ListOptions {
        tag: Some(tag),
        ..ListOptions::default()
    };
    let page = repo.list_threads(&options, false).await;
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, thread.id);
}

#[test]
#[ignore = "requires a running Postgres instance"]
async fn test_lock_is_visible_through_joins() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = ctx.create_user(&["user"]).await;

    let (thread, post) = repo
        .create_thread(author, thread_request("Lock me", vec![]))
        .await
        .unwrap();
    let comment = repo
        .create_comment(post.id, author, "comment".to_string())
        .await
        .unwrap();
    let reply = repo
        .create_reply(comment.id, author, "reply".to_string())
        .await
        .unwrap();
    assert!(!reply.post_locked);

    assert!(repo.set_thread_locked(thread.id, true).await.unwrap().locked);
    assert!(repo.get_post(post.id).await.unwrap().locked);
    assert!(repo.get_comment(comment.id).await.unwrap().post_locked);
    assert!(repo.get_reply(reply.id).await.unwrap().post_locked);
}

#[test]
#[ignore = "requires a running Postgres instance"]
async fn test_hiding_a_thread_hides_its_post() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = ctx.create_user(&["user"]).await;
    let tag = ctx.create_tag().await;

    let (thread, post) = repo
        .create_thread(author, thread_request("Hide me", vec![tag.clone()]))
        .await
        .unwrap();
    repo.set_thread_visibility(thread.id, false).await.unwrap();

    assert!(!repo.get_post(post.id).await.unwrap().is_visible);

    let options = ListOptions {
        tag: Some(tag),
        ..ListOptions::default()
    };
    assert_eq!(repo.list_threads(&options, false).await.total, 0);
    assert_eq!(repo.list_threads(&options, true).await.total, 1);
}

#[test]
#[ignore = "requires a running Postgres instance"]
async fn test_votes_recount_counters() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = ctx.create_user(&["user"]).await;
    let voter = ctx.create_user(&["user"]).await;

    let (_, post) = repo
        .create_thread(author, thread_request("Vote", vec![]))
        .await
        .unwrap();
    let target = VoteTarget::Post(post.id);

    repo.vote(target, author, 1).await.unwrap();
    let tally = repo.vote(target, voter, -1).await.unwrap();
    assert_eq!((tally.upvotes, tally.downvotes), (1, 1));

    // Changing a vote replaces it.
    let tally = repo.vote(target, voter, 1).await.unwrap();
    assert_eq!((tally.upvotes, tally.downvotes), (2, 0));

    let tally = repo.vote(target, voter, 0).await.unwrap();
    assert_eq!((tally.upvotes, tally.downvotes), (1, 0));

    assert!(repo.vote(VoteTarget::Comment(Uuid::new_v4()), voter, 1).await.is_none());
}

#[test]
#[ignore = "requires a running Postgres instance"]
async fn test_update_and_delete_thread() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = ctx.create_user(&["user"]).await;

    let (thread, post) = repo
        .create_thread(author, thread_request("Before", vec![]))
        .await
        .unwrap();
    let comment = repo
        .create_comment(post.id, author, "soon gone".to_string())
        .await
        .unwrap();

    let updated = repo
        .update_thread(
            thread.id,
            UpdateThreadRequest {
                title: Some("After".to_string()),
                solved: Some(true),
                ..UpdateThreadRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "After");
    assert!(updated.solved);
    assert!(updated.opened);

    assert!(repo.delete_thread(thread.id).await);
    assert!(repo.get_post(post.id).await.is_none());
    assert!(repo.get_comment(comment.id).await.is_none());
    assert!(!repo.delete_thread(thread.id).await);
}

#[test]
#[ignore = "requires a running Postgres instance"]
async fn test_duplicate_tag_and_study_doc() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let uploader = ctx.create_user(&["user"]).await;
    let tag = ctx.create_tag().await;

    let duplicate = repo
        .create_tag(CreateTagRequest {
            name: tag.clone(),
            color: "fff".to_string(),
            description: None,
        })
        .await;
    assert!(duplicate.is_none());

    let doc = repo
        .create_study_doc(
            uploader,
            CreateStudyDocRequest {
                name: "Past paper".to_string(),
                description: None,
                subject: "CS4004".to_string(),
                doc_series: None,
                year: 2021,
                tags: vec![tag],
                file_key: format!("study-docs/{uploader}/{}.pdf", Uuid::new_v4()),
            },
        )
        .await
        .unwrap();
    assert_eq!(repo.get_study_doc(doc.id).await.unwrap().uploader_id, uploader);
    assert!(repo.delete_study_doc(doc.id).await);
    assert!(repo.get_study_doc(doc.id).await.is_none());
}
