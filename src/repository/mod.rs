use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    Badge, Comment, CreateStudyDocRequest, CreateTagRequest, CreateThreadRequest, Post, Reply,
    StudyDoc, Tag, Thread, UpdateBadgeRequest, UpdateStudyDocRequest, UpdateTagRequest,
    UpdateThreadRequest, UpdateUserRequest, User, VoteTally, VoteTarget,
};
use crate::pagination::{ListOptions, Page};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// Repository Trait
///
/// Persistence contract consumed by the handlers. Implementations perform no
/// authorization: handlers load the subject, run the policy check and only
/// then call a mutating method.
///
/// Lookups return `None`/empty on absence or database failure (failures are
/// logged); mutations return the fresh row, or `false`/`None` when nothing
/// was affected.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> Option<User>;

    // --- Threads ---
    /// Visible threads only unless `include_hidden` (the visibility gate).
    async fn list_threads(&self, options: &ListOptions, include_hidden: bool) -> Page<Thread>;
    async fn get_thread(&self, id: Uuid) -> Option<Thread>;
    async fn get_thread_post(&self, thread_id: Uuid) -> Option<Post>;
    /// Creates the thread and its opening post atomically.
    async fn create_thread(&self, author_id: Uuid, req: CreateThreadRequest) -> Option<(Thread, Post)>;
    async fn update_thread(&self, id: Uuid, req: UpdateThreadRequest) -> Option<Thread>;
    async fn set_thread_locked(&self, id: Uuid, locked: bool) -> Option<Thread>;
    async fn set_thread_visibility(&self, id: Uuid, is_visible: bool) -> Option<Thread>;
    /// Removes the thread with its post, comments and replies.
    async fn delete_thread(&self, id: Uuid) -> bool;
    /// Keeps the names that exist as tags, in the requested order.
    async fn filter_known_tags(&self, names: &[String]) -> Vec<String>;

    // --- Posts, comments & replies ---
    async fn get_post(&self, id: Uuid) -> Option<Post>;
    /// Also stamps `content_last_edited_at`.
    async fn update_post(&self, id: Uuid, body: String) -> Option<Post>;
    async fn list_comments(&self, post_id: Uuid) -> Vec<Comment>;
    async fn get_comment(&self, id: Uuid) -> Option<Comment>;
    async fn create_comment(&self, post_id: Uuid, author_id: Uuid, body: String) -> Option<Comment>;
    async fn update_comment(&self, id: Uuid, body: String) -> Option<Comment>;
    async fn delete_comment(&self, id: Uuid) -> bool;
    /// Every reply under every comment of a post, oldest first.
    async fn list_replies_for_post(&self, post_id: Uuid) -> Vec<Reply>;
    async fn get_reply(&self, id: Uuid) -> Option<Reply>;
    async fn create_reply(&self, comment_id: Uuid, author_id: Uuid, body: String) -> Option<Reply>;
    async fn update_reply(&self, id: Uuid, body: String) -> Option<Reply>;
    async fn delete_reply(&self, id: Uuid) -> bool;
    /// One vote per user per content; `value == 0` withdraws it.
    async fn vote(&self, target: VoteTarget, user_id: Uuid, value: i16) -> Option<VoteTally>;

    // --- Tags ---
    async fn list_tags(&self) -> Vec<Tag>;
    async fn get_tag(&self, name: &str) -> Option<Tag>;
    /// `None` if the name is taken.
    async fn create_tag(&self, req: CreateTagRequest) -> Option<Tag>;
    async fn update_tag(&self, name: &str, req: UpdateTagRequest) -> Option<Tag>;
    async fn delete_tag(&self, name: &str) -> bool;

    // --- Study documents ---
    async fn get_study_doc(&self, id: Uuid) -> Option<StudyDoc>;
    async fn create_study_doc(&self, uploader_id: Uuid, req: CreateStudyDocRequest) -> Option<StudyDoc>;
    async fn update_study_doc(&self, id: Uuid, req: UpdateStudyDocRequest) -> Option<StudyDoc>;
    async fn delete_study_doc(&self, id: Uuid) -> bool;

    // --- Badges ---
    async fn list_badges(&self) -> Vec<Badge>;
    async fn get_badge(&self, id: Uuid) -> Option<Badge>;
    async fn update_badge(&self, id: Uuid, req: UpdateBadgeRequest) -> Option<Badge>;
}

/// RepositoryState
///
/// The shared handle stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;
