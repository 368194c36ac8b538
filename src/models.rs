use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authorization::{
    Principal, Role, Rule, Subject, SubjectAttributes, SubjectKind, SubjectScope,
};

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A member profile. The role set is read once per request by the `AuthUser`
/// extractor and drives the ability builder.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[ts(as = "Vec<String>")]
    #[schema(value_type = Vec<String>)]
    pub roles: Vec<Role>,
    pub reputation: i32,
    pub avatar: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// UserRow
///
/// Raw `users` row. Roles are stored as `TEXT[]` and parsed into [`Role`]s;
/// unknown role names are dropped with a warning.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub reputation: i32,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let roles = row
            .roles
            .iter()
            .filter_map(|name| match name.parse::<Role>() {
                Ok(role) => Some(role),
                Err(()) => {
                    tracing::warn!(user_id = %row.id, role = %name, "ignoring unknown role");
                    None
                }
            })
            .collect();

        User {
            id: row.id,
            username: row.username,
            email: row.email,
            roles,
            reputation: row.reputation,
            avatar: row.avatar,
            created_at: row.created_at,
        }
    }
}

impl Principal for User {
    fn principal_id(&self) -> Uuid {
        self.id
    }

    fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl Subject for User {
    fn attributes(&self) -> SubjectAttributes {
        SubjectAttributes::of_kind(SubjectKind::User).owned_by(self.id)
    }
}

/// Thread
///
/// The container of a discussion. Its opening [`Post`] carries the body; the
/// thread carries the title, classification and the moderation flags.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Thread {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub tags: Vec<String>,
    /// Question, suggestion, problem, opinion or discussion.
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: i16,
    pub opened: bool,
    pub solved: bool,
    pub locked: bool,
    pub is_visible: bool,
    pub assignees: Vec<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Subject for Thread {
    fn attributes(&self) -> SubjectAttributes {
        SubjectAttributes::of_kind(SubjectKind::Thread)
            .owned_by(self.author_id)
            .locked(self.locked)
            .visible(self.is_visible)
    }
}

/// Post
///
/// The opening content of a thread. `locked` mirrors the thread's lock.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub locked: bool,
    pub is_visible: bool,
    pub upvotes: i32,
    pub downvotes: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub content_last_edited_at: Option<DateTime<Utc>>,
}

impl Subject for Post {
    fn attributes(&self) -> SubjectAttributes {
        SubjectAttributes::of_kind(SubjectKind::Post)
            .owned_by(self.author_id)
            .locked(self.locked)
            .parent_locked(self.locked)
            .visible(self.is_visible)
    }
}

/// Comment
///
/// A top-level answer under a post. `post_locked` and `thread_visible` are
/// loaded via joins, so hiding or locking a thread reaches its discussion.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub post_locked: bool,
    pub thread_visible: bool,
    pub is_visible: bool,
    pub upvotes: i32,
    pub downvotes: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub content_last_edited_at: Option<DateTime<Utc>>,
}

impl Subject for Comment {
    fn attributes(&self) -> SubjectAttributes {
        SubjectAttributes::of_kind(SubjectKind::Comment)
            .owned_by(self.author_id)
            .parent_locked(self.post_locked)
            .visible(self.is_visible && self.thread_visible)
    }
}

/// Reply
///
/// An answer to a comment. Carries the same joined thread flags as
/// [`Comment`].
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Reply {
    pub id: Uuid,
    pub comment_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub post_locked: bool,
    pub thread_visible: bool,
    pub is_visible: bool,
    pub upvotes: i32,
    pub downvotes: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub content_last_edited_at: Option<DateTime<Utc>>,
}

impl Subject for Reply {
    fn attributes(&self) -> SubjectAttributes {
        SubjectAttributes::of_kind(SubjectKind::Reply)
            .owned_by(self.author_id)
            .parent_locked(self.post_locked)
            .visible(self.is_visible && self.thread_visible)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Tag {
    pub name: String,
    /// Hex color without the leading `#`.
    pub color: String,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Subject for Tag {
    fn attributes(&self) -> SubjectAttributes {
        SubjectAttributes::of_kind(SubjectKind::Tag)
    }
}

/// StudyDoc
///
/// Course material uploaded by a member. `file_key` is the object key
/// returned by the presigned upload flow.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct StudyDoc {
    pub id: Uuid,
    pub uploader_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub subject: String,
    pub doc_series: Option<String>,
    pub year: i32,
    pub tags: Vec<String>,
    pub file_key: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Subject for StudyDoc {
    fn attributes(&self) -> SubjectAttributes {
        SubjectAttributes::of_kind(SubjectKind::StudyDoc).owned_by(self.uploader_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Badge {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
}

impl Subject for Badge {
    fn attributes(&self) -> SubjectAttributes {
        SubjectAttributes::of_kind(SubjectKind::Badge)
    }
}

// --- Composite Output Schemas ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CommentWithReplies {
    pub comment: Comment,
    pub replies: Vec<Reply>,
}

/// ThreadDetails
///
/// A thread with its opening post and the discussion below it, filtered to
/// what the viewer is allowed to read.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ThreadDetails {
    pub thread: Thread,
    pub post: Post,
    pub comments: Vec<CommentWithReplies>,
}

/// VoteTally
///
/// Counters of a voted content after the caller's vote was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct VoteTally {
    pub upvotes: i32,
    pub downvotes: i32,
    /// The caller's current vote: -1, 0 or 1.
    pub value: i16,
}

/// VoteTarget
///
/// The content kinds that accept votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteTarget {
    Post(Uuid),
    Comment(Uuid),
    Reply(Uuid),
}

impl VoteTarget {
    pub fn id(self) -> Uuid {
        match self {
            VoteTarget::Post(id) | VoteTarget::Comment(id) | VoteTarget::Reply(id) => id,
        }
    }

    /// Discriminator stored in `votes.content_kind`.
    pub fn kind(self) -> SubjectKind {
        match self {
            VoteTarget::Post(_) => SubjectKind::Post,
            VoteTarget::Comment(_) => SubjectKind::Comment,
            VoteTarget::Reply(_) => SubjectKind::Reply,
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            VoteTarget::Post(_) => "posts",
            VoteTarget::Comment(_) => "comments",
            VoteTarget::Reply(_) => "replies",
        }
    }
}

/// UserProfile
///
/// Output schema for the authenticated user's profile (GET /me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub user: User,
    pub can_see_hidden_content: bool,
}

/// RuleResponse
///
/// Flattened [`Rule`] sent to clients so they can mirror the server's
/// decisions when rendering controls.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RuleResponse {
    pub effect: String,
    pub actions: Vec<String>,
    /// Subject kinds, or `["all"]`.
    pub subjects: Vec<String>,
    pub fields: Option<Vec<String>>,
    pub condition: Option<String>,
    pub reason: Option<String>,
}

impl From<&Rule> for RuleResponse {
    fn from(rule: &Rule) -> Self {
        let subjects = match &rule.subjects {
            SubjectScope::All => vec!["all".to_string()],
            SubjectScope::Kinds(kinds) => kinds.iter().map(|kind| kind.to_string()).collect(),
        };

        RuleResponse {
            effect: rule.effect.as_str().to_string(),
            actions: rule.actions.iter().map(|action| action.to_string()).collect(),
            subjects,
            fields: rule.fields.clone(),
            condition: rule.condition.map(|condition| condition.as_str().to_string()),
            reason: rule.reason.clone(),
        }
    }
}

// --- Request Payloads (Input Schemas) ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UpdateUserRequest {
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.username.is_some() {
            fields.push("username");
        }
        if self.avatar.is_some() {
            fields.push("avatar");
        }
        fields
    }
}

/// CreateThreadRequest
///
/// Creates a thread together with its opening post. Unknown tag names are
/// dropped; the order of the remaining tags is kept.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateThreadRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "type", default)]
    pub kind: i16,
    #[serde(default)]
    pub assignees: Vec<Uuid>,
}

/// UpdateThreadRequest
///
/// Partial update; only `Some` fields are written and checked.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateThreadRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<Uuid>>,
}

impl UpdateThreadRequest {
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.tags.is_some() {
            fields.push("tags");
        }
        if self.kind.is_some() {
            fields.push("type");
        }
        if self.opened.is_some() {
            fields.push("opened");
        }
        if self.solved.is_some() {
            fields.push("solved");
        }
        if self.assignees.is_some() {
            fields.push("assignees");
        }
        fields
    }
}

/// ThreadLockRequest
///
/// Moderation payload for PUT /threads/{id}/lock. Checked as an update of
/// the `locked` field.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ThreadLockRequest {
    pub locked: bool,
}

/// ThreadVisibilityRequest
///
/// Moderation payload for PUT /threads/{id}/visibility. Checked as an update
/// of the `is_visible` field.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ThreadVisibilityRequest {
    pub is_visible: bool,
}

/// ContentBodyRequest
///
/// Body of a new comment or reply, and the only editable field of posts,
/// comments and replies.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContentBodyRequest {
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct VoteRequest {
    /// 1 for an upvote, -1 for a downvote, 0 to withdraw the vote.
    pub value: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateTagRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateTagRequest {
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.color.is_some() {
            fields.push("color");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        fields
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateStudyDocRequest {
    pub name: String,
    pub description: Option<String>,
    pub subject: String,
    pub doc_series: Option<String>,
    pub year: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub file_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateStudyDocRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl UpdateStudyDocRequest {
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.subject.is_some() {
            fields.push("subject");
        }
        if self.doc_series.is_some() {
            fields.push("doc_series");
        }
        if self.year.is_some() {
            fields.push("year");
        }
        if self.tags.is_some() {
            fields.push("tags");
        }
        fields
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateBadgeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl UpdateBadgeRequest {
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.icon.is_some() {
            fields.push("icon");
        }
        fields
    }
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived upload URL for a study document.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "algebra_exam_2023.pdf")]
    pub filename: String,
    /// The MIME type the upload is constrained to.
    #[schema(example = "application/pdf")]
    pub file_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    pub upload_url: String,
    /// Object key to send back as `file_key` when creating the study doc.
    pub resource_key: String,
}
