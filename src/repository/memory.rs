use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Repository;
use crate::authorization::SubjectKind;
use crate::models::{
    Badge, Comment, CreateStudyDocRequest, CreateTagRequest, CreateThreadRequest, Post, Reply,
    StudyDoc, Tag, Thread, UpdateBadgeRequest, UpdateStudyDocRequest, UpdateTagRequest,
    UpdateThreadRequest, UpdateUserRequest, User, VoteTally, VoteTarget,
};
use crate::pagination::{ListOptions, Page, SortOrder};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    threads: HashMap<Uuid, Thread>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    replies: HashMap<Uuid, Reply>,
    votes: HashMap<(SubjectKind, Uuid, Uuid), i16>,
    tags: BTreeMap<String, Tag>,
    study_docs: HashMap<Uuid, StudyDoc>,
    badges: HashMap<Uuid, Badge>,
}

impl Tables {
    fn thread_locked(&self, thread_id: Uuid) -> bool {
        self.threads.get(&thread_id).is_some_and(|t| t.locked)
    }

    // Thread flags are derived on read, like the joins of the Postgres queries.
    fn post(&self, id: Uuid) -> Option<Post> {
        self.posts.get(&id).map(|post| Post {
            locked: self.thread_locked(post.thread_id),
            ..post.clone()
        })
    }

    /// `(locked, visible)` of the thread owning `post_id`.
    fn post_thread_flags(&self, post_id: Uuid) -> (bool, bool) {
        self.posts
            .get(&post_id)
            .and_then(|post| self.threads.get(&post.thread_id))
            .map_or((false, false), |thread| (thread.locked, thread.is_visible))
    }

    fn comment(&self, id: Uuid) -> Option<Comment> {
        let comment = self.comments.get(&id)?;
        let (post_locked, thread_visible) = self.post_thread_flags(comment.post_id);
        Some(Comment {
            post_locked,
            thread_visible,
            ..comment.clone()
        })
    }

    fn reply(&self, id: Uuid) -> Option<Reply> {
        let reply = self.replies.get(&id)?;
        let (post_locked, thread_visible) = self
            .comments
            .get(&reply.comment_id)
            .map_or((false, false), |comment| self.post_thread_flags(comment.post_id));
        Some(Reply {
            post_locked,
            thread_visible,
            ..reply.clone()
        })
    }

    fn remove_comment(&mut self, id: Uuid) -> bool {
        if self.comments.remove(&id).is_none() {
            return false;
        }
        self.replies.retain(|_, reply| reply.comment_id != id);
        true
    }

    fn tally(&self, kind: SubjectKind, content_id: Uuid) -> (i32, i32) {
        self.votes
            .iter()
            .filter(|((k, id, _), _)| *k == kind && *id == content_id)
            .fold((0, 0), |(up, down), (_, value)| match value {
                1 => (up + 1, down),
                -1 => (up, down + 1),
                _ => (up, down),
            })
    }
}

/// InMemoryRepository
///
/// A `Repository` held entirely in memory behind a `tokio::sync::RwLock`.
/// It mirrors the observable behavior of [`super::PostgresRepository`] and
/// backs the HTTP tests, so they run without a database.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user; registration itself happens outside this service.
    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id, user);
    }

    pub async fn insert_tag(&self, tag: Tag) {
        self.tables.write().await.tags.insert(tag.name.clone(), tag);
    }

    /// Seeds a badge; badges are only ever edited through the API.
    pub async fn insert_badge(&self, badge: Badge) {
        self.tables.write().await.badges.insert(badge.id, badge);
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.tables.read().await.users.get(&id).cloned()
    }

    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> Option<User> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&id)?;
        if let Some(username) = req.username {
            user.username = username;
        }
        if let Some(avatar) = req.avatar {
            user.avatar = Some(avatar);
        }
        Some(user.clone())
    }

    async fn list_threads(&self, options: &ListOptions, include_hidden: bool) -> Page<Thread> {
        let tables = self.tables.read().await;
        let mut threads: Vec<&Thread> = tables
            .threads
            .values()
            .filter(|t| include_hidden || t.is_visible)
            .filter(|t| options.tag.as_ref().is_none_or(|tag| t.tags.contains(tag)))
            .collect();

        let score = |thread: &Thread| {
            tables
                .posts
                .values()
                .find(|post| post.thread_id == thread.id)
                .map_or(0, |post| post.upvotes - post.downvotes)
        };

        match options.sort() {
            SortOrder::Newest => threads.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::Oldest => threads.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::Popular => threads.sort_by(|a, b| {
                score(b)
                    .cmp(&score(a))
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
        }

        let total = threads.len() as i64;
        let items = threads
            .into_iter()
            .skip(options.offset() as usize)
            .take(options.limit() as usize)
            .cloned()
            .collect();
        Page::new(items, options, total)
    }

    async fn get_thread(&self, id: Uuid) -> Option<Thread> {
        self.tables.read().await.threads.get(&id).cloned()
    }

    async fn get_thread_post(&self, thread_id: Uuid) -> Option<Post> {
        let tables = self.tables.read().await;
        let id = tables
            .posts
            .values()
            .find(|post| post.thread_id == thread_id)?
            .id;
        tables.post(id)
    }

    async fn create_thread(&self, author_id: Uuid, req: CreateThreadRequest) -> Option<(Thread, Post)> {
        let now = Utc::now();
        let thread = Thread {
            id: Uuid::new_v4(),
            author_id,
            title: req.title,
            tags: req.tags,
            kind: req.kind,
            opened: true,
            solved: false,
            locked: false,
            is_visible: true,
            assignees: req.assignees,
            created_at: now,
            updated_at: now,
        };
        let post = Post {
            id: Uuid::new_v4(),
            thread_id: thread.id,
            author_id,
            body: req.body,
            locked: false,
            is_visible: true,
            upvotes: 0,
            downvotes: 0,
            created_at: now,
            updated_at: now,
            content_last_edited_at: None,
        };

        let mut tables = self.tables.write().await;
        tables.threads.insert(thread.id, thread.clone());
        tables.posts.insert(post.id, post.clone());
        Some((thread, post))
    }

    async fn update_thread(&self, id: Uuid, req: UpdateThreadRequest) -> Option<Thread> {
        let mut tables = self.tables.write().await;
        let thread = tables.threads.get_mut(&id)?;
        if let Some(title) = req.title {
            thread.title = title;
        }
        if let Some(tags) = req.tags {
            thread.tags = tags;
        }
        if let Some(kind) = req.kind {
            thread.kind = kind;
        }
        if let Some(opened) = req.opened {
            thread.opened = opened;
        }
        if let Some(solved) = req.solved {
            thread.solved = solved;
        }
        if let Some(assignees) = req.assignees {
            thread.assignees = assignees;
        }
        thread.updated_at = Utc::now();
        Some(thread.clone())
    }

    async fn set_thread_locked(&self, id: Uuid, locked: bool) -> Option<Thread> {
        let mut tables = self.tables.write().await;
        let thread = tables.threads.get_mut(&id)?;
        thread.locked = locked;
        thread.updated_at = Utc::now();
        Some(thread.clone())
    }

    async fn set_thread_visibility(&self, id: Uuid, is_visible: bool) -> Option<Thread> {
        let mut tables = self.tables.write().await;
        let thread = tables.threads.get_mut(&id)?;
        thread.is_visible = is_visible;
        thread.updated_at = Utc::now();
        let thread = thread.clone();

        for post in tables.posts.values_mut().filter(|post| post.thread_id == id) {
            post.is_visible = is_visible;
        }
        Some(thread)
    }

    async fn delete_thread(&self, id: Uuid) -> bool {
        let mut tables = self.tables.write().await;
        if tables.threads.remove(&id).is_none() {
            return false;
        }

        let post_ids: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|post| post.thread_id == id)
            .map(|post| post.id)
            .collect();
        for post_id in post_ids {
            tables.posts.remove(&post_id);
            let comment_ids: Vec<Uuid> = tables
                .comments
                .values()
                .filter(|comment| comment.post_id == post_id)
                .map(|comment| comment.id)
                .collect();
            for comment_id in comment_ids {
                tables.remove_comment(comment_id);
            }
        }
        true
    }

    async fn filter_known_tags(&self, names: &[String]) -> Vec<String> {
        let tables = self.tables.read().await;
        let mut kept: Vec<String> = Vec::new();
        for name in names {
            if tables.tags.contains_key(name) && !kept.contains(name) {
                kept.push(name.clone());
            }
        }
        kept
    }

    async fn get_post(&self, id: Uuid) -> Option<Post> {
        self.tables.read().await.post(id)
    }

    async fn update_post(&self, id: Uuid, body: String) -> Option<Post> {
        let mut tables = self.tables.write().await;
        let post = tables.posts.get_mut(&id)?;
        let now = Utc::now();
        post.body = body;
        post.updated_at = now;
        post.content_last_edited_at = Some(now);
        tables.post(id)
    }

    async fn list_comments(&self, post_id: Uuid) -> Vec<Comment> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .filter_map(|comment| tables.comment(comment.id))
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        comments
    }

    async fn get_comment(&self, id: Uuid) -> Option<Comment> {
        self.tables.read().await.comment(id)
    }

    async fn create_comment(&self, post_id: Uuid, author_id: Uuid, body: String) -> Option<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) {
            return None;
        }

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            body,
            post_locked: false,
            thread_visible: true,
            is_visible: true,
            upvotes: 0,
            downvotes: 0,
            created_at: now,
            updated_at: now,
            content_last_edited_at: None,
        };
        let id = comment.id;
        tables.comments.insert(id, comment);
        tables.comment(id)
    }

    async fn update_comment(&self, id: Uuid, body: String) -> Option<Comment> {
        let mut tables = self.tables.write().await;
        let comment = tables.comments.get_mut(&id)?;
        let now = Utc::now();
        comment.body = body;
        comment.updated_at = now;
        comment.content_last_edited_at = Some(now);
        tables.comment(id)
    }

    async fn delete_comment(&self, id: Uuid) -> bool {
        self.tables.write().await.remove_comment(id)
    }

    async fn list_replies_for_post(&self, post_id: Uuid) -> Vec<Reply> {
        let tables = self.tables.read().await;
        let mut replies: Vec<Reply> = tables
            .replies
            .values()
            .filter(|reply| {
                tables
                    .comments
                    .get(&reply.comment_id)
                    .is_some_and(|comment| comment.post_id == post_id)
            })
            .filter_map(|reply| tables.reply(reply.id))
            .collect();
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        replies
    }

    async fn get_reply(&self, id: Uuid) -> Option<Reply> {
        self.tables.read().await.reply(id)
    }

    async fn create_reply(&self, comment_id: Uuid, author_id: Uuid, body: String) -> Option<Reply> {
        let mut tables = self.tables.write().await;
        if !tables.comments.contains_key(&comment_id) {
            return None;
        }

        let now = Utc::now();
        let reply = Reply {
            id: Uuid::new_v4(),
            comment_id,
            author_id,
            body,
            post_locked: false,
            thread_visible: true,
            is_visible: true,
            upvotes: 0,
            downvotes: 0,
            created_at: now,
            updated_at: now,
            content_last_edited_at: None,
        };
        let id = reply.id;
        tables.replies.insert(id, reply);
        tables.reply(id)
    }

    async fn update_reply(&self, id: Uuid, body: String) -> Option<Reply> {
        let mut tables = self.tables.write().await;
        let reply = tables.replies.get_mut(&id)?;
        let now = Utc::now();
        reply.body = body;
        reply.updated_at = now;
        reply.content_last_edited_at = Some(now);
        tables.reply(id)
    }

    async fn delete_reply(&self, id: Uuid) -> bool {
        self.tables.write().await.replies.remove(&id).is_some()
    }

    async fn vote(&self, target: VoteTarget, user_id: Uuid, value: i16) -> Option<VoteTally> {
        let mut tables = self.tables.write().await;
        let content_id = target.id();
        let exists = match target {
            VoteTarget::Post(id) => tables.posts.contains_key(&id),
            VoteTarget::Comment(id) => tables.comments.contains_key(&id),
            VoteTarget::Reply(id) => tables.replies.contains_key(&id),
        };
        if !exists {
            return None;
        }

        let key = (target.kind(), content_id, user_id);
        if value == 0 {
            tables.votes.remove(&key);
        } else {
            tables.votes.insert(key, value);
        }

        let (upvotes, downvotes) = tables.tally(target.kind(), content_id);
        match target {
            VoteTarget::Post(id) => {
                if let Some(post) = tables.posts.get_mut(&id) {
                    post.upvotes = upvotes;
                    post.downvotes = downvotes;
                }
            }
            VoteTarget::Comment(id) => {
                if let Some(comment) = tables.comments.get_mut(&id) {
                    comment.upvotes = upvotes;
                    comment.downvotes = downvotes;
                }
            }
            VoteTarget::Reply(id) => {
                if let Some(reply) = tables.replies.get_mut(&id) {
                    reply.upvotes = upvotes;
                    reply.downvotes = downvotes;
                }
            }
        }

        Some(VoteTally {
            upvotes,
            downvotes,
            value,
        })
    }

    async fn list_tags(&self) -> Vec<Tag> {
        self.tables.read().await.tags.values().cloned().collect()
    }

    async fn get_tag(&self, name: &str) -> Option<Tag> {
        self.tables.read().await.tags.get(name).cloned()
    }

    async fn create_tag(&self, req: CreateTagRequest) -> Option<Tag> {
        let mut tables = self.tables.write().await;
        if tables.tags.contains_key(&req.name) {
            return None;
        }
        let tag = Tag {
            name: req.name,
            color: req.color,
            description: req.description,
            created_at: Utc::now(),
        };
        tables.tags.insert(tag.name.clone(), tag.clone());
        Some(tag)
    }

    async fn update_tag(&self, name: &str, req: UpdateTagRequest) -> Option<Tag> {
        let mut tables = self.tables.write().await;
        let tag = tables.tags.get_mut(name)?;
        if let Some(color) = req.color {
            tag.color = color;
        }
        if let Some(description) = req.description {
            tag.description = Some(description);
        }
        Some(tag.clone())
    }

    async fn delete_tag(&self, name: &str) -> bool {
        self.tables.write().await.tags.remove(name).is_some()
    }

    async fn get_study_doc(&self, id: Uuid) -> Option<StudyDoc> {
        self.tables.read().await.study_docs.get(&id).cloned()
    }

    async fn create_study_doc(&self, uploader_id: Uuid, req: CreateStudyDocRequest) -> Option<StudyDoc> {
        let now = Utc::now();
        let doc = StudyDoc {
            id: Uuid::new_v4(),
            uploader_id,
            name: req.name,
            description: req.description,
            subject: req.subject,
            doc_series: req.doc_series,
            year: req.year,
            tags: req.tags,
            file_key: req.file_key,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .study_docs
            .insert(doc.id, doc.clone());
        Some(doc)
    }

    async fn update_study_doc(&self, id: Uuid, req: UpdateStudyDocRequest) -> Option<StudyDoc> {
        let mut tables = self.tables.write().await;
        let doc = tables.study_docs.get_mut(&id)?;
        if let Some(name) = req.name {
            doc.name = name;
        }
        if let Some(description) = req.description {
            doc.description = Some(description);
        }
        if let Some(subject) = req.subject {
            doc.subject = subject;
        }
        if let Some(doc_series) = req.doc_series {
            doc.doc_series = Some(doc_series);
        }
        if let Some(year) = req.year {
            doc.year = year;
        }
        if let Some(tags) = req.tags {
            doc.tags = tags;
        }
        doc.updated_at = Utc::now();
        Some(doc.clone())
    }

    async fn delete_study_doc(&self, id: Uuid) -> bool {
        self.tables.write().await.study_docs.remove(&id).is_some()
    }

    async fn list_badges(&self) -> Vec<Badge> {
        let mut badges: Vec<Badge> = self.tables.read().await.badges.values().cloned().collect();
        badges.sort_by(|a, b| a.name.cmp(&b.name));
        badges
    }

    async fn get_badge(&self, id: Uuid) -> Option<Badge> {
        self.tables.read().await.badges.get(&id).cloned()
    }

    async fn update_badge(&self, id: Uuid, req: UpdateBadgeRequest) -> Option<Badge> {
        let mut tables = self.tables.write().await;
        let badge = tables.badges.get_mut(&id)?;
        if let Some(name) = req.name {
            badge.name = name;
        }
        if let Some(description) = req.description {
            badge.description = description;
        }
        if let Some(icon) = req.icon {
            badge.icon = Some(icon);
        }
        Some(badge.clone())
    }
}
