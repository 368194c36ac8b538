use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use uuid::Uuid;

use super::Repository;
use crate::models::{
    Badge, Comment, CreateStudyDocRequest, CreateTagRequest, CreateThreadRequest, Post, Reply,
    StudyDoc, Tag, Thread, UpdateBadgeRequest, UpdateStudyDocRequest, UpdateTagRequest,
    UpdateThreadRequest, UpdateUserRequest, User, UserRow, VoteTally, VoteTarget,
};
use crate::pagination::{ListOptions, Page, SortOrder};

const USER_COLUMNS: &str = "id, username, email, roles, reputation, avatar, created_at";

const THREAD_COLUMNS: &str = "t.id, t.author_id, t.title, t.tags, t.type, t.opened, t.solved, \
     t.locked, t.is_visible, t.assignees, t.created_at, t.updated_at";

// `locked` on posts, comments and replies is always the owning thread's lock.
const POST_SELECT: &str = r#"
    SELECT p.id, p.thread_id, p.author_id, p.body, t.locked, p.is_visible,
           p.upvotes, p.downvotes, p.created_at, p.updated_at, p.content_last_edited_at
    FROM posts p
    JOIN threads t ON t.id = p.thread_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.author_id, c.body, t.locked AS post_locked,
           t.is_visible AS thread_visible, c.is_visible,
           c.upvotes, c.downvotes, c.created_at, c.updated_at, c.content_last_edited_at
    FROM comments c
    JOIN posts p ON p.id = c.post_id
    JOIN threads t ON t.id = p.thread_id
"#;

const REPLY_SELECT: &str = r#"
    SELECT r.id, r.comment_id, r.author_id, r.body, t.locked AS post_locked,
           t.is_visible AS thread_visible, r.is_visible,
           r.upvotes, r.downvotes, r.created_at, r.updated_at, r.content_last_edited_at
    FROM replies r
    JOIN comments c ON c.id = r.comment_id
    JOIN posts p ON p.id = c.post_id
    JOIN threads t ON t.id = p.thread_id
"#;

const STUDY_DOC_COLUMNS: &str = "id, uploader_id, name, description, subject, doc_series, year, \
     tags, file_key, created_at, updated_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Queries are built at runtime so the crate compiles without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn get_thread_by(&self, id: Uuid) -> Option<Thread> {
        sqlx::query_as::<_, Thread>(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads t WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_thread error: {:?}", e);
            None
        })
    }

    async fn execute_affecting(&self, label: &str, sql: &str, id: Uuid) -> bool {
        match sqlx::query(sql).bind(id).execute(&self.pool).await {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("{} error: {:?}", label, e);
                false
            }
        }
    }
}

fn push_thread_filters(
    builder: &mut QueryBuilder<'_, sqlx::Postgres>,
    options: &ListOptions,
    include_hidden: bool,
) {
    builder.push(" WHERE TRUE");
    if !include_hidden {
        builder.push(" AND t.is_visible = true");
    }
    if let Some(tag) = &options.tag {
        builder.push(" AND ");
        builder.push_bind(tag.clone());
        builder.push(" = ANY(t.tags)");
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
            .map(User::from)
    }

    /// update_user
    ///
    /// Partial update via `COALESCE`: only `Some` fields overwrite a column.
    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> Option<User> {
        sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                avatar = COALESCE($3, avatar)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.username)
        .bind(req.avatar)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_user error: {:?}", e);
            None
        })
        .map(User::from)
    }

    // --- THREADS ---

    /// list_threads
    ///
    /// Filtering, ordering and paging are assembled with `QueryBuilder` so every
    /// user-provided value is bound, never interpolated.
    async fn list_threads(&self, options: &ListOptions, include_hidden: bool) -> Page<Thread> {
        let mut count: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM threads t");
        push_thread_filters(&mut count, options, include_hidden);

        let total = match count.build_query_scalar::<i64>().fetch_one(&self.pool).await {
            Ok(total) => total,
            Err(e) => {
                tracing::error!("list_threads count error: {:?}", e);
                return Page::empty(options);
            }
        };

        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {THREAD_COLUMNS} FROM threads t LEFT JOIN posts p ON p.thread_id = t.id"
        ));
        push_thread_filters(&mut builder, options, include_hidden);

        builder.push(match options.sort() {
            SortOrder::Newest => " ORDER BY t.created_at DESC",
            SortOrder::Oldest => " ORDER BY t.created_at ASC",
            SortOrder::Popular => {
                " ORDER BY COALESCE(p.upvotes, 0) - COALESCE(p.downvotes, 0) DESC, t.created_at DESC"
            }
        });
        builder.push(" LIMIT ");
        builder.push_bind(options.limit());
        builder.push(" OFFSET ");
        builder.push_bind(options.offset());

        match builder.build_query_as::<Thread>().fetch_all(&self.pool).await {
            Ok(items) => Page::new(items, options, total),
            Err(e) => {
                tracing::error!("list_threads error: {:?}", e);
                Page::empty(options)
            }
        }
    }

    async fn get_thread(&self, id: Uuid) -> Option<Thread> {
        self.get_thread_by(id).await
    }

    async fn get_thread_post(&self, thread_id: Uuid) -> Option<Post> {
        sqlx::query_as::<_, Post>(&format!("{POST_SELECT} WHERE p.thread_id = $1"))
            .bind(thread_id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_thread_post error: {:?}", e);
                None
            })
    }

    /// create_thread
    ///
    /// Inserts the thread and its opening post in one transaction; a failure
    /// in either insert leaves nothing behind.
    async fn create_thread(&self, author_id: Uuid, req: CreateThreadRequest) -> Option<(Thread, Post)> {
        let thread_id = Uuid::new_v4();
        let post_id = Uuid::new_v4();

        let result: Result<(), sqlx::Error> = async {
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                r#"INSERT INTO threads (id, author_id, title, tags, type, assignees)
                   VALUES ($1, $2, $3, $4, $5, $6)"#,
            )
            .bind(thread_id)
            .bind(author_id)
            .bind(&req.title)
            .bind(&req.tags)
            .bind(req.kind)
            .bind(&req.assignees)
            .execute(&mut *tx)
            .await?;

            sqlx::query("INSERT INTO posts (id, thread_id, author_id, body) VALUES ($1, $2, $3, $4)")
                .bind(post_id)
                .bind(thread_id)
                .bind(author_id)
                .bind(&req.body)
                .execute(&mut *tx)
                .await?;

            tx.commit().await
        }
        .await;

        if let Err(e) = result {
            tracing::error!("create_thread error: {:?}", e);
            return None;
        }

        let thread = self.get_thread_by(thread_id).await?;
        let post = self.get_post(post_id).await?;
        Some((thread, post))
    }

    async fn update_thread(&self, id: Uuid, req: UpdateThreadRequest) -> Option<Thread> {
        let result = sqlx::query(
            r#"
            UPDATE threads
            SET title = COALESCE($2, title),
                tags = COALESCE($3, tags),
                type = COALESCE($4, type),
                opened = COALESCE($5, opened),
                solved = COALESCE($6, solved),
                assignees = COALESCE($7, assignees),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(req.title)
        .bind(req.tags)
        .bind(req.kind)
        .bind(req.opened)
        .bind(req.solved)
        .bind(req.assignees)
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) if res.rows_affected() > 0 => self.get_thread_by(id).await,
            Ok(_) => None,
            Err(e) => {
                tracing::error!("update_thread error: {:?}", e);
                None
            }
        }
    }

    async fn set_thread_locked(&self, id: Uuid, locked: bool) -> Option<Thread> {
        let sql = "UPDATE threads SET locked = $2, updated_at = NOW() WHERE id = $1";
        match sqlx::query(sql).bind(id).bind(locked).execute(&self.pool).await {
            Ok(res) if res.rows_affected() > 0 => self.get_thread_by(id).await,
            Ok(_) => None,
            Err(e) => {
                tracing::error!("set_thread_locked error: {:?}", e);
                None
            }
        }
    }

    /// set_thread_visibility
    ///
    /// Hides or restores the thread together with its opening post.
    async fn set_thread_visibility(&self, id: Uuid, is_visible: bool) -> Option<Thread> {
        let result: Result<u64, sqlx::Error> = async {
            let mut tx = self.pool.begin().await?;
            let affected = sqlx::query(
                "UPDATE threads SET is_visible = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .bind(is_visible)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            sqlx::query("UPDATE posts SET is_visible = $2 WHERE thread_id = $1")
                .bind(id)
                .bind(is_visible)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(affected)
        }
        .await;

        match result {
            Ok(affected) if affected > 0 => self.get_thread_by(id).await,
            Ok(_) => None,
            Err(e) => {
                tracing::error!("set_thread_visibility error: {:?}", e);
                None
            }
        }
    }

    /// delete_thread
    ///
    /// Posts, comments and replies go with it through `ON DELETE CASCADE`.
    async fn delete_thread(&self, id: Uuid) -> bool {
        self.execute_affecting("delete_thread", "DELETE FROM threads WHERE id = $1", id)
            .await
    }

    async fn filter_known_tags(&self, names: &[String]) -> Vec<String> {
        if names.is_empty() {
            return vec![];
        }

        let known: Vec<String> =
            sqlx::query_scalar::<_, String>("SELECT name FROM tags WHERE name = ANY($1)")
                .bind(names)
                .fetch_all(&self.pool)
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("filter_known_tags error: {:?}", e);
                    vec![]
                });

        let mut kept: Vec<String> = Vec::new();
        for name in names {
            if known.contains(name) && !kept.contains(name) {
                kept.push(name.clone());
            }
        }
        kept
    }

    // --- POSTS, COMMENTS & REPLIES ---

    async fn get_post(&self, id: Uuid) -> Option<Post> {
        sqlx::query_as::<_, Post>(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_post error: {:?}", e);
                None
            })
    }

    async fn update_post(&self, id: Uuid, body: String) -> Option<Post> {
        let sql = r#"UPDATE posts SET body = $2, updated_at = NOW(), content_last_edited_at = NOW()
                     WHERE id = $1"#;
        match sqlx::query(sql).bind(id).bind(body).execute(&self.pool).await {
            Ok(res) if res.rows_affected() > 0 => self.get_post(id).await,
            Ok(_) => None,
            Err(e) => {
                tracing::error!("update_post error: {:?}", e);
                None
            }
        }
    }

    async fn list_comments(&self, post_id: Uuid) -> Vec<Comment> {
        sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at ASC"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_comments error: {:?}", e);
            vec![]
        })
    }

    async fn get_comment(&self, id: Uuid) -> Option<Comment> {
        sqlx::query_as::<_, Comment>(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_comment error: {:?}", e);
                None
            })
    }

    async fn create_comment(&self, post_id: Uuid, author_id: Uuid, body: String) -> Option<Comment> {
        let id = Uuid::new_v4();
        let sql = "INSERT INTO comments (id, post_id, author_id, body) VALUES ($1, $2, $3, $4)";
        match sqlx::query(sql)
            .bind(id)
            .bind(post_id)
            .bind(author_id)
            .bind(body)
            .execute(&self.pool)
            .await
        {
            Ok(_) => self.get_comment(id).await,
            Err(e) => {
                tracing::error!("create_comment error: {:?}", e);
                None
            }
        }
    }

    async fn update_comment(&self, id: Uuid, body: String) -> Option<Comment> {
        let sql = r#"UPDATE comments SET body = $2, updated_at = NOW(), content_last_edited_at = NOW()
                     WHERE id = $1"#;
        match sqlx::query(sql).bind(id).bind(body).execute(&self.pool).await {
            Ok(res) if res.rows_affected() > 0 => self.get_comment(id).await,
            Ok(_) => None,
            Err(e) => {
                tracing::error!("update_comment error: {:?}", e);
                None
            }
        }
    }

    async fn delete_comment(&self, id: Uuid) -> bool {
        self.execute_affecting("delete_comment", "DELETE FROM comments WHERE id = $1", id)
            .await
    }

    async fn list_replies_for_post(&self, post_id: Uuid) -> Vec<Reply> {
        sqlx::query_as::<_, Reply>(&format!(
            "{REPLY_SELECT} WHERE c.post_id = $1 ORDER BY r.created_at ASC"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_replies_for_post error: {:?}", e);
            vec![]
        })
    }

    async fn get_reply(&self, id: Uuid) -> Option<Reply> {
        sqlx::query_as::<_, Reply>(&format!("{REPLY_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_reply error: {:?}", e);
                None
            })
    }

    async fn create_reply(&self, comment_id: Uuid, author_id: Uuid, body: String) -> Option<Reply> {
        let id = Uuid::new_v4();
        let sql = "INSERT INTO replies (id, comment_id, author_id, body) VALUES ($1, $2, $3, $4)";
        match sqlx::query(sql)
            .bind(id)
            .bind(comment_id)
            .bind(author_id)
            .bind(body)
            .execute(&self.pool)
            .await
        {
            Ok(_) => self.get_reply(id).await,
            Err(e) => {
                tracing::error!("create_reply error: {:?}", e);
                None
            }
        }
    }

    async fn update_reply(&self, id: Uuid, body: String) -> Option<Reply> {
        let sql = r#"UPDATE replies SET body = $2, updated_at = NOW(), content_last_edited_at = NOW()
                     WHERE id = $1"#;
        match sqlx::query(sql).bind(id).bind(body).execute(&self.pool).await {
            Ok(res) if res.rows_affected() > 0 => self.get_reply(id).await,
            Ok(_) => None,
            Err(e) => {
                tracing::error!("update_reply error: {:?}", e);
                None
            }
        }
    }

    async fn delete_reply(&self, id: Uuid) -> bool {
        self.execute_affecting("delete_reply", "DELETE FROM replies WHERE id = $1", id)
            .await
    }

    /// vote
    ///
    /// Records (or withdraws) the caller's vote and recomputes the content's
    /// counters from the `votes` table inside the same transaction, so the
    /// tally can never drift from the individual votes.
    async fn vote(&self, target: VoteTarget, user_id: Uuid, value: i16) -> Option<VoteTally> {
        let kind = target.kind().as_str();
        let content_id = target.id();

        let result: Result<Option<(i32, i32)>, sqlx::Error> = async {
            let mut tx = self.pool.begin().await?;

            if value == 0 {
                sqlx::query(
                    "DELETE FROM votes WHERE content_kind = $1 AND content_id = $2 AND user_id = $3",
                )
                .bind(kind)
                .bind(content_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            } else {
                sqlx::query(
                    r#"INSERT INTO votes (content_kind, content_id, user_id, value)
                       VALUES ($1, $2, $3, $4)
                       ON CONFLICT (content_kind, content_id, user_id) DO UPDATE SET value = EXCLUDED.value"#,
                )
                .bind(kind)
                .bind(content_id)
                .bind(user_id)
                .bind(value)
                .execute(&mut *tx)
                .await?;
            }

            // The table name comes from a closed enum, never from input.
            let tally = sqlx::query_as::<_, (i32, i32)>(&format!(
                r#"
                UPDATE {table}
                SET upvotes = (SELECT COUNT(*)::INT FROM votes
                               WHERE content_kind = $1 AND content_id = $2 AND value = 1),
                    downvotes = (SELECT COUNT(*)::INT FROM votes
                                 WHERE content_kind = $1 AND content_id = $2 AND value = -1)
                WHERE id = $2
                RETURNING upvotes, downvotes
                "#,
                table = target.table()
            ))
            .bind(kind)
            .bind(content_id)
            .fetch_optional(&mut *tx)
            .await?;

            if tally.is_some() {
                tx.commit().await?;
            }
            Ok(tally)
        }
        .await;

        match result {
            Ok(tally) => tally.map(|(upvotes, downvotes)| VoteTally {
                upvotes,
                downvotes,
                value,
            }),
            Err(e) => {
                tracing::error!("vote error: {:?}", e);
                None
            }
        }
    }

    // --- TAGS ---

    async fn list_tags(&self) -> Vec<Tag> {
        sqlx::query_as::<_, Tag>("SELECT name, color, description, created_at FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_tags error: {:?}", e);
                vec![]
            })
    }

    async fn get_tag(&self, name: &str) -> Option<Tag> {
        sqlx::query_as::<_, Tag>("SELECT name, color, description, created_at FROM tags WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_tag error: {:?}", e);
                None
            })
    }

    /// create_tag
    ///
    /// `ON CONFLICT DO NOTHING` turns a duplicate name into `None`.
    async fn create_tag(&self, req: CreateTagRequest) -> Option<Tag> {
        sqlx::query_as::<_, Tag>(
            r#"INSERT INTO tags (name, color, description) VALUES ($1, $2, $3)
               ON CONFLICT (name) DO NOTHING
               RETURNING name, color, description, created_at"#,
        )
        .bind(req.name)
        .bind(req.color)
        .bind(req.description)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_tag error: {:?}", e);
            None
        })
    }

    async fn update_tag(&self, name: &str, req: UpdateTagRequest) -> Option<Tag> {
        sqlx::query_as::<_, Tag>(
            r#"UPDATE tags
               SET color = COALESCE($2, color),
                   description = COALESCE($3, description)
               WHERE name = $1
               RETURNING name, color, description, created_at"#,
        )
        .bind(name)
        .bind(req.color)
        .bind(req.description)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_tag error: {:?}", e);
            None
        })
    }

    async fn delete_tag(&self, name: &str) -> bool {
        match sqlx::query("DELETE FROM tags WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_tag error: {:?}", e);
                false
            }
        }
    }

    // --- STUDY DOCUMENTS ---

    async fn get_study_doc(&self, id: Uuid) -> Option<StudyDoc> {
        sqlx::query_as::<_, StudyDoc>(&format!(
            "SELECT {STUDY_DOC_COLUMNS} FROM study_docs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_study_doc error: {:?}", e);
            None
        })
    }

    async fn create_study_doc(&self, uploader_id: Uuid, req: CreateStudyDocRequest) -> Option<StudyDoc> {
        sqlx::query_as::<_, StudyDoc>(&format!(
            r#"INSERT INTO study_docs (id, uploader_id, name, description, subject, doc_series, year, tags, file_key)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING {STUDY_DOC_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(uploader_id)
        .bind(req.name)
        .bind(req.description)
        .bind(req.subject)
        .bind(req.doc_series)
        .bind(req.year)
        .bind(req.tags)
        .bind(req.file_key)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_study_doc error: {:?}", e);
            None
        })
    }

    async fn update_study_doc(&self, id: Uuid, req: UpdateStudyDocRequest) -> Option<StudyDoc> {
        sqlx::query_as::<_, StudyDoc>(&format!(
            r#"
            UPDATE study_docs
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                subject = COALESCE($4, subject),
                doc_series = COALESCE($5, doc_series),
                year = COALESCE($6, year),
                tags = COALESCE($7, tags),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {STUDY_DOC_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.description)
        .bind(req.subject)
        .bind(req.doc_series)
        .bind(req.year)
        .bind(req.tags)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_study_doc error: {:?}", e);
            None
        })
    }

    async fn delete_study_doc(&self, id: Uuid) -> bool {
        self.execute_affecting("delete_study_doc", "DELETE FROM study_docs WHERE id = $1", id)
            .await
    }

    // --- BADGES ---

    async fn list_badges(&self) -> Vec<Badge> {
        sqlx::query_as::<_, Badge>("SELECT id, name, description, icon FROM badges ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_badges error: {:?}", e);
                vec![]
            })
    }

    async fn get_badge(&self, id: Uuid) -> Option<Badge> {
        sqlx::query_as::<_, Badge>("SELECT id, name, description, icon FROM badges WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_badge error: {:?}", e);
                None
            })
    }

    async fn update_badge(&self, id: Uuid, req: UpdateBadgeRequest) -> Option<Badge> {
        sqlx::query_as::<_, Badge>(
            r#"UPDATE badges
               SET name = COALESCE($2, name),
                   description = COALESCE($3, description),
                   icon = COALESCE($4, icon)
               WHERE id = $1
               RETURNING id, name, description, icon"#,
        )
        .bind(id)
        .bind(req.name)
        .bind(req.description)
        .bind(req.icon)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_badge error: {:?}", e);
            None
        })
    }
}
