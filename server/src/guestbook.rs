use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::{errors::ApiError, user::User};

/// Longest message we accept for entries and replies, in characters
pub const MAX_MESSAGE_LEN: usize = 500;

/// A guestbook entry: a user-authored message with owner and timestamps
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Entry {
    pub entry_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// A reply attached to a guestbook entry
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Reply {
    pub reply_id: Uuid,
    pub entry_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub created_at_utc: DateTime<Utc>,
}

/// An entry row joined with its author's public profile fields
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntryRecord {
    pub entry_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    pub author_handle: Option<String>,
    pub author_display_name: Option<String>,
    pub author_avatar_url: Option<String>,
}

/// A reply row joined with its author's public profile fields
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReplyRecord {
    pub reply_id: Uuid,
    pub entry_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub created_at_utc: DateTime<Utc>,
    pub author_handle: Option<String>,
    pub author_display_name: Option<String>,
    pub author_avatar_url: Option<String>,
}

/// An entry with its replies threaded underneath it
#[derive(Debug, Clone)]
pub struct ThreadedEntry {
    pub entry: EntryRecord,
    pub replies: Vec<ReplyRecord>,
}

const ENTRY_COLUMNS: &str =
    "id AS entry_id, user_id, message, created_at_utc, updated_at_utc";

const REPLY_COLUMNS: &str = "id AS reply_id, entry_id, user_id, message, created_at_utc";

impl Entry {
    pub async fn create(pool: &PgPool, user_id: Uuid, message: &str) -> cja::Result<Entry> {
        let entry = sqlx::query_as::<_, Entry>(&format!(
            r#"
            INSERT INTO guestbook_entries (user_id, message)
            VALUES ($1, $2)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(message)
        .fetch_one(pool)
        .await?;

        info!(entry_id = %entry.entry_id, user_id = %user_id, "Created guestbook entry");

        Ok(entry)
    }

    pub async fn get_by_id(pool: &PgPool, entry_id: Uuid) -> cja::Result<Option<Entry>> {
        let entry = sqlx::query_as::<_, Entry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM guestbook_entries WHERE id = $1"
        ))
        .bind(entry_id)
        .fetch_optional(pool)
        .await?;

        Ok(entry)
    }

    /// Replace this entry's message, bumping `updated_at_utc`
    pub async fn update_message(&mut self, pool: &PgPool, message: &str) -> cja::Result<()> {
        let updated_at_utc: DateTime<Utc> = sqlx::query_scalar(
            r#"
            UPDATE guestbook_entries SET message = $1, updated_at_utc = NOW()
            WHERE id = $2
            RETURNING updated_at_utc
            "#,
        )
        .bind(message)
        .bind(self.entry_id)
        .fetch_one(pool)
        .await?;

        self.message = message.to_string();
        self.updated_at_utc = updated_at_utc;

        Ok(())
    }

    /// Delete this entry. Replies go with it via the cascade FK.
    pub async fn delete(&self, pool: &PgPool) -> cja::Result<()> {
        sqlx::query("DELETE FROM guestbook_entries WHERE id = $1")
            .bind(self.entry_id)
            .execute(pool)
            .await?;

        info!(entry_id = %self.entry_id, "Deleted guestbook entry");

        Ok(())
    }

    /// All entries, newest first, with author info joined in
    pub async fn list_with_authors(pool: &PgPool) -> cja::Result<Vec<EntryRecord>> {
        let entries = sqlx::query_as::<_, EntryRecord>(
            r#"
            SELECT e.id AS entry_id, e.user_id, e.message,
                   e.created_at_utc, e.updated_at_utc,
                   u.handle AS author_handle,
                   u.display_name AS author_display_name,
                   u.avatar_url AS author_avatar_url
            FROM guestbook_entries e
            JOIN users u ON u.id = e.user_id
            ORDER BY e.created_at_utc DESC, e.id
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }
}

impl Reply {
    pub async fn create(
        pool: &PgPool,
        entry_id: Uuid,
        user_id: Uuid,
        message: &str,
    ) -> cja::Result<Reply> {
        let reply = sqlx::query_as::<_, Reply>(&format!(
            r#"
            INSERT INTO guestbook_replies (entry_id, user_id, message)
            VALUES ($1, $2, $3)
            RETURNING {REPLY_COLUMNS}
            "#
        ))
        .bind(entry_id)
        .bind(user_id)
        .bind(message)
        .fetch_one(pool)
        .await?;

        info!(reply_id = %reply.reply_id, entry_id = %entry_id, "Created guestbook reply");

        Ok(reply)
    }

    pub async fn get_by_id(pool: &PgPool, reply_id: Uuid) -> cja::Result<Option<Reply>> {
        let reply = sqlx::query_as::<_, Reply>(&format!(
            "SELECT {REPLY_COLUMNS} FROM guestbook_replies WHERE id = $1"
        ))
        .bind(reply_id)
        .fetch_optional(pool)
        .await?;

        Ok(reply)
    }

    pub async fn delete(&self, pool: &PgPool) -> cja::Result<()> {
        sqlx::query("DELETE FROM guestbook_replies WHERE id = $1")
            .bind(self.reply_id)
            .execute(pool)
            .await?;

        info!(reply_id = %self.reply_id, "Deleted guestbook reply");

        Ok(())
    }

    /// All replies across all entries, oldest first, with author info
    pub async fn list_with_authors(pool: &PgPool) -> cja::Result<Vec<ReplyRecord>> {
        let replies = sqlx::query_as::<_, ReplyRecord>(
            r#"
            SELECT r.id AS reply_id, r.entry_id, r.user_id, r.message,
                   r.created_at_utc,
                   u.handle AS author_handle,
                   u.display_name AS author_display_name,
                   u.avatar_url AS author_avatar_url
            FROM guestbook_replies r
            JOIN users u ON u.id = r.user_id
            ORDER BY r.created_at_utc, r.id
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(replies)
    }
}

/// Validate and normalize a message body from a request.
///
/// Messages are trimmed; empty-after-trim and over-length messages are
/// rejected with the reason spelled out for the 400 body.
pub fn validate_message(raw: &str) -> Result<&str, ApiError> {
    let message = raw.trim();

    if message.is_empty() {
        return Err(ApiError::InvalidRequest(
            "message must not be empty".to_string(),
        ));
    }

    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(ApiError::InvalidRequest(format!(
            "message must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }

    Ok(message)
}

/// Whether `user` may update or delete `entry`
pub fn can_modify_entry(entry: &Entry, user: &User) -> bool {
    entry.user_id == user.user_id || user.is_admin
}

/// Whether `user` may delete `reply`.
///
/// The reply's author may, the owner of the entry it hangs off may (they
/// moderate their own thread), and admins may.
pub fn can_delete_reply(reply: &Reply, entry_owner_id: Uuid, user: &User) -> bool {
    reply.user_id == user.user_id || entry_owner_id == user.user_id || user.is_admin
}

/// Attach replies to their entries, preserving the incoming orderings.
///
/// `entries` arrive newest-first and `replies` oldest-first; both orders
/// survive threading. Replies pointing at an entry not in the list are
/// dropped.
pub fn thread(entries: Vec<EntryRecord>, replies: Vec<ReplyRecord>) -> Vec<ThreadedEntry> {
    let mut threaded: Vec<ThreadedEntry> = entries
        .into_iter()
        .map(|entry| ThreadedEntry {
            entry,
            replies: Vec::new(),
        })
        .collect();

    let index: std::collections::HashMap<Uuid, usize> = threaded
        .iter()
        .enumerate()
        .map(|(i, t)| (t.entry.entry_id, i))
        .collect();

    for reply in replies {
        if let Some(&i) = index.get(&reply.entry_id) {
            threaded[i].replies.push(reply);
        }
    }

    threaded
}
