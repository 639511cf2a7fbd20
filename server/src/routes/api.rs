use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::ApiUser,
    errors::ApiError,
    guestbook::{
        can_delete_reply, can_modify_entry, thread, validate_message, Entry, Reply, ReplyRecord,
        ThreadedEntry,
    },
    state::AppState,
    user::User,
};

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub subject: String,
    pub handle: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub created_at_utc: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            subject: user.subject,
            handle: user.handle,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            is_admin: user.is_admin,
            created_at_utc: user.created_at_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorResponse {
    pub user_id: Uuid,
    pub handle: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl AuthorResponse {
    fn from_user(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            handle: user.handle.clone(),
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub reply_id: Uuid,
    pub entry_id: Uuid,
    pub message: String,
    pub created_at_utc: DateTime<Utc>,
    pub author: AuthorResponse,
}

impl ReplyResponse {
    fn from_record(record: ReplyRecord) -> Self {
        Self {
            reply_id: record.reply_id,
            entry_id: record.entry_id,
            message: record.message,
            created_at_utc: record.created_at_utc,
            author: AuthorResponse {
                user_id: record.user_id,
                handle: record.author_handle,
                display_name: record.author_display_name,
                avatar_url: record.author_avatar_url,
            },
        }
    }

    fn from_reply(reply: Reply, author: &User) -> Self {
        Self {
            reply_id: reply.reply_id,
            entry_id: reply.entry_id,
            message: reply.message,
            created_at_utc: reply.created_at_utc,
            author: AuthorResponse::from_user(author),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub entry_id: Uuid,
    pub message: String,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    pub author: AuthorResponse,
    pub replies: Vec<ReplyResponse>,
}

impl EntryResponse {
    fn from_threaded(threaded: ThreadedEntry) -> Self {
        let ThreadedEntry { entry, replies } = threaded;

        Self {
            entry_id: entry.entry_id,
            message: entry.message,
            created_at_utc: entry.created_at_utc,
            updated_at_utc: entry.updated_at_utc,
            author: AuthorResponse {
                user_id: entry.user_id,
                handle: entry.author_handle,
                display_name: entry.author_display_name,
                avatar_url: entry.author_avatar_url,
            },
            replies: replies.into_iter().map(ReplyResponse::from_record).collect(),
        }
    }

    fn from_entry(entry: Entry, author: &User) -> Self {
        Self {
            entry_id: entry.entry_id,
            message: entry.message,
            created_at_utc: entry.created_at_utc,
            updated_at_utc: entry.updated_at_utc,
            author: AuthorResponse::from_user(author),
            replies: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GuestbookResponse {
    pub entries: Vec<EntryResponse>,
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

/// `GET /api/me` - the authenticated caller's user record
pub async fn me(ApiUser { user, .. }: ApiUser) -> Json<UserResponse> {
    Json(user.into())
}

/// `GET /api/guestbook` - all entries with replies, newest entry first
pub async fn list_entries(
    State(state): State<AppState>,
) -> Result<Json<GuestbookResponse>, ApiError> {
    let entries = Entry::list_with_authors(&state.db).await?;
    let replies = Reply::list_with_authors(&state.db).await?;

    let entries = thread(entries, replies)
        .into_iter()
        .map(EntryResponse::from_threaded)
        .collect();

    Ok(Json(GuestbookResponse { entries }))
}

/// `POST /api/guestbook` - sign the guestbook
pub async fn create_entry(
    State(state): State<AppState>,
    ApiUser { user, .. }: ApiUser,
    Json(body): Json<MessageBody>,
) -> Result<(StatusCode, Json<EntryResponse>), ApiError> {
    let message = validate_message(&body.message)?;

    let entry = Entry::create(&state.db, user.user_id, message).await?;

    Ok((
        StatusCode::CREATED,
        Json(EntryResponse::from_entry(entry, &user)),
    ))
}

/// `PATCH /api/guestbook/:id` - edit your own entry
pub async fn update_entry(
    State(state): State<AppState>,
    ApiUser { user, .. }: ApiUser,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<MessageBody>,
) -> Result<Json<EntryResponse>, ApiError> {
    let mut entry = Entry::get_by_id(&state.db, entry_id)
        .await?
        .ok_or(ApiError::NotFound("guestbook entry"))?;

    if !can_modify_entry(&entry, &user) {
        return Err(ApiError::Forbidden);
    }

    let message = validate_message(&body.message)?;
    entry.update_message(&state.db, message).await?;

    // The response carries the entry author, which may differ from the
    // caller when an admin edits someone else's entry
    let author = author_of(&state, &entry, &user).await?;

    Ok(Json(EntryResponse::from_entry(entry, &author)))
}

/// `DELETE /api/guestbook/:id` - remove your own entry, replies included
pub async fn delete_entry(
    State(state): State<AppState>,
    ApiUser { user, .. }: ApiUser,
    Path(entry_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let entry = Entry::get_by_id(&state.db, entry_id)
        .await?
        .ok_or(ApiError::NotFound("guestbook entry"))?;

    if !can_modify_entry(&entry, &user) {
        return Err(ApiError::Forbidden);
    }

    entry.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/guestbook/:id/replies` - reply to an entry
pub async fn create_reply(
    State(state): State<AppState>,
    ApiUser { user, .. }: ApiUser,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<MessageBody>,
) -> Result<(StatusCode, Json<ReplyResponse>), ApiError> {
    let message = validate_message(&body.message)?;

    let entry = Entry::get_by_id(&state.db, entry_id)
        .await?
        .ok_or(ApiError::NotFound("guestbook entry"))?;

    let reply = Reply::create(&state.db, entry.entry_id, user.user_id, message).await?;

    Ok((
        StatusCode::CREATED,
        Json(ReplyResponse::from_reply(reply, &user)),
    ))
}

/// `DELETE /api/guestbook/replies/:id` - remove a reply.
///
/// Allowed for the reply's author, the owner of the entry it hangs off,
/// and admins.
pub async fn delete_reply(
    State(state): State<AppState>,
    ApiUser { user, .. }: ApiUser,
    Path(reply_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let reply = Reply::get_by_id(&state.db, reply_id)
        .await?
        .ok_or(ApiError::NotFound("reply"))?;

    let entry = Entry::get_by_id(&state.db, reply.entry_id)
        .await?
        .ok_or(ApiError::NotFound("guestbook entry"))?;

    if !can_delete_reply(&reply, entry.user_id, &user) {
        return Err(ApiError::Forbidden);
    }

    reply.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn author_of(state: &AppState, entry: &Entry, caller: &User) -> Result<User, ApiError> {
    if entry.user_id == caller.user_id {
        return Ok(caller.clone());
    }

    User::get_by_id(&state.db, entry.user_id)
        .await?
        .ok_or(ApiError::NotFound("entry author"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guestbook::EntryRecord;

    fn record() -> EntryRecord {
        EntryRecord {
            entry_id: Uuid::nil(),
            user_id: Uuid::nil(),
            message: "hello from the porch".to_string(),
            created_at_utc: "2024-03-01T12:00:00Z".parse().unwrap(),
            updated_at_utc: "2024-03-01T12:00:00Z".parse().unwrap(),
            author_handle: Some("guest".to_string()),
            author_display_name: None,
            author_avatar_url: None,
        }
    }

    fn reply_record() -> ReplyRecord {
        ReplyRecord {
            reply_id: Uuid::nil(),
            entry_id: Uuid::nil(),
            user_id: Uuid::nil(),
            message: "welcome!".to_string(),
            created_at_utc: "2024-03-02T09:30:00Z".parse().unwrap(),
            author_handle: None,
            author_display_name: Some("Rowan Hale".to_string()),
            author_avatar_url: None,
        }
    }

    #[test]
    fn test_entry_response_shape() {
        let threaded = ThreadedEntry {
            entry: record(),
            replies: vec![reply_record()],
        };

        let response = EntryResponse::from_threaded(threaded);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["message"], "hello from the porch");
        assert_eq!(json["author"]["handle"], "guest");
        assert_eq!(json["replies"][0]["message"], "welcome!");
        assert_eq!(json["replies"][0]["author"]["display_name"], "Rowan Hale");
    }

    #[test]
    fn test_guestbook_response_wraps_entries() {
        let response = GuestbookResponse {
            entries: vec![EntryResponse::from_threaded(ThreadedEntry {
                entry: record(),
                replies: Vec::new(),
            })],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["entries"].is_array());
        assert_eq!(json["entries"][0]["replies"], serde_json::json!([]));
    }
}
