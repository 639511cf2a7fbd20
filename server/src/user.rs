use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::identity::VerifiedIdentity;

/// A local user record, keyed to the identity provider by `subject`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub subject: String,
    pub handle: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

const USER_COLUMNS: &str =
    "id AS user_id, subject, handle, display_name, avatar_url, is_admin, created_at_utc, updated_at_utc";

impl User {
    /// Get a user by their ID
    pub async fn get_by_id(pool: &PgPool, user_id: Uuid) -> cja::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Resolve or create the local record for a verified identity.
    ///
    /// Keyed on the provider subject; profile fields are refreshed on every
    /// successful verification so the local copy tracks the provider.
    pub async fn upsert_from_identity(
        pool: &PgPool,
        identity: &VerifiedIdentity,
        is_admin: bool,
    ) -> cja::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (subject, handle, display_name, avatar_url, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (subject) DO UPDATE SET
                handle = EXCLUDED.handle,
                display_name = EXCLUDED.display_name,
                avatar_url = EXCLUDED.avatar_url,
                is_admin = EXCLUDED.is_admin,
                updated_at_utc = NOW()
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&identity.subject)
        .bind(&identity.handle)
        .bind(&identity.display_name)
        .bind(&identity.avatar_url)
        .bind(is_admin)
        .fetch_one(pool)
        .await?;

        debug!(subject = %user.subject, user_id = %user.user_id, "Resolved user from verified identity");

        Ok(user)
    }

    /// The name to show next to this user's guestbook activity
    pub fn name_for_display(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.handle.as_deref())
            .unwrap_or("anonymous")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_user() -> User {
        User {
            user_id: Uuid::new_v4(),
            subject: "idp|test".to_string(),
            handle: None,
            display_name: None,
            avatar_url: None,
            is_admin: false,
            created_at_utc: Utc::now(),
            updated_at_utc: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_prefers_display_name() {
        let mut user = bare_user();
        user.handle = Some("rowan".to_string());
        user.display_name = Some("Rowan Hale".to_string());

        assert_eq!(user.name_for_display(), "Rowan Hale");
    }

    #[test]
    fn test_display_name_falls_back_to_handle() {
        let mut user = bare_user();
        user.handle = Some("rowan".to_string());

        assert_eq!(user.name_for_display(), "rowan");
    }

    #[test]
    fn test_display_name_falls_back_to_anonymous() {
        assert_eq!(bare_user().name_for_display(), "anonymous");
    }
}
