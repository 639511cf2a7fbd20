use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{error, warn};

use crate::{errors::ApiError, state::AppState};

/// A subject identity vouched for by the identity provider.
///
/// `subject` is the provider's stable identifier for the account; the rest
/// are profile fields the provider may or may not populate.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedIdentity {
    #[serde(rename = "sub")]
    pub subject: String,

    #[serde(default)]
    pub handle: Option<String>,

    #[serde(default, rename = "name")]
    pub display_name: Option<String>,

    #[serde(default, rename = "picture")]
    pub avatar_url: Option<String>,
}

/// Exchange a bearer token for a verified subject identity.
///
/// The provider's userinfo endpoint is the source of truth: a 2xx with a
/// `sub` claim means the token is live, a 401/403 means it is not, and
/// anything else is the provider having a bad day.
pub async fn verify_token(state: &AppState, token: &str) -> Result<VerifiedIdentity, ApiError> {
    let userinfo_url = state.identity.userinfo_url();

    let response = state
        .client
        .get(&userinfo_url)
        .bearer_auth(token)
        .send()
        .await
        .map_err(|err| {
            error!(error = ?err, url = %userinfo_url, "Failed to reach identity provider");
            ApiError::UpstreamUnavailable
        })?;

    let status = response.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::Unauthorized);
    }

    if !status.is_success() {
        error!(status = %status, "Identity provider returned an unexpected status");
        return Err(ApiError::UpstreamUnavailable);
    }

    let identity: VerifiedIdentity = response.json().await.map_err(|err| {
        warn!(error = ?err, "Identity provider returned an unparseable userinfo body");
        ApiError::Unauthorized
    })?;

    if identity.subject.is_empty() {
        warn!("Identity provider returned a userinfo body with an empty subject");
        return Err(ApiError::Unauthorized);
    }

    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_userinfo() {
        let identity: VerifiedIdentity = serde_json::from_str(
            r#"{
                "sub": "idp|abc123",
                "handle": "rowan",
                "name": "Rowan Hale",
                "picture": "https://cdn.example.com/rowan.png",
                "email": "ignored@example.com"
            }"#,
        )
        .unwrap();

        assert_eq!(identity.subject, "idp|abc123");
        assert_eq!(identity.handle.as_deref(), Some("rowan"));
        assert_eq!(identity.display_name.as_deref(), Some("Rowan Hale"));
        assert_eq!(
            identity.avatar_url.as_deref(),
            Some("https://cdn.example.com/rowan.png")
        );
    }

    #[test]
    fn test_deserialize_minimal_userinfo() {
        let identity: VerifiedIdentity =
            serde_json::from_str(r#"{"sub": "idp|minimal"}"#).unwrap();

        assert_eq!(identity.subject, "idp|minimal");
        assert!(identity.handle.is_none());
        assert!(identity.display_name.is_none());
        assert!(identity.avatar_url.is_none());
    }

    #[test]
    fn test_userinfo_without_subject_is_rejected() {
        let parsed = serde_json::from_str::<VerifiedIdentity>(r#"{"name": "No Sub"}"#);
        assert!(parsed.is_err());
    }
}
