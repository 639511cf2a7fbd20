use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::{
    errors::ApiError,
    identity::{self, VerifiedIdentity},
    state::AppState,
    user::User,
};

/// The authenticated caller of an API request.
///
/// Extracting this verifies the bearer token with the identity provider and
/// resolves (or creates) the matching local user record. There is no session
/// state: every request is re-verified.
#[derive(Debug, Clone)]
pub struct ApiUser {
    pub user: User,
    #[allow(dead_code)]
    pub identity: VerifiedIdentity,
}

#[async_trait]
impl FromRequestParts<AppState> for ApiUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // A missing or malformed header is rejected locally; the provider is
        // only consulted for tokens that at least look like tokens.
        let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;

        let identity = identity::verify_token(state, token).await?;

        let is_admin = state.is_admin_subject(&identity.subject);
        let user = User::upsert_from_identity(&state.db, &identity, is_admin).await?;

        debug!(user_id = %user.user_id, "Authenticated API request");

        Ok(ApiUser { user, identity })
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
///
/// Scheme matching is case-insensitive per RFC 7235. Returns None for a
/// missing header, a different scheme, or an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_authorization(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracts_token() {
        let headers = headers_with_authorization("Bearer tok_abc123");
        assert_eq!(bearer_token(&headers), Some("tok_abc123"));
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        let headers = headers_with_authorization("bearer tok_abc123");
        assert_eq!(bearer_token(&headers), Some("tok_abc123"));

        let headers = headers_with_authorization("BEARER tok_abc123");
        assert_eq!(bearer_token(&headers), Some("tok_abc123"));
    }

    #[test]
    fn test_missing_header_yields_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_wrong_scheme_yields_none() {
        let headers = headers_with_authorization("Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_empty_token_yields_none() {
        let headers = headers_with_authorization("Bearer ");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_bare_scheme_yields_none() {
        let headers = headers_with_authorization("Bearer");
        assert_eq!(bearer_token(&headers), None);
    }
}
