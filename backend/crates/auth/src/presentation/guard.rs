//! Bearer-token guard
//!
//! The single place where protected handlers get their caller's identity.
//! Add [`Authenticated`] to a handler's arguments; requests without a valid
//! token are answered with the standard error envelope before the handler
//! runs.

use std::ops::Deref;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use kernel::response::{ApiError, RequestId};

use crate::application::session::{AuthenticatedUser, SessionIssuer};
use crate::error::AuthError;

/// Identity proven by a valid bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated(pub AuthenticatedUser);

impl Deref for Authenticated {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Extract the token from `Authorization: Bearer <token>`
///
/// A missing header is `Ok(None)`; a header with another scheme or non-ASCII
/// bytes is an invalid credential rather than a missing one.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::TokenInvalid)?.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::TokenInvalid)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::TokenInvalid);
    }
    Ok(Some(token.trim()))
}

impl<S> FromRequestParts<S> for Authenticated
where
    Arc<SessionIssuer>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = Arc::<SessionIssuer>::from_ref(state);

        bearer_token(&parts.headers)
            .and_then(|token| sessions.authenticate(token))
            .map(Authenticated)
            .map_err(|e| RequestId::from_headers(&parts.headers).fail(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&HeaderMap::new()).unwrap(), None);
        assert_eq!(bearer_token(&headers("Bearer v1.a.b")).unwrap(), Some("v1.a.b"));
        assert_eq!(bearer_token(&headers("bearer  v1.a.b ")).unwrap(), Some("v1.a.b"));
    }

    #[test]
    fn test_other_schemes_are_invalid() {
        assert!(matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(
            bearer_token(&headers("v1.a.b")),
            Err(AuthError::TokenInvalid)
        ));
    }
}
