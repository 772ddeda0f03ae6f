//! Actix-web extractor that derives the caller's session from cookies.
//!
//! The session is read once per request and handed to handlers explicitly,
//! so no handler parses cookies on its own.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use serde::Serialize;
use std::future::{Ready, ready};
use utoipa::ToSchema;

use super::{GITHUB_TOKEN_COOKIE, GITHUB_USER_COOKIE, LOCAL_USER_COOKIE, decode_session_user};
use crate::models::SessionUser;

/// How the current session was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionProvider {
    Github,
    Local,
}

/// Session derived from the request cookies.
///
/// ```ignore
/// async fn handler(session: SessionContext) -> impl Responder {
///     if let Some(user) = session.user() { /* ... */ }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user: Option<SessionUser>,
    provider: Option<SessionProvider>,
}

impl SessionContext {
    /// Build a context from raw cookie values.
    ///
    /// A GitHub summary only counts when the HttpOnly token cookie is also
    /// present. GitHub wins over a local summary when both exist.
    pub fn from_cookies(
        github_token: Option<&str>,
        github_user: Option<&str>,
        local_user: Option<&str>,
    ) -> Self {
        let has_token = github_token.is_some_and(|t| !t.is_empty());

        if has_token && let Some(user) = github_user.and_then(decode_session_user) {
            return Self {
                user: Some(user),
                provider: Some(SessionProvider::Github),
            };
        }

        if let Some(user) = local_user.and_then(decode_session_user) {
            return Self {
                user: Some(user),
                provider: Some(SessionProvider::Local),
            };
        }

        Self::default()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn provider(&self) -> Option<SessionProvider> {
        self.provider
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let github_token = req.cookie(GITHUB_TOKEN_COOKIE);
        let github_user = req.cookie(GITHUB_USER_COOKIE);
        let local_user = req.cookie(LOCAL_USER_COOKIE);

        ready(Ok(SessionContext::from_cookies(
            github_token.as_ref().map(|c| c.value()),
            github_user.as_ref().map(|c| c.value()),
            local_user.as_ref().map(|c| c.value()),
        )))
    }
}
