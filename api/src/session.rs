//! Per-request session resolution from the session cookie.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use shared::Session;
use tracing::debug;

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "verotrade_session";

/// The signed-in user's session. Rejects with a redirect to `/login`.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        match resolve(&jar, state).await {
            Some(session) => Ok(CurrentSession(session)),
            None => {
                debug!("No valid session for {}, redirecting to login", parts.uri.path());
                Err(Redirect::to("/login"))
            }
        }
    }
}

/// Looks up the session named by the cookie, if any.
pub async fn resolve(jar: &CookieJar, state: &AppState) -> Option<Session> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    if token.is_empty() {
        return None;
    }
    state
        .backend
        .get_session(&token)
        .await
        .filter(|session| !session.is_expired(Utc::now()))
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
