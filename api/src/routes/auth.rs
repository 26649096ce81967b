use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::{CookieJar, Form};
use serde::Deserialize;
use shared::forms::Credentials;
use tracing::{debug, warn};

use crate::error::{status_for, AppError};
use crate::session::{removal_cookie, resolve, session_cookie, SESSION_COOKIE};
use crate::state::AppState;
use crate::views::{page, LoginPage, RegisterPage};

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub registered: Option<String>,
}

pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    if resolve(&jar, &state).await.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    let notice = query
        .registered
        .map(|_| "Account created. Sign in to continue.".to_string());
    page(
        StatusCode::OK,
        &LoginPage {
            signed_in_as: None,
            email: String::new(),
            error: None,
            notice,
        },
    )
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> Result<Response, AppError> {
    let attempt = match credentials.validate_login() {
        Ok(()) => {
            state
                .backend
                .sign_in(credentials.email(), &credentials.password)
                .await
        }
        Err(e) => Err(e),
    };

    match attempt {
        Ok(session) => {
            let jar = jar.add(session_cookie(session.access_token, state.cookie_secure));
            Ok((jar, Redirect::to("/dashboard")).into_response())
        }
        Err(e) => {
            warn!("Sign-in failed for {}: {}", credentials.email(), e);
            page(
                status_for(&e),
                &LoginPage {
                    signed_in_as: None,
                    email: credentials.email().to_string(),
                    error: Some(e.to_string()),
                    notice: None,
                },
            )
        }
    }
}

pub async fn register_page() -> Result<Response, AppError> {
    page(
        StatusCode::OK,
        &RegisterPage {
            signed_in_as: None,
            email: String::new(),
            error: None,
        },
    )
}

pub async fn register(
    State(state): State<AppState>,
    Form(credentials): Form<Credentials>,
) -> Result<Response, AppError> {
    let outcome = match credentials.validate_registration() {
        Ok(()) => {
            state
                .backend
                .sign_up(credentials.email(), &credentials.password)
                .await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(_) => Ok(Redirect::to("/login?registered=1").into_response()),
        Err(e) => page(
            status_for(&e),
            &RegisterPage {
                signed_in_as: None,
                email: credentials.email().to_string(),
                error: Some(e.to_string()),
            },
        ),
    }
}

/// Revokes the session if there is one; always clears the cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(session) = resolve(&jar, &state).await {
        state.backend.sign_out(&session).await;
    } else if jar.get(SESSION_COOKIE).is_some() {
        debug!("Logout with an unknown or expired session cookie");
    }
    (jar.remove(removal_cookie()), Redirect::to("/login")).into_response()
}
