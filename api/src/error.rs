use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use shared::JournalError;
use thiserror::Error;
use tracing::{error, warn};

use crate::views::ErrorPage;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error("template error: {0}")]
    Render(#[from] askama::Error),
}

/// Status a failed operation maps to, whether shown as a banner or an error page.
pub fn status_for(err: &JournalError) -> StatusCode {
    match err {
        JournalError::Unauthorized | JournalError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        JournalError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        JournalError::NotFound => StatusCode::NOT_FOUND,
        e if e.is_backend_failure() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Journal(e) => status_for(e),
            AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, AppError::Journal(JournalError::Unauthorized)) {
            return Redirect::to("/login").into_response();
        }

        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        let page = ErrorPage {
            signed_in_as: None,
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Error"),
            message: self.to_string(),
        };
        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                error!("Failed to render error page: {}", e);
                (status, self.to_string()).into_response()
            }
        }
    }
}
