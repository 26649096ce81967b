use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::Form;
use shared::forms::TradeForm;
use shared::Session;
use tracing::{info, warn};

use crate::error::{status_for, AppError};
use crate::session::CurrentSession;
use crate::state::AppState;
use crate::views::{page, LogTradePage};

async fn render_form(
    state: &AppState,
    session: &Session,
    status: StatusCode,
    form: TradeForm,
    error: Option<String>,
) -> Result<Response, AppError> {
    let strategies = state.backend.list_strategies(session).await?;
    page(
        status,
        &LogTradePage::new(session.email.clone(), form, &strategies, error),
    )
}

pub async fn form(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, AppError> {
    let blank = TradeForm::blank(state.today());
    render_form(&state, &session, StatusCode::OK, blank, None).await
}

pub async fn submit(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<TradeForm>,
) -> Result<Response, AppError> {
    let saved = match form.to_draft() {
        Ok(draft) => state.backend.insert_trade(&session, draft).await,
        Err(e) => Err(e),
    };

    match saved {
        Ok(trade) => {
            info!("Logged trade {} ({}) for user {}", trade.id, trade.symbol, session.user_id);
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(e) => {
            warn!("Trade not saved for user {}: {}", session.user_id, e);
            render_form(&state, &session, status_for(&e), form, Some(e.to_string())).await
        }
    }
}
