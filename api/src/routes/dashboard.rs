use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use shared::TradeFilter;
use tracing::debug;

use crate::error::AppError;
use crate::session::CurrentSession;
use crate::state::AppState;
use crate::views::{page, DashboardPage};

pub async fn show(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, AppError> {
    let trades = state
        .backend
        .list_trades(&session, &TradeFilter::all())
        .await?;
    let total_trades = state.backend.count_trades(&session).await?;
    debug!(
        "Dashboard for user {}: {} trades listed, {} counted",
        session.user_id,
        trades.len(),
        total_trades
    );

    page(
        StatusCode::OK,
        &DashboardPage::new(session.email, &trades, total_trades),
    )
}
