use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::Form;
use shared::forms::StrategyForm;
use shared::{Session, StrategyId, TradeFilter};
use tracing::{info, warn};

use crate::error::{status_for, AppError};
use crate::session::CurrentSession;
use crate::state::AppState;
use crate::views::{page, strategy_cards, StrategiesPage, StrategyCreatePage};

async fn render_list(
    state: &AppState,
    session: &Session,
    status: StatusCode,
    error: Option<String>,
) -> Result<Response, AppError> {
    let strategies = state.backend.list_strategies(session).await?;
    let trades = state
        .backend
        .list_trades(session, &TradeFilter::all())
        .await?;
    page(
        status,
        &StrategiesPage {
            signed_in_as: session.email.clone(),
            cards: strategy_cards(&strategies, &trades),
            error,
        },
    )
}

pub async fn list(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, AppError> {
    render_list(&state, &session, StatusCode::OK, None).await
}

pub async fn create_form(CurrentSession(session): CurrentSession) -> Result<Response, AppError> {
    page(
        StatusCode::OK,
        &StrategyCreatePage {
            signed_in_as: session.email,
            name: String::new(),
            rules: vec![String::new()],
            error: None,
        },
    )
}

pub async fn create(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<StrategyForm>,
) -> Result<Response, AppError> {
    if form.wants_extra_rule() {
        let mut rules = form.rule_rows();
        rules.push(String::new());
        return page(
            StatusCode::OK,
            &StrategyCreatePage {
                signed_in_as: session.email,
                name: form.name,
                rules,
                error: None,
            },
        );
    }

    let saved = match form.to_draft() {
        Ok(draft) => state.backend.insert_strategy(&session, draft).await,
        Err(e) => Err(e),
    };

    match saved {
        Ok(strategy) => {
            info!("Created strategy {} for user {}", strategy.id, session.user_id);
            Ok(Redirect::to("/strategies").into_response())
        }
        Err(e) => {
            warn!("Strategy not saved for user {}: {}", session.user_id, e);
            page(
                status_for(&e),
                &StrategyCreatePage {
                    signed_in_as: session.email,
                    name: form.name.clone(),
                    rules: form.rule_rows(),
                    error: Some(e.to_string()),
                },
            )
        }
    }
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<StrategyId>,
) -> Result<Response, AppError> {
    match state.backend.delete_strategy(&session, id).await {
        Ok(()) => {
            info!("Deleted strategy {} for user {}", id, session.user_id);
            Ok(Redirect::to("/strategies").into_response())
        }
        Err(e) => {
            warn!("Strategy {} not deleted: {}", id, e);
            render_list(&state, &session, status_for(&e), Some(e.to_string())).await
        }
    }
}
