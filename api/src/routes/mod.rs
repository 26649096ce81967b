pub mod auth;
pub mod calendar;
pub mod dashboard;
pub mod health;
pub mod strategies;
pub mod trades;

use axum::response::Redirect;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

const ASSETS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets");

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/dashboard", get(dashboard::show))
        .route("/log-trade", get(trades::form).post(trades::submit))
        .route("/calendar", get(calendar::show))
        .route("/strategies", get(strategies::list))
        .route(
            "/strategies/create",
            get(strategies::create_form).post(strategies::create),
        )
        .route("/strategies/:id/delete", post(strategies::delete))
        .route("/health", get(health::health_check))
        .nest_service("/assets", ServeDir::new(ASSETS_DIR))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
