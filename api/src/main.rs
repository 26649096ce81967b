use anyhow::Result;
use api::{router, AppState};
use shared::{Config, LogFormat, SessionEvent};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Logs sign-in and sign-out events until the backend drops its sender.
fn spawn_session_logger(mut events: broadcast::Receiver<SessionEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::SignedIn { user_id }) => info!("Session started for user {}", user_id),
                Ok(SessionEvent::SignedOut { user_id }) => info!("Session ended for user {}", user_id),
                Err(RecvError::Lagged(skipped)) => warn!("Session log skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    info!("Starting VeroTrade journal ({:?} backend)...", config.backend);

    let backend = shared::connect(&config).await?;
    spawn_session_logger(backend.subscribe());
    info!("Journal backend ready");

    let app = router(AppState::new(backend, &config));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Journal listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
