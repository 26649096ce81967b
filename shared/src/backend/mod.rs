//! Data access facade: the only way views reach storage and auth.

pub mod database;
pub mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::config::{BackendKind, Config};
use crate::error::{JournalError, Result};
use crate::models::{
    Session, SessionEvent, Strategy, StrategyDraft, StrategyId, Trade, TradeDraft, TradeFilter,
    UserId,
};

pub use database::DatabaseBackend;
pub use supabase::SupabaseBackend;

const SESSION_EVENT_CAPACITY: usize = 64;

/// Every data call is scoped to the session's user. Implementations must
/// enforce that scope themselves; callers never pass a bare user id.
#[async_trait]
pub trait JournalBackend: Send + Sync {
    /// Resolves a bearer token. Unknown, expired or unverifiable tokens yield `None`.
    async fn get_session(&self, token: &str) -> Option<Session>;

    async fn get_current_user(&self, token: &str) -> Option<UserId> {
        self.get_session(token).await.map(|session| session.user_id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId>;

    /// Revokes the session. Failures are logged, never returned.
    async fn sign_out(&self, session: &Session);

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    /// Trades ordered by trade date ascending.
    async fn list_trades(&self, session: &Session, filter: &TradeFilter) -> Result<Vec<Trade>>;

    async fn count_trades(&self, session: &Session) -> Result<u64>;

    async fn insert_trade(&self, session: &Session, draft: TradeDraft) -> Result<Trade>;

    async fn list_strategies(&self, session: &Session) -> Result<Vec<Strategy>>;

    async fn insert_strategy(&self, session: &Session, draft: StrategyDraft) -> Result<Strategy>;

    /// Deletes one of the session user's strategies; `NotFound` otherwise.
    async fn delete_strategy(&self, session: &Session, id: StrategyId) -> Result<()>;
}

pub type SharedBackend = Arc<dyn JournalBackend>;

pub(crate) fn session_channel() -> broadcast::Sender<SessionEvent> {
    broadcast::channel(SESSION_EVENT_CAPACITY).0
}

/// Notifies subscribers; having none is fine.
pub(crate) fn publish(events: &broadcast::Sender<SessionEvent>, event: SessionEvent) {
    let _ = events.send(event);
}

/// Builds the backend selected by `config.backend`.
pub async fn connect(config: &Config) -> Result<SharedBackend> {
    match config.backend {
        BackendKind::Database => {
            let backend =
                DatabaseBackend::connect(&config.database_url, config.session_ttl_hours).await?;
            Ok(Arc::new(backend))
        }
        BackendKind::Supabase => {
            let (Some(url), Some(key)) = (&config.supabase_url, &config.supabase_anon_key) else {
                return Err(JournalError::Config(
                    "SUPABASE_URL and SUPABASE_ANON_KEY are required".to_string(),
                ));
            };
            Ok(Arc::new(SupabaseBackend::new(url.clone(), key.clone())?))
        }
    }
}
