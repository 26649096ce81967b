//! Self-hosted backend: journal tables, users and sessions through SeaORM.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{publish, session_channel, JournalBackend};
use crate::auth::{generate_token, hash_password, token_digest, verify_password};
use crate::database::connect_and_migrate;
use crate::entity::{sessions, strategies, trades, users};
use crate::error::{JournalError, Result};
use crate::models::{
    EmotionalState, Session, SessionEvent, Strategy, StrategyDraft, StrategyId, Trade,
    TradeDraft, TradeFilter, UserId,
};

pub struct DatabaseBackend {
    db: Arc<DatabaseConnection>,
    session_ttl: Duration,
    events: broadcast::Sender<SessionEvent>,
}

impl DatabaseBackend {
    pub fn new(db: Arc<DatabaseConnection>, session_ttl_hours: i64) -> Self {
        Self {
            db,
            session_ttl: Duration::hours(session_ttl_hours),
            events: session_channel(),
        }
    }

    /// Connects, migrates the schema and wraps the connection.
    pub async fn connect(database_url: &str, session_ttl_hours: i64) -> Result<Self> {
        let db = connect_and_migrate(database_url).await?;
        Ok(Self::new(Arc::new(db), session_ttl_hours))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(self.db.as_ref())
            .await?;
        Ok(user)
    }

    async fn lookup_session(&self, token: &str) -> Result<Option<Session>> {
        let digest = token_digest(token);
        let found = sessions::Entity::find_by_id(digest.clone())
            .find_also_related(users::Entity)
            .one(self.db.as_ref())
            .await?;

        let Some((row, user)) = found else {
            return Ok(None);
        };

        if row.expires_at <= Utc::now() {
            debug!("Removing expired session for user {}", row.user_id);
            sessions::Entity::delete_by_id(digest)
                .exec(self.db.as_ref())
                .await?;
            return Ok(None);
        }

        Ok(Some(Session {
            user_id: row.user_id,
            email: user.map(|u| u.email),
            access_token: token.to_string(),
            expires_at: Some(row.expires_at),
        }))
    }

    async fn ensure_strategy_owned(&self, session: &Session, id: StrategyId) -> Result<()> {
        let owned = strategies::Entity::find_by_id(id)
            .filter(strategies::Column::UserId.eq(session.user_id))
            .one(self.db.as_ref())
            .await?;
        match owned {
            Some(_) => Ok(()),
            None => Err(JournalError::validation("Unknown strategy")),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn parse_decimal(trade_id: Uuid, field: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| {
        JournalError::Backend(format!("trade {} has a corrupt {}: {}", trade_id, field, e))
    })
}

fn trade_from_model(model: trades::Model) -> Result<Trade> {
    let id = model.id;
    let optional = |field: &str, raw: Option<String>| -> Result<Option<Decimal>> {
        raw.map(|value| parse_decimal(id, field, &value)).transpose()
    };

    Ok(Trade {
        id,
        user_id: model.user_id,
        strategy_id: model.strategy_id,
        symbol: model.symbol,
        side: model.side.parse().unwrap_or_default(),
        market: model.market,
        quantity: parse_decimal(id, "quantity", &model.quantity)?,
        stop_loss: optional("stop_loss", model.stop_loss)?,
        take_profit: optional("take_profit", model.take_profit)?,
        pnl: optional("pnl", model.pnl)?,
        trade_date: model.trade_date,
        entry_time: model.entry_time,
        exit_time: model.exit_time,
        emotional_state: EmotionalState::from_tag(model.emotional_state.as_deref()),
        created_at: Some(model.created_at),
    })
}

fn strategy_from_model(model: strategies::Model) -> Result<Strategy> {
    let rules: Vec<String> = serde_json::from_str(&model.rules)?;
    Ok(Strategy {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        rules,
        created_at: Some(model.created_at),
    })
}

#[async_trait]
impl JournalBackend for DatabaseBackend {
    async fn get_session(&self, token: &str) -> Option<Session> {
        match self.lookup_session(token).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Session lookup failed, treating as signed out: {}", e);
                None
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let user = self
            .find_user_by_email(email)
            .await?
            .ok_or(JournalError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash, &user.password_salt) {
            return Err(JournalError::InvalidCredentials);
        }

        let token = generate_token();
        let now = Utc::now();
        let expires_at = now + self.session_ttl;
        sessions::ActiveModel {
            token_hash: ActiveValue::Set(token_digest(&token)),
            user_id: ActiveValue::Set(user.id),
            expires_at: ActiveValue::Set(expires_at),
            created_at: ActiveValue::Set(now),
        }
        .insert(self.db.as_ref())
        .await?;

        info!("User {} signed in", user.id);
        publish(&self.events, SessionEvent::SignedIn { user_id: user.id });

        Ok(Session {
            user_id: user.id,
            email: Some(user.email),
            access_token: token,
            expires_at: Some(expires_at),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId> {
        if self.find_user_by_email(email).await?.is_some() {
            return Err(JournalError::validation(
                "An account with this email already exists",
            ));
        }

        let (password_hash, password_salt) = hash_password(password);
        let user = users::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            email: ActiveValue::Set(normalize_email(email)),
            password_hash: ActiveValue::Set(password_hash),
            password_salt: ActiveValue::Set(password_salt),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await?;

        info!("Registered user {}", user.id);
        Ok(user.id)
    }

    async fn sign_out(&self, session: &Session) {
        let digest = token_digest(&session.access_token);
        if let Err(e) = sessions::Entity::delete_by_id(digest)
            .exec(self.db.as_ref())
            .await
        {
            warn!("Failed to revoke session for user {}: {}", session.user_id, e);
        }
        info!("User {} signed out", session.user_id);
        publish(
            &self.events,
            SessionEvent::SignedOut {
                user_id: session.user_id,
            },
        );
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn list_trades(&self, session: &Session, filter: &TradeFilter) -> Result<Vec<Trade>> {
        debug!("Listing trades for user {} with {:?}", session.user_id, filter);
        let mut query = trades::Entity::find().filter(trades::Column::UserId.eq(session.user_id));

        if let Some(range) = filter.date_range {
            query = query
                .filter(trades::Column::TradeDate.gte(range.start))
                .filter(trades::Column::TradeDate.lte(range.end));
        }
        if let Some(strategy_id) = filter.strategy_id {
            query = query.filter(trades::Column::StrategyId.eq(strategy_id));
        }

        query
            .order_by_asc(trades::Column::TradeDate)
            .order_by_asc(trades::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(trade_from_model)
            .collect()
    }

    async fn count_trades(&self, session: &Session) -> Result<u64> {
        let count = trades::Entity::find()
            .filter(trades::Column::UserId.eq(session.user_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn insert_trade(&self, session: &Session, draft: TradeDraft) -> Result<Trade> {
        if let Some(strategy_id) = draft.strategy_id {
            self.ensure_strategy_owned(session, strategy_id).await?;
        }

        let model = trades::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            user_id: ActiveValue::Set(session.user_id),
            strategy_id: ActiveValue::Set(draft.strategy_id),
            symbol: ActiveValue::Set(draft.symbol),
            side: ActiveValue::Set(draft.side.as_str().to_string()),
            market: ActiveValue::Set(draft.market),
            quantity: ActiveValue::Set(draft.quantity.to_string()),
            stop_loss: ActiveValue::Set(draft.stop_loss.map(|d| d.to_string())),
            take_profit: ActiveValue::Set(draft.take_profit.map(|d| d.to_string())),
            pnl: ActiveValue::Set(draft.pnl.map(|d| d.to_string())),
            trade_date: ActiveValue::Set(draft.trade_date),
            entry_time: ActiveValue::Set(draft.entry_time),
            exit_time: ActiveValue::Set(draft.exit_time),
            emotional_state: ActiveValue::Set(Some(draft.emotional_state.as_str().to_string())),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await?;

        debug!("Inserted trade {} for user {}", model.id, session.user_id);
        trade_from_model(model)
    }

    async fn list_strategies(&self, session: &Session) -> Result<Vec<Strategy>> {
        strategies::Entity::find()
            .filter(strategies::Column::UserId.eq(session.user_id))
            .order_by_asc(strategies::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(strategy_from_model)
            .collect()
    }

    async fn insert_strategy(&self, session: &Session, draft: StrategyDraft) -> Result<Strategy> {
        let model = strategies::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            user_id: ActiveValue::Set(session.user_id),
            name: ActiveValue::Set(draft.name),
            rules: ActiveValue::Set(serde_json::to_string(&draft.rules)?),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await?;

        debug!("Inserted strategy {} for user {}", model.id, session.user_id);
        strategy_from_model(model)
    }

    async fn delete_strategy(&self, session: &Session, id: StrategyId) -> Result<()> {
        let result = strategies::Entity::delete_many()
            .filter(strategies::Column::Id.eq(id))
            .filter(strategies::Column::UserId.eq(session.user_id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(JournalError::NotFound);
        }
        debug!("Deleted strategy {} for user {}", id, session.user_id);
        Ok(())
    }
}
