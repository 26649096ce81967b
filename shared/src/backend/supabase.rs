//! Hosted backend: PostgREST tables and GoTrue auth over HTTP.
//!
//! Every table request carries the signed-in user's access token, so the
//! service's row-level security policies apply on top of the `user_id`
//! filters issued here.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{publish, session_channel, JournalBackend};
use crate::error::{JournalError, Result};
use crate::models::{
    EmotionalState, Session, SessionEvent, Strategy, StrategyDraft, StrategyId, Trade,
    TradeDraft, TradeFilter, UserId,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct SupabaseBackend {
    http: Client,
    base_url: String,
    anon_key: String,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthUser {
    id: Uuid,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignUpResponse {
    id: Option<Uuid>,
    user: Option<AuthUser>,
}

#[derive(Debug, Deserialize)]
struct TradeRow {
    id: Uuid,
    user_id: Uuid,
    #[serde(default)]
    strategy_id: Option<Uuid>,
    symbol: String,
    #[serde(default)]
    side: Option<String>,
    #[serde(default)]
    market: Option<String>,
    #[serde(default)]
    quantity: Option<Decimal>,
    #[serde(default)]
    stop_loss: Option<Decimal>,
    #[serde(default)]
    take_profit: Option<Decimal>,
    #[serde(default)]
    pnl: Option<Decimal>,
    trade_date: NaiveDate,
    #[serde(default)]
    entry_time: Option<String>,
    #[serde(default)]
    exit_time: Option<String>,
    #[serde(default)]
    emotional_state: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<TradeRow> for Trade {
    fn from(row: TradeRow) -> Self {
        Trade {
            id: row.id,
            user_id: row.user_id,
            strategy_id: row.strategy_id,
            symbol: row.symbol,
            side: row
                .side
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            market: row.market.filter(|m| !m.trim().is_empty()),
            quantity: row.quantity.unwrap_or(Decimal::ZERO),
            stop_loss: row.stop_loss,
            take_profit: row.take_profit,
            pnl: row.pnl,
            trade_date: row.trade_date,
            entry_time: row.entry_time.as_deref().and_then(parse_time),
            exit_time: row.exit_time.as_deref().and_then(parse_time),
            emotional_state: EmotionalState::from_tag(row.emotional_state.as_deref()),
            created_at: row.created_at,
        }
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

#[derive(Debug, Serialize)]
struct TradeInsert<'a> {
    user_id: Uuid,
    strategy_id: Option<Uuid>,
    symbol: &'a str,
    side: &'static str,
    market: Option<&'a str>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    quantity: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    stop_loss: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    take_profit: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    pnl: Option<Decimal>,
    trade_date: NaiveDate,
    entry_time: Option<NaiveTime>,
    exit_time: Option<NaiveTime>,
    emotional_state: &'static str,
}

#[derive(Debug, Deserialize)]
struct StrategyRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    #[serde(default)]
    rules: Option<Vec<String>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<StrategyRow> for Strategy {
    fn from(row: StrategyRow) -> Self {
        Strategy {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            rules: row.rules.unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct StrategyInsert<'a> {
    user_id: Uuid,
    name: &'a str,
    rules: &'a [String],
}

/// PostgREST query pairs for a user's trades.
pub(crate) fn trade_query(user_id: UserId, filter: &TradeFilter) -> Vec<(String, String)> {
    let mut query = vec![
        ("select".to_string(), "*".to_string()),
        ("user_id".to_string(), format!("eq.{}", user_id)),
    ];
    if let Some(range) = filter.date_range {
        query.push(("trade_date".to_string(), format!("gte.{}", range.start)));
        query.push(("trade_date".to_string(), format!("lte.{}", range.end)));
    }
    if let Some(strategy_id) = filter.strategy_id {
        query.push(("strategy_id".to_string(), format!("eq.{}", strategy_id)));
    }
    query.push(("order".to_string(), "trade_date.asc,created_at.asc".to_string()));
    query
}

/// Total from `Content-Range: 0-24/100` or `*/0`.
pub(crate) fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

/// Picks the human-readable message out of a GoTrue/PostgREST error body.
pub(crate) fn service_error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        ["msg", "message", "error_description", "error"]
            .iter()
            .find_map(|key| json.get(key).and_then(Value::as_str).map(str::to_string))
    });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => format!("request failed with status {}", status),
        None => format!("request failed with status {}: {}", status, body.trim()),
    }
}

/// Confirm-email projects answer with the user, others with a session wrapping it.
pub(crate) fn signed_up_user_id(body: SignUpResponse) -> Result<UserId> {
    body.user
        .map(|u| u.id)
        .or(body.id)
        .ok_or_else(|| JournalError::Backend("sign-up response had no user id".to_string()))
}

/// RLS hides foreign rows, so an empty representation means nothing of ours matched.
pub(crate) fn ensure_deleted(rows: &[Value]) -> Result<()> {
    if rows.is_empty() {
        return Err(JournalError::NotFound);
    }
    Ok(())
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = service_error_message(status, &body);
    warn!("Supabase request failed ({}): {}", status, message);
    Err(JournalError::Backend(message))
}

impl SupabaseBackend {
    pub fn new(base_url: String, anon_key: String) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            events: session_channel(),
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn with_key(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    fn as_user(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        self.with_key(builder).bearer_auth(&session.access_token)
    }

    async fn fetch_user(&self, token: &str) -> Result<AuthUser> {
        let response = self
            .with_key(self.http.get(self.auth_url("user")))
            .bearer_auth(token)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }
}

#[async_trait]
impl JournalBackend for SupabaseBackend {
    async fn get_session(&self, token: &str) -> Option<Session> {
        match self.fetch_user(token).await {
            Ok(user) => Some(Session {
                user_id: user.id,
                email: user.email,
                access_token: token.to_string(),
                expires_at: None,
            }),
            Err(e) => {
                debug!("Token not accepted by auth service: {}", e);
                None
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .with_key(self.http.post(self.auth_url("token")))
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email.trim(), "password": password }))
            .send()
            .await?;
        let token: TokenResponse = ensure_success(response).await?.json().await?;

        info!("User {} signed in", token.user.id);
        publish(
            &self.events,
            SessionEvent::SignedIn {
                user_id: token.user.id,
            },
        );

        Ok(Session {
            user_id: token.user.id,
            email: token.user.email,
            access_token: token.access_token,
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId> {
        let response = self
            .with_key(self.http.post(self.auth_url("signup")))
            .json(&serde_json::json!({ "email": email.trim(), "password": password }))
            .send()
            .await?;
        let body: SignUpResponse = ensure_success(response).await?.json().await?;
        signed_up_user_id(body)
    }

    async fn sign_out(&self, session: &Session) {
        let result = self
            .as_user(self.http.post(self.auth_url("logout")), session)
            .send()
            .await;
        match result {
            Ok(response) => {
                if let Err(e) = ensure_success(response).await {
                    warn!("Failed to revoke session for user {}: {}", session.user_id, e);
                }
            }
            Err(e) => warn!("Failed to revoke session for user {}: {}", session.user_id, e),
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
        let response = self
            .as_user(self.http.get(self.rest_url("trades")), session)
            .query(&trade_query(session.user_id, filter))
            .send()
            .await?;
        let rows: Vec<TradeRow> = ensure_success(response).await?.json().await?;
        Ok(rows.into_iter().map(Trade::from).collect())
    }

    async fn count_trades(&self, session: &Session) -> Result<u64> {
        let response = self
            .as_user(self.http.head(self.rest_url("trades")), session)
            .query(&[("select", "id".to_string()), ("user_id", format!("eq.{}", session.user_id))])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = ensure_success(response).await?;

        response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| JournalError::Backend("count response had no Content-Range".to_string()))
    }

    async fn insert_trade(&self, session: &Session, draft: TradeDraft) -> Result<Trade> {
        let payload = TradeInsert {
            user_id: session.user_id,
            strategy_id: draft.strategy_id,
            symbol: &draft.symbol,
            side: draft.side.as_str(),
            market: draft.market.as_deref(),
            quantity: draft.quantity,
            stop_loss: draft.stop_loss,
            take_profit: draft.take_profit,
            pnl: draft.pnl,
            trade_date: draft.trade_date,
            entry_time: draft.entry_time,
            exit_time: draft.exit_time,
            emotional_state: draft.emotional_state.as_str(),
        };

        let response = self
            .as_user(self.http.post(self.rest_url("trades")), session)
            .header("Prefer", "return=representation")
            .json(&payload)
            .send()
            .await?;
        let rows: Vec<TradeRow> = ensure_success(response).await?.json().await?;

        rows.into_iter()
            .next()
            .map(Trade::from)
            .ok_or_else(|| JournalError::Backend("insert returned no row".to_string()))
    }

    async fn list_strategies(&self, session: &Session) -> Result<Vec<Strategy>> {
        let response = self
            .as_user(self.http.get(self.rest_url("strategies")), session)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", session.user_id)),
                ("order", "created_at.asc".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<StrategyRow> = ensure_success(response).await?.json().await?;
        Ok(rows.into_iter().map(Strategy::from).collect())
    }

    async fn insert_strategy(&self, session: &Session, draft: StrategyDraft) -> Result<Strategy> {
        let payload = StrategyInsert {
            user_id: session.user_id,
            name: &draft.name,
            rules: &draft.rules,
        };

        let response = self
            .as_user(self.http.post(self.rest_url("strategies")), session)
            .header("Prefer", "return=representation")
            .json(&payload)
            .send()
            .await?;
        let rows: Vec<StrategyRow> = ensure_success(response).await?.json().await?;

        rows.into_iter()
            .next()
            .map(Strategy::from)
            .ok_or_else(|| JournalError::Backend("insert returned no row".to_string()))
    }

    async fn delete_strategy(&self, session: &Session, id: StrategyId) -> Result<()> {
        let response = self
            .as_user(self.http.delete(self.rest_url("strategies")), session)
            .query(&[
                ("id", format!("eq.{}", id)),
                ("user_id", format!("eq.{}", session.user_id)),
            ])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let rows: Vec<Value> = ensure_success(response).await?.json().await?;
        ensure_deleted(&rows)
    }
}
