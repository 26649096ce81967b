use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type TradeId = Uuid;
pub type StrategyId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Buy,
    Sell,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Buy, Side::Sell];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(format!("unknown side: {}", other)),
        }
    }
}

/// How the trader felt when taking the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmotionalState {
    #[default]
    Neutral,
    Greed,
    Fear,
    Confidence,
    Frustration,
}

impl EmotionalState {
    pub const ALL: [EmotionalState; 5] = [
        EmotionalState::Neutral,
        EmotionalState::Greed,
        EmotionalState::Fear,
        EmotionalState::Confidence,
        EmotionalState::Frustration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionalState::Neutral => "Neutral",
            EmotionalState::Greed => "Greed",
            EmotionalState::Fear => "Fear",
            EmotionalState::Confidence => "Confidence",
            EmotionalState::Frustration => "Frustration",
        }
    }

    /// Reads a stored tag. Missing, blank and unrecognized tags yield `None`.
    pub fn from_tag(tag: Option<&str>) -> Option<Self> {
        tag.map(str::trim)
            .filter(|t| !t.is_empty())
            .and_then(|t| t.parse().ok())
    }
}

impl fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionalState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown emotional state: {}", needle))
    }
}

/// Checkbox categories that make up a trade's market label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MarketCategory {
    Stock,
    Crypto,
    Forex,
    Futures,
}

impl MarketCategory {
    pub const ALL: [MarketCategory; 4] = [
        MarketCategory::Stock,
        MarketCategory::Crypto,
        MarketCategory::Forex,
        MarketCategory::Futures,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketCategory::Stock => "stock",
            MarketCategory::Crypto => "crypto",
            MarketCategory::Forex => "forex",
            MarketCategory::Futures => "futures",
        }
    }

    /// Joins the checked categories in declaration order, e.g. `"stock, crypto"`.
    /// Returns `None` when nothing is checked.
    pub fn label(checked: &[MarketCategory]) -> Option<String> {
        let parts: Vec<&str> = Self::ALL
            .iter()
            .filter(|c| checked.contains(c))
            .map(|c| c.as_str())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

impl FromStr for MarketCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown market: {}", needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub user_id: UserId,
    pub strategy_id: Option<StrategyId>,
    pub symbol: String,
    pub side: Side,
    pub market: Option<String>,
    pub quantity: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub trade_date: NaiveDate,
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,
    pub emotional_state: Option<EmotionalState>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Trade {
    /// Realized P&L with a missing value counted as zero.
    pub fn pnl_or_zero(&self) -> Decimal {
        self.pnl.unwrap_or(Decimal::ZERO)
    }

    /// Emotional state with a missing value counted as Neutral.
    pub fn emotion(&self) -> EmotionalState {
        self.emotional_state.unwrap_or_default()
    }
}

/// A trade as submitted by the trade form, before the backend assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDraft {
    pub strategy_id: Option<StrategyId>,
    pub symbol: String,
    pub side: Side,
    pub market: Option<String>,
    pub quantity: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub trade_date: NaiveDate,
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,
    pub emotional_state: EmotionalState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: StrategyId,
    pub user_id: UserId,
    pub name: String,
    pub rules: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDraft {
    pub name: String,
    pub rules: Vec<String>,
}

/// The signed-in user as seen by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub email: Option<String>,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Optional filters applied on top of the mandatory owner filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeFilter {
    pub date_range: Option<DateRange>,
    pub strategy_id: Option<StrategyId>,
}

impl TradeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn for_strategy(mut self, strategy_id: StrategyId) -> Self {
        self.strategy_id = Some(strategy_id);
        self
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        let in_range = self
            .date_range
            .map(|r| r.contains(trade.trade_date))
            .unwrap_or(true);
        let in_strategy = self
            .strategy_id
            .map(|id| trade.strategy_id == Some(id))
            .unwrap_or(true);
        in_range && in_strategy
    }
}

/// Notification emitted whenever a session starts or ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { user_id: UserId },
    SignedOut { user_id: UserId },
}
