//! Form payloads and their required-field checks.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{JournalError, Result};
use crate::models::{EmotionalState, MarketCategory, Side, StrategyDraft, TradeDraft};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Largest magnitude accepted for quantities and money fields.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

fn ensure_in_range(label: &str, value: Decimal) -> Result<Decimal> {
    if value.abs() > MAX_AMOUNT {
        return Err(JournalError::Validation(format!(
            "{} is out of range (max {})",
            label, MAX_AMOUNT
        )));
    }
    Ok(value)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TradeForm {
    #[serde(default)]
    pub market: Vec<String>,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub strategy_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub stop_loss: String,
    #[serde(default)]
    pub take_profit: String,
    #[serde(default)]
    pub pnl: String,
    #[serde(default)]
    pub entry_time: String,
    #[serde(default)]
    pub exit_time: String,
    #[serde(default)]
    pub emotional_state: String,
}

impl TradeForm {
    /// A blank form dated `today`.
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            date: today.format("%Y-%m-%d").to_string(),
            side: Side::Buy.as_str().to_string(),
            emotional_state: EmotionalState::Neutral.as_str().to_string(),
            ..Default::default()
        }
    }

    pub fn is_market_checked(&self, category: MarketCategory) -> bool {
        self.market
            .iter()
            .any(|m| m.trim().eq_ignore_ascii_case(category.as_str()))
    }

    pub fn to_draft(&self) -> Result<TradeDraft> {
        let symbol = self.symbol.trim();
        if symbol.is_empty() {
            return Err(JournalError::validation("Symbol is required"));
        }

        let trade_date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| JournalError::validation("Date is required (YYYY-MM-DD)"))?;

        let quantity = match self.quantity.trim() {
            "" => return Err(JournalError::validation("Quantity is required")),
            raw => Decimal::from_str(raw)
                .map_err(|_| JournalError::validation("Quantity must be a number"))
                .and_then(|q| ensure_in_range("Quantity", q))?,
        };

        let strategy_id = match self.strategy_id.trim() {
            "" => None,
            raw if raw.eq_ignore_ascii_case("none") => None,
            raw => Some(
                Uuid::parse_str(raw).map_err(|_| JournalError::validation("Unknown strategy"))?,
            ),
        };

        let checked: Vec<MarketCategory> = self
            .market
            .iter()
            .filter_map(|m| m.parse().ok())
            .collect();

        Ok(TradeDraft {
            strategy_id,
            symbol: symbol.to_string(),
            side: self.side.parse().unwrap_or_default(),
            market: MarketCategory::label(&checked),
            quantity,
            stop_loss: optional_decimal("Stop loss", &self.stop_loss)?,
            take_profit: optional_decimal("Take profit", &self.take_profit)?,
            pnl: optional_decimal("P&L", &self.pnl)?,
            trade_date,
            entry_time: optional_time("entry_time", &self.entry_time),
            exit_time: optional_time("exit_time", &self.exit_time),
            emotional_state: EmotionalState::from_tag(Some(&self.emotional_state))
                .unwrap_or_default(),
        })
    }
}

/// Blank means "not given"; anything unparseable is dropped with a warning.
/// A parseable value beyond `MAX_AMOUNT` is rejected.
fn optional_decimal(field: &str, raw: &str) -> Result<Option<Decimal>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match Decimal::from_str(raw) {
        Ok(value) => ensure_in_range(field, value).map(Some),
        Err(e) => {
            tracing::warn!("Ignoring malformed {} {:?}: {}", field, raw, e);
            Ok(None)
        }
    }
}

fn optional_time(field: &str, raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
    {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring malformed {} {:?}: {}", field, raw, e);
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StrategyForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rules: Vec<String>,
    /// `add_rule` asks for another empty rule row instead of submitting.
    #[serde(default)]
    pub action: String,
}

impl StrategyForm {
    pub fn wants_extra_rule(&self) -> bool {
        self.action == "add_rule"
    }

    /// Rule rows to render: the submitted ones, at least one.
    pub fn rule_rows(&self) -> Vec<String> {
        if self.rules.is_empty() {
            vec![String::new()]
        } else {
            self.rules.clone()
        }
    }

    pub fn to_draft(&self) -> Result<StrategyDraft> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(JournalError::validation("Strategy name is required"));
        }

        let rules = self
            .rules
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();

        Ok(StrategyDraft {
            name: name.to_string(),
            rules,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        self.email.trim()
    }

    pub fn validate_login(&self) -> Result<()> {
        if self.email().is_empty() || self.password.is_empty() {
            return Err(JournalError::validation("Email and password are required"));
        }
        Ok(())
    }

    pub fn validate_registration(&self) -> Result<()> {
        self.validate_login()?;
        if !self.email().contains('@') {
            return Err(JournalError::validation("Email address is not valid"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(JournalError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}
