//! Trade statistics shared by the dashboard, calendar and strategy views.
//!
//! Every function here is pure: it takes an already-fetched slice of trades,
//! never mutates it, and accepts empty input and missing P&L values.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{EmotionalState, Trade};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Sums without panicking; stored values can be arbitrarily large.
fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

/// Share of winning trades (`pnl > 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinRate {
    pub wins: usize,
    pub total: usize,
}

impl WinRate {
    /// Percentage rounded to one decimal place; zero when there are no trades.
    pub fn percent(&self) -> Decimal {
        if self.total == 0 {
            return Decimal::ZERO;
        }
        round_half_up(Decimal::from(self.wins) * HUNDRED / Decimal::from(self.total), 1)
    }
}

impl fmt::Display for WinRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            f.write_str("0")
        } else {
            write!(f, "{:.1}", self.percent())
        }
    }
}

/// Gross profit over absolute gross loss.
///
/// The zero-denominator cases are explicit variants so no view ever shows a
/// made-up ratio:
/// - `NoProfit` when nothing was won (including no trades at all),
/// - `Infinite` when something was won and nothing was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfitFactor {
    NoProfit,
    Infinite,
    Ratio(Decimal),
}

impl ProfitFactor {
    /// `gross_loss` is the absolute value of the summed losses.
    pub fn from_gross(gross_profit: Decimal, gross_loss: Decimal) -> Self {
        if gross_profit <= Decimal::ZERO {
            ProfitFactor::NoProfit
        } else if gross_loss.is_zero() {
            ProfitFactor::Infinite
        } else {
            ProfitFactor::Ratio(
                gross_profit
                    .checked_div(gross_loss.abs())
                    .unwrap_or(Decimal::MAX),
            )
        }
    }

    pub fn ratio(&self) -> Option<Decimal> {
        match self {
            ProfitFactor::Ratio(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfitFactor::NoProfit => f.write_str("0"),
            ProfitFactor::Infinite => f.write_str("Infinite"),
            ProfitFactor::Ratio(value) => write!(f, "{:.2}", round_half_up(*value, 2)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeSummary {
    pub trade_count: usize,
    pub total_pnl: Decimal,
    pub gross_profit: Decimal,
    /// Absolute value of the summed losing P&L.
    pub gross_loss: Decimal,
    pub win_rate: WinRate,
    pub profit_factor: ProfitFactor,
}

pub fn summarize(trades: &[Trade]) -> TradeSummary {
    let mut total_pnl = Decimal::ZERO;
    let mut gross_profit = Decimal::ZERO;
    let mut gross_loss = Decimal::ZERO;
    let mut wins = 0;

    for pnl in trades.iter().map(Trade::pnl_or_zero) {
        total_pnl = total_pnl.saturating_add(pnl);
        if pnl > Decimal::ZERO {
            gross_profit = gross_profit.saturating_add(pnl);
            wins += 1;
        } else if pnl < Decimal::ZERO {
            gross_loss = gross_loss.saturating_add(pnl.abs());
        }
    }

    TradeSummary {
        trade_count: trades.len(),
        total_pnl,
        gross_profit,
        gross_loss,
        win_rate: WinRate {
            wins,
            total: trades.len(),
        },
        profit_factor: ProfitFactor::from_gross(gross_profit, gross_loss),
    }
}

/// Display class of a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayTone {
    Positive,
    Negative,
    Neutral,
}

impl DayTone {
    pub fn from_pnl(pnl: Decimal) -> Self {
        if pnl > Decimal::ZERO {
            DayTone::Positive
        } else if pnl < Decimal::ZERO {
            DayTone::Negative
        } else {
            DayTone::Neutral
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            DayTone::Positive => "positive",
            DayTone::Negative => "negative",
            DayTone::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub trades: Vec<Trade>,
    pub pnl: Decimal,
    pub tone: DayTone,
}

impl DayBucket {
    pub fn detail(&self) -> DayDetail {
        resolve_day_detail(&self.trades)
    }
}

/// Buckets trades by trade date, ascending. Trades keep their input order
/// inside a bucket.
pub fn group_by_day(trades: &[Trade]) -> Vec<DayBucket> {
    let mut days: BTreeMap<NaiveDate, Vec<Trade>> = BTreeMap::new();
    for trade in trades {
        days.entry(trade.trade_date).or_default().push(trade.clone());
    }

    days.into_iter()
        .map(|(date, trades)| {
            let pnl = saturating_sum(trades.iter().map(Trade::pnl_or_zero));
            DayBucket {
                date,
                trades,
                pnl,
                tone: DayTone::from_pnl(pnl),
            }
        })
        .collect()
}

/// What clicking a calendar day opens.
#[derive(Debug, Clone, PartialEq)]
pub enum DayDetail {
    None,
    Single(Trade),
    Multiple(Vec<Trade>),
}

pub fn resolve_day_detail(trades: &[Trade]) -> DayDetail {
    match trades {
        [] => DayDetail::None,
        [only] => DayDetail::Single(only.clone()),
        many => DayDetail::Multiple(many.to_vec()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionShare {
    pub state: EmotionalState,
    pub count: usize,
    /// Share of all trades, one decimal place.
    pub percent: Decimal,
}

/// Counts trades per emotional state in order of first appearance.
/// A missing state counts as Neutral.
pub fn group_by_emotion(trades: &[Trade]) -> Vec<EmotionShare> {
    let mut counts: Vec<(EmotionalState, usize)> = Vec::new();
    for state in trades.iter().map(Trade::emotion) {
        match counts.iter_mut().find(|(s, _)| *s == state) {
            Some((_, count)) => *count += 1,
            None => counts.push((state, 1)),
        }
    }

    let total = Decimal::from(trades.len().max(1));
    counts
        .into_iter()
        .map(|(state, count)| EmotionShare {
            state,
            count,
            percent: round_half_up(Decimal::from(count) * HUNDRED / total, 1),
        })
        .collect()
}

/// Renders `-$12.50` / `$3.00`. No thousands separators.
pub fn format_currency(value: Decimal) -> String {
    let rounded = round_half_up(value, 2);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    format!("{}${:.2}", sign, rounded.abs())
}
