//! Askama page templates and the view models they render.
//!
//! Every value a template prints is formatted here, so templates only
//! branch and loop.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::{Datelike, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use shared::calendar::{CalendarGrid, Month, WEEKDAYS};
use shared::forms::TradeForm;
use shared::stats::{
    format_currency, group_by_emotion, resolve_day_detail, summarize, DayDetail, DayTone,
    TradeSummary,
};
use shared::{EmotionalState, MarketCategory, Side, Strategy, StrategyId, Trade, TradeFilter};

use crate::error::AppError;

/// Renders `template` with the given status.
pub fn page<T: Template>(status: StatusCode, template: &T) -> Result<Response, AppError> {
    Ok((status, Html(template.render()?)).into_response())
}

fn pnl_class(pnl: Decimal) -> &'static str {
    DayTone::from_pnl(pnl).css_class()
}

fn format_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_optional(value: Option<Decimal>) -> String {
    value.map(|v| v.normalize().to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub signed_in_as: Option<String>,
    pub status: u16,
    pub reason: &'static str,
    pub message: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub signed_in_as: Option<String>,
    pub email: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub signed_in_as: Option<String>,
    pub email: String,
    pub error: Option<String>,
}

pub struct EmotionRow {
    pub label: &'static str,
    pub count: usize,
    pub percent: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub signed_in_as: Option<String>,
    pub total_pnl: String,
    pub total_pnl_class: &'static str,
    pub win_rate: String,
    pub profit_factor: String,
    pub total_trades: u64,
    pub emotions: Vec<EmotionRow>,
}

impl DashboardPage {
    /// `total_trades` comes from the count query, not from `trades.len()`.
    pub fn new(signed_in_as: Option<String>, trades: &[Trade], total_trades: u64) -> Self {
        let summary = summarize(trades);
        let emotions = group_by_emotion(trades)
            .into_iter()
            .map(|share| EmotionRow {
                label: share.state.as_str(),
                count: share.count,
                percent: format!("{:.1}", share.percent),
            })
            .collect();

        Self {
            signed_in_as,
            total_pnl: format_currency(summary.total_pnl),
            total_pnl_class: pnl_class(summary.total_pnl),
            win_rate: summary.win_rate.to_string(),
            profit_factor: summary.profit_factor.to_string(),
            total_trades,
            emotions,
        }
    }
}

pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "log_trade.html")]
pub struct LogTradePage {
    pub signed_in_as: Option<String>,
    pub form: TradeForm,
    pub markets: Vec<SelectOption>,
    pub strategies: Vec<SelectOption>,
    pub sides: Vec<SelectOption>,
    pub emotions: Vec<SelectOption>,
    pub error: Option<String>,
}

impl LogTradePage {
    pub fn new(
        signed_in_as: Option<String>,
        form: TradeForm,
        strategies: &[Strategy],
        error: Option<String>,
    ) -> Self {
        let markets = MarketCategory::ALL
            .iter()
            .map(|category| SelectOption {
                value: category.as_str().to_string(),
                label: capitalize(category.as_str()),
                selected: form.is_market_checked(*category),
            })
            .collect();

        let chosen = form.strategy_id.trim();
        let mut strategy_options = vec![SelectOption {
            value: "none".to_string(),
            label: "None".to_string(),
            selected: chosen.is_empty() || chosen.eq_ignore_ascii_case("none"),
        }];
        strategy_options.extend(strategies.iter().map(|s| SelectOption {
            value: s.id.to_string(),
            label: s.name.clone(),
            selected: s.id.to_string() == chosen,
        }));

        let side = form.side.parse::<Side>().unwrap_or_default();
        let sides = Side::ALL
            .iter()
            .map(|s| SelectOption {
                value: s.as_str().to_string(),
                label: s.as_str().to_string(),
                selected: *s == side,
            })
            .collect();

        let emotion = EmotionalState::from_tag(Some(&form.emotional_state)).unwrap_or_default();
        let emotions = EmotionalState::ALL
            .iter()
            .map(|e| SelectOption {
                value: e.as_str().to_string(),
                label: e.as_str().to_string(),
                selected: *e == emotion,
            })
            .collect();

        Self {
            signed_in_as,
            form,
            markets,
            strategies: strategy_options,
            sides,
            emotions,
            error,
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One trade as shown in the calendar day panel.
pub struct TradeRow {
    pub symbol: String,
    pub side: &'static str,
    pub market: String,
    pub strategy: String,
    pub quantity: String,
    pub stop_loss: String,
    pub take_profit: String,
    pub pnl: String,
    pub pnl_class: &'static str,
    pub entry_time: String,
    pub exit_time: String,
    pub emotion: &'static str,
}

impl TradeRow {
    pub fn new(trade: &Trade, strategies: &[Strategy]) -> Self {
        let strategy = trade
            .strategy_id
            .and_then(|id| strategies.iter().find(|s| s.id == id))
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "-".to_string());

        Self {
            symbol: trade.symbol.clone(),
            side: trade.side.as_str(),
            market: trade.market.clone().unwrap_or_else(|| "-".to_string()),
            strategy,
            quantity: trade.quantity.normalize().to_string(),
            stop_loss: format_optional(trade.stop_loss),
            take_profit: format_optional(trade.take_profit),
            pnl: format_currency(trade.pnl_or_zero()),
            pnl_class: pnl_class(trade.pnl_or_zero()),
            entry_time: format_time(trade.entry_time),
            exit_time: format_time(trade.exit_time),
            emotion: trade.emotion().as_str(),
        }
    }
}

pub struct DayCell {
    pub day: u32,
    pub date: String,
    pub trade_count: usize,
    pub pnl: String,
    pub tone: &'static str,
    pub is_today: bool,
    pub is_selected: bool,
}

pub struct DayPanel {
    pub title: String,
    /// `none`, `single` or `multiple`
    pub kind: &'static str,
    pub trades: Vec<TradeRow>,
}

#[derive(Template)]
#[template(path = "calendar.html")]
pub struct CalendarPage {
    pub signed_in_as: Option<String>,
    pub title: String,
    pub month: String,
    pub previous_month: String,
    pub next_month: String,
    pub weekdays: [&'static str; 7],
    pub weeks: Vec<Vec<Option<DayCell>>>,
    pub month_pnl: String,
    pub month_pnl_class: &'static str,
    pub month_trades: usize,
    pub panel: Option<DayPanel>,
}

impl CalendarPage {
    pub fn new(
        signed_in_as: Option<String>,
        month: Month,
        trades: &[Trade],
        strategies: &[Strategy],
        today: NaiveDate,
        selected: Option<NaiveDate>,
    ) -> Self {
        let grid = CalendarGrid::build(month, trades, today);
        let weeks = grid
            .weeks
            .iter()
            .map(|week| {
                week.iter()
                    .map(|cell| {
                        cell.as_ref().map(|c| DayCell {
                            day: c.date.day(),
                            date: c.date.format("%Y-%m-%d").to_string(),
                            trade_count: c.trade_count,
                            pnl: format_currency(c.pnl),
                            tone: c.tone.css_class(),
                            is_today: c.is_today,
                            is_selected: Some(c.date) == selected,
                        })
                    })
                    .collect()
            })
            .collect();

        let summary = summarize(trades);
        let panel = selected.map(|date| {
            let on_day: Vec<Trade> = trades
                .iter()
                .filter(|t| t.trade_date == date)
                .cloned()
                .collect();
            let (kind, shown) = match resolve_day_detail(&on_day) {
                DayDetail::None => ("none", Vec::new()),
                DayDetail::Single(trade) => ("single", vec![trade]),
                DayDetail::Multiple(many) => ("multiple", many),
            };
            DayPanel {
                title: date.format("%A, %B %-d, %Y").to_string(),
                kind,
                trades: shown.iter().map(|t| TradeRow::new(t, strategies)).collect(),
            }
        });

        Self {
            signed_in_as,
            title: month.title(),
            month: month.to_string(),
            previous_month: month.previous().to_string(),
            next_month: month.next().to_string(),
            weekdays: WEEKDAYS,
            weeks,
            month_pnl: format_currency(summary.total_pnl),
            month_pnl_class: pnl_class(summary.total_pnl),
            month_trades: summary.trade_count,
            panel,
        }
    }
}

pub struct StrategyCard {
    pub id: String,
    pub name: String,
    pub win_rate: String,
    pub profit_factor: String,
    pub net_pnl: String,
    pub net_pnl_class: &'static str,
    pub trades: usize,
    pub rules: Vec<String>,
}

impl StrategyCard {
    fn new(strategy: &Strategy, summary: TradeSummary) -> Self {
        Self {
            id: strategy.id.to_string(),
            name: strategy.name.clone(),
            win_rate: summary.win_rate.to_string(),
            profit_factor: summary.profit_factor.to_string(),
            net_pnl: format_currency(summary.total_pnl),
            net_pnl_class: pnl_class(summary.total_pnl),
            trades: summary.trade_count,
            rules: strategy.rules.clone(),
        }
    }
}

/// Per-strategy summaries over one trade listing.
pub fn strategy_cards(strategies: &[Strategy], trades: &[Trade]) -> Vec<StrategyCard> {
    strategies
        .iter()
        .map(|strategy| {
            let tagged = trades_for(strategy.id, trades);
            StrategyCard::new(strategy, summarize(&tagged))
        })
        .collect()
}

fn trades_for(id: StrategyId, trades: &[Trade]) -> Vec<Trade> {
    let filter = TradeFilter::all().for_strategy(id);
    trades.iter().filter(|t| filter.matches(t)).cloned().collect()
}

#[derive(Template)]
#[template(path = "strategies.html")]
pub struct StrategiesPage {
    pub signed_in_as: Option<String>,
    pub cards: Vec<StrategyCard>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "strategy_create.html")]
pub struct StrategyCreatePage {
    pub signed_in_as: Option<String>,
    pub name: String,
    pub rules: Vec<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn trade(strategy_id: Option<StrategyId>, pnl: i64) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            strategy_id,
            symbol: "ES".to_string(),
            side: Side::Buy,
            market: Some("futures".to_string()),
            quantity: Decimal::from(2),
            stop_loss: None,
            take_profit: None,
            pnl: Some(Decimal::from(pnl)),
            trade_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            entry_time: NaiveTime::from_hms_opt(9, 30, 0),
            exit_time: None,
            emotional_state: None,
            created_at: None,
        }
    }

    #[test]
    fn test_strategy_cards_only_count_tagged_trades() {
        let strategy = Strategy {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: "Opening range".to_string(),
            rules: vec!["First 15 minutes only".to_string()],
            created_at: None,
        };
        let trades = vec![
            trade(Some(strategy.id), 30),
            trade(Some(strategy.id), -10),
            trade(None, 500),
        ];

        let cards = strategy_cards(&[strategy], &trades);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].trades, 2);
        assert_eq!(cards[0].net_pnl, "$20.00");
        assert_eq!(cards[0].profit_factor, "3.00");
        assert_eq!(cards[0].win_rate, "50.0");
    }

    #[test]
    fn test_trade_row_formatting() {
        let row = TradeRow::new(&trade(None, -7), &[]);
        assert_eq!(row.pnl, "-$7.00");
        assert_eq!(row.pnl_class, "negative");
        assert_eq!(row.entry_time, "09:30");
        assert_eq!(row.exit_time, "-");
        assert_eq!(row.strategy, "-");
        assert_eq!(row.emotion, "Neutral");
    }

    #[test]
    fn test_log_trade_page_preselects_form_values() {
        let mut form = TradeForm::blank(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        form.side = "Sell".to_string();
        form.market = vec!["forex".to_string()];

        let page = LogTradePage::new(None, form, &[], None);
        let selected_side: Vec<&str> = page
            .sides
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(selected_side, vec!["Sell"]);
        assert!(page.markets.iter().any(|m| m.value == "forex" && m.selected));
        assert!(page.strategies[0].selected);
    }
}
