use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::NaiveDate;
use serde::Deserialize;
use shared::calendar::Month;
use shared::TradeFilter;
use tracing::debug;

use crate::error::AppError;
use crate::session::CurrentSession;
use crate::state::AppState;
use crate::views::{page, CalendarPage};

#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    /// `YYYY-MM`
    pub month: Option<String>,
    /// `YYYY-MM-DD`
    pub day: Option<String>,
}

impl CalendarQuery {
    fn selected_day(&self) -> Option<NaiveDate> {
        let raw = self.day.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }

    /// Explicit month first, then the selected day's month, then today's.
    fn month(&self, today: NaiveDate) -> Month {
        if let Some(raw) = self.month.as_deref().filter(|m| !m.trim().is_empty()) {
            match raw.parse::<Month>() {
                Ok(month) => return month,
                Err(e) => debug!("Ignoring month parameter: {}", e),
            }
        }
        Month::containing(self.selected_day().unwrap_or(today))
    }
}

pub async fn show(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<CalendarQuery>,
) -> Result<Response, AppError> {
    let today = state.today();
    let month = query.month(today);
    let selected = query
        .selected_day()
        .filter(|day| month.date_range().contains(*day));

    let filter = TradeFilter::all().between(month.date_range());
    let trades = state.backend.list_trades(&session, &filter).await?;
    let strategies = state.backend.list_strategies(&session).await?;

    page(
        StatusCode::OK,
        &CalendarPage::new(session.email, month, &trades, &strategies, today, selected),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_month_defaults_to_today() {
        let query = CalendarQuery::default();
        assert_eq!(query.month(today()), Month::new(2024, 6).unwrap());
    }

    #[test]
    fn test_month_follows_selected_day() {
        let query = CalendarQuery {
            month: None,
            day: Some("2023-12-31".to_string()),
        };
        assert_eq!(query.month(today()), Month::new(2023, 12).unwrap());
    }

    #[test]
    fn test_bad_month_falls_back() {
        let query = CalendarQuery {
            month: Some("june".to_string()),
            day: None,
        };
        assert_eq!(query.month(today()), Month::new(2024, 6).unwrap());
    }
}
