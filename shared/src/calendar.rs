//! Month navigation and the Sunday-first calendar grid.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;

use crate::models::{DateRange, Trade};
use crate::stats::{group_by_day, DayTone};

pub const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Current calendar day in the given time zone.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// A calendar month, stored as its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    first: NaiveDate,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.checked_sub_days(Days::new(1)))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn previous(&self) -> Self {
        Self {
            first: self
                .first
                .checked_sub_months(Months::new(1))
                .unwrap_or(self.first),
        }
    }

    pub fn next(&self) -> Self {
        Self {
            first: self
                .first
                .checked_add_months(Months::new(1))
                .unwrap_or(self.first),
        }
    }

    /// Inclusive range from the first to the last day of the month.
    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.first_day(), self.last_day())
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let month = self.month();
        self.first.iter_days().take_while(move |d| d.month() == month)
    }

    /// e.g. `March 2024`
    pub fn title(&self) -> String {
        self.first.format("%B %Y").to_string()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first.format("%Y-%m"))
    }
}

impl FromStr for Month {
    type Err = String;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map(|first| Self { first })
            .map_err(|_| format!("invalid month: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub trade_count: usize,
    pub pnl: Decimal,
    pub tone: DayTone,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarGrid {
    pub month: Month,
    /// Rows of seven cells; `None` pads days outside the month.
    pub weeks: Vec<Vec<Option<CalendarCell>>>,
}

impl CalendarGrid {
    /// Lays out `month` with per-day totals. Trades outside the month are ignored.
    pub fn build(month: Month, trades: &[Trade], today: NaiveDate) -> Self {
        let range = month.date_range();
        let in_month: Vec<Trade> = trades
            .iter()
            .filter(|t| range.contains(t.trade_date))
            .cloned()
            .collect();
        let buckets = group_by_day(&in_month);

        let leading = month.first_day().weekday().num_days_from_sunday() as usize;
        let mut cells: Vec<Option<CalendarCell>> = vec![None; leading];

        for date in month.days() {
            let bucket = buckets.iter().find(|b| b.date == date);
            cells.push(Some(CalendarCell {
                date,
                trade_count: bucket.map(|b| b.trades.len()).unwrap_or(0),
                pnl: bucket.map(|b| b.pnl).unwrap_or(Decimal::ZERO),
                tone: bucket.map(|b| b.tone).unwrap_or(DayTone::Neutral),
                is_today: date == today,
            }));
        }

        while cells.len() % 7 != 0 {
            cells.push(None);
        }

        let weeks = cells.chunks(7).map(|week| week.to_vec()).collect();
        Self { month, weeks }
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.weeks
            .iter()
            .flatten()
            .flatten()
            .find(|cell| cell.date == date)
    }
}
