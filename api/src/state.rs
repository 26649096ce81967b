use chrono::NaiveDate;
use chrono_tz::Tz;
use shared::calendar::today_in;
use shared::{Config, SharedBackend};

/// Application context built once in `main` and handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub backend: SharedBackend,
    pub timezone: Tz,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(backend: SharedBackend, config: &Config) -> Self {
        Self {
            backend,
            timezone: config.timezone,
            cookie_secure: config.cookie_secure,
        }
    }

    pub fn today(&self) -> NaiveDate {
        today_in(self.timezone)
    }
}
