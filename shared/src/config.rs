use std::str::FromStr;

use chrono_tz::Tz;
use dotenv::dotenv;
use url::Url;

use crate::error::{JournalError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Self-hosted tables through SeaORM.
    Database,
    /// Hosted PostgREST + GoTrue service.
    Supabase,
}

impl FromStr for BackendKind {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "database" | "db" => Ok(BackendKind::Database),
            "supabase" => Ok(BackendKind::Supabase),
            other => Err(JournalError::Config(format!(
                "JOURNAL_BACKEND must be `database` or `supabase`, got `{}`",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub database_url: String,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub bind_addr: String,
    pub timezone: Tz,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: BackendKind::Database,
            database_url: "sqlite://verotrade.db?mode=rwc".to_string(),
            supabase_url: None,
            supabase_anon_key: None,
            bind_addr: "0.0.0.0:9999".to_string(),
            timezone: Tz::UTC,
            session_ttl_hours: 168,
            cookie_secure: false,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let backend = match lookup("JOURNAL_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.backend,
        };

        let timezone = match lookup("JOURNAL_TIMEZONE") {
            Some(raw) => raw.trim().parse::<Tz>().map_err(|e| {
                JournalError::Config(format!("JOURNAL_TIMEZONE `{}`: {}", raw, e))
            })?,
            None => defaults.timezone,
        };

        let session_ttl_hours = match lookup("SESSION_TTL_HOURS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or_else(|| {
                    JournalError::Config(format!(
                        "SESSION_TTL_HOURS must be a positive integer, got `{}`",
                        raw
                    ))
                })?,
            None => defaults.session_ttl_hours,
        };

        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| {
                JournalError::Config(format!("COOKIE_SECURE must be true or false, got `{}`", raw))
            })?,
            None => defaults.cookie_secure,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(JournalError::Config(format!(
                    "LOG_FORMAT must be `pretty` or `json`, got `{}`",
                    other
                )))
            }
        };

        let config = Config {
            backend,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            supabase_url: lookup("SUPABASE_URL")
                .map(|raw| parse_service_url(&raw))
                .transpose()?,
            supabase_anon_key: lookup("SUPABASE_ANON_KEY"),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            timezone,
            session_ttl_hours,
            cookie_secure,
            log_format,
        };

        if config.backend == BackendKind::Supabase
            && (config.supabase_url.is_none() || config.supabase_anon_key.is_none())
        {
            return Err(JournalError::Config(
                "SUPABASE_URL and SUPABASE_ANON_KEY are required for the supabase backend"
                    .to_string(),
            ));
        }

        Ok(config)
    }
}

/// Accepts an absolute http(s) URL and drops the trailing slash.
fn parse_service_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| {
        JournalError::Config(format!("SUPABASE_URL is not a valid URL (`{}`): {}", trimmed, e))
    })?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(JournalError::Config(format!(
            "SUPABASE_URL must be an http(s) URL, got `{}`",
            trimmed
        )));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend, BackendKind::Database);
        assert_eq!(config.bind_addr, "0.0.0.0:9999");
        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(config.session_ttl_hours, 168);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_supabase_requires_url_and_key() {
        let err = Config::from_lookup(lookup(&[("JOURNAL_BACKEND", "supabase")])).unwrap_err();
        assert!(matches!(err, JournalError::Config(_)));

        let config = Config::from_lookup(lookup(&[
            ("JOURNAL_BACKEND", "supabase"),
            ("SUPABASE_URL", "https://demo.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();
        assert_eq!(config.supabase_url.as_deref(), Some("https://demo.supabase.co"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("JOURNAL_TIMEZONE", "Mars/Olympus")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SESSION_TTL_HOURS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("COOKIE_SECURE", "yes")])).is_err());
        assert!(Config::from_lookup(lookup(&[("LOG_FORMAT", "xml")])).is_err());
    }

    #[test]
    fn test_malformed_supabase_url_is_rejected() {
        for bad in ["demo.supabase.co", "ftp://demo.supabase.co", "https://"] {
            let err = Config::from_lookup(lookup(&[
                ("JOURNAL_BACKEND", "supabase"),
                ("SUPABASE_URL", bad),
                ("SUPABASE_ANON_KEY", "anon"),
            ]))
            .unwrap_err();
            assert!(matches!(err, JournalError::Config(_)), "{}", bad);
        }
    }

    #[test]
    fn test_timezone_parsed() {
        let config =
            Config::from_lookup(lookup(&[("JOURNAL_TIMEZONE", "Europe/London")])).unwrap();
        assert_eq!(config.timezone, chrono_tz::Europe::London);
    }
}
