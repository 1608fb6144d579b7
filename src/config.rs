use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::engine::DEFAULT_PAGE_SIZE;

const BOT_TOKEN_ENV: &str = "BOT_TOKEN";
const DATABASE_URL_ENV: &str = "DATABASE_URL";
const SLOTS_PER_PAGE_ENV: &str = "SLOTS_PER_PAGE";
const BOOKING_DAYS_AHEAD_ENV: &str = "BOOKING_DAYS_AHEAD";
const DRAFT_TTL_SECS_ENV: &str = "DRAFT_TTL_SECS";

const DEFAULT_DAYS_AHEAD: u32 = 7;
const DEFAULT_DRAFT_TTL_SECS: u64 = 3600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bot_token: String,
    /// `None` runs the bot on the in-memory ledger.
    pub database_url: Option<String>,
    pub slots_per_page: usize,
    pub booking_days_ahead: u32,
    pub draft_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup(BOT_TOKEN_ENV)
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing(BOT_TOKEN_ENV))?;

        let database_url = lookup(DATABASE_URL_ENV).filter(|url| !url.trim().is_empty());

        let slots_per_page = positive(&lookup, SLOTS_PER_PAGE_ENV, DEFAULT_PAGE_SIZE as u64)? as usize;
        let booking_days_ahead = positive(&lookup, BOOKING_DAYS_AHEAD_ENV, DEFAULT_DAYS_AHEAD as u64)?;
        let booking_days_ahead = u32::try_from(booking_days_ahead).map_err(|_| ConfigError::Invalid {
            name: BOOKING_DAYS_AHEAD_ENV,
            value: booking_days_ahead.to_string(),
        })?;
        let draft_ttl = Duration::from_secs(positive(&lookup, DRAFT_TTL_SECS_ENV, DEFAULT_DRAFT_TTL_SECS)?);

        Ok(AppConfig {
            bot_token,
            database_url,
            slots_per_page,
            booking_days_ahead,
            draft_ttl,
        })
    }
}

fn positive<F>(lookup: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::Invalid { name, value: raw }),
        },
    }
}
