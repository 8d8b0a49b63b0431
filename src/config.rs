use log::{info, warn};
use std::env;
use time::UtcOffset;
use tokio::time::Duration;

use crate::error::{DashboardError, Result};
use crate::history;

const DEFAULT_SENSOR_PATH: &str = "sensors/node1";
const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub database_url: String,
    pub auth_token: Option<String>,
    pub sensor_path: String,
    pub history_capacity: usize,
    pub time_with_seconds: bool,
    pub reconnect_delay: Duration,
    /// Reconnect attempts after consecutive failures before giving up,
    /// 0 means never give up
    pub max_retries: usize,
    /// Offset used when stamping samples with a display time
    pub utc_offset: UtcOffset,
}

impl DashboardConfig {
    pub fn new() -> Result<Self> {
        // Load environment variables
        dotenv::dotenv().ok();

        let mut config = Self::from_vars(|key| env::var(key).ok())?;

        // Must be read before the runtime starts spawning worker threads
        config.utc_offset = match UtcOffset::current_local_offset() {
            Ok(offset) => offset,
            Err(e) => {
                warn!("Could not determine local UTC offset, using UTC: {}", e);
                UtcOffset::UTC
            }
        };

        info!(
            "Watching '{}' on {} (history of {} samples)",
            config.sensor_path, config.database_url, config.history_capacity
        );

        Ok(config)
    }

    /// Build a configuration from a variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = var("FIREBASE_DATABASE_URL").ok_or_else(|| {
            DashboardError::Config("FIREBASE_DATABASE_URL environment variable not set".into())
        })?;

        let sensor_path = var("SENSOR_PATH").unwrap_or_else(|| DEFAULT_SENSOR_PATH.to_string());

        let history_capacity = match var("HISTORY_CAPACITY") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if (1..=history::MAX_CAPACITY).contains(&n) => n,
                _ => return Err(DashboardError::invalid_var("HISTORY_CAPACITY", &raw)),
            },
            None => history::DEFAULT_CAPACITY,
        };

        let time_with_seconds = match var("TIME_WITH_SECONDS") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| DashboardError::invalid_var("TIME_WITH_SECONDS", &raw))?,
            None => false,
        };

        let reconnect_secs = match var("RECONNECT_DELAY_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| DashboardError::invalid_var("RECONNECT_DELAY_SECS", &raw))?,
            None => DEFAULT_RECONNECT_DELAY_SECS,
        };

        let max_retries = match var("MAX_RETRIES") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| DashboardError::invalid_var("MAX_RETRIES", &raw))?,
            None => 0,
        };

        Ok(DashboardConfig {
            database_url,
            auth_token: var("FIREBASE_AUTH_TOKEN"),
            sensor_path,
            history_capacity,
            time_with_seconds,
            reconnect_delay: Duration::from_secs(reconnect_secs),
            max_retries,
            utc_offset: UtcOffset::UTC,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
