use chrono::{NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

use crate::error::SchedulerError;
use crate::utils::{parse_scan_order, parse_slot_list};

pub const DEFAULT_REST_DAYS: u32 = 3;
pub const DEFAULT_MAX_MATCHES_PER_DAY: u32 = 5;
pub const DEFAULT_LEAD_TIME_DAYS: i64 = 7;
const DEFAULT_SLOTS: [(u32, u32); 3] = [(16, 0), (18, 30), (21, 0)];
/// Upper bound on the idle-day guard, whatever the rest interval.
pub const MAX_IDLE_DAYS: u32 = 366;

/// Order in which the remaining pairings are scanned each day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanOrder {
    /// Last remaining pairing first. Matches historical calendars.
    #[default]
    TailFirst,
    HeadFirst,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotConfiguration {
    /// Kick-off times within a day, earliest first.
    pub daily_slots: Vec<NaiveTime>,
    pub min_rest_days: u32,
    pub max_matches_per_day: u32,
}

impl Default for SlotConfiguration {
    fn default() -> Self {
        Self {
            daily_slots: DEFAULT_SLOTS
                .iter()
                .filter_map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0))
                .collect(),
            min_rest_days: DEFAULT_REST_DAYS,
            max_matches_per_day: DEFAULT_MAX_MATCHES_PER_DAY,
        }
    }
}

impl SlotConfiguration {
    pub fn min_rest(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.min_rest_days))
    }

    /// Matches that can actually be played on a full day.
    pub fn daily_capacity(&self) -> usize {
        self.daily_slots.len().min(self.max_matches_per_day as usize)
    }

    /// Rejects settings under which no pairing could ever be placed.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.daily_slots.is_empty() {
            return Err(SchedulerError::DegenerateConfiguration(
                "no daily slots configured".to_string(),
            ));
        }
        if self.max_matches_per_day == 0 {
            return Err(SchedulerError::DegenerateConfiguration(
                "max matches per day is 0".to_string(),
            ));
        }
        if self.daily_slots.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SchedulerError::DegenerateConfiguration(
                "daily slots must be strictly increasing".to_string(),
            ));
        }
        Ok(())
    }

    /// Consecutive days without a single assignment after which a run is
    /// considered stalled. Once every team's last match lies more than the
    /// rest interval behind a fresh day, the first candidate always fits.
    /// A run idle for longer than a year counts as stalled.
    pub fn max_idle_days(&self) -> u32 {
        self.min_rest_days.saturating_add(2).min(MAX_IDLE_DAYS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub slots: SlotConfiguration,
    /// Days between "now" and the first match day when no start is given.
    pub lead_time_days: i64,
    pub scan_order: ScanOrder,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            slots: SlotConfiguration::default(),
            lead_time_days: DEFAULT_LEAD_TIME_DAYS,
            scan_order: ScanOrder::default(),
        }
    }
}

impl SchedulerConfig {
    /// `None` when the lead time does not fit a `TimeDelta`.
    pub fn lead_time(&self) -> Option<TimeDelta> {
        TimeDelta::try_days(self.lead_time_days)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub scheduler: SchedulerConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Overlays values from `lookup` on top of the defaults. Values that fail
    /// to parse are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(days) = parse_var(&lookup, "FIXTURE_REST_DAYS") {
            config.scheduler.slots.min_rest_days = days;
        }
        if let Some(max) = parse_var(&lookup, "FIXTURE_MAX_PER_DAY") {
            config.scheduler.slots.max_matches_per_day = max;
        }
        if let Some(slots) = lookup("FIXTURE_SLOTS") {
            match parse_slot_list(&slots) {
                Ok(slots) => config.scheduler.slots.daily_slots = slots,
                Err(e) => warn!("Ignoring FIXTURE_SLOTS: {}", e),
            }
        }
        if let Some(days) = parse_var(&lookup, "FIXTURE_LEAD_DAYS") {
            config.scheduler.lead_time_days = days;
        }
        if let Some(order) = lookup("FIXTURE_SCAN_ORDER") {
            match parse_scan_order(&order) {
                Ok(order) => config.scheduler.scan_order = order,
                Err(e) => warn!("Ignoring FIXTURE_SCAN_ORDER: {}", e),
            }
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.is_empty()) {
            config.database.url = Some(url);
        }
        if let Some(max) = parse_var(&lookup, "DATABASE_MAX_CONNECTIONS") {
            config.database.max_connections = max;
        }
        if let Some(host) = lookup("SERVER_HOST") {
            config.server.host = host;
        }
        if let Some(port) = parse_var(&lookup, "SERVER_PORT") {
            config.server.port = port;
        }

        config
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}: could not parse '{}'", key, raw);
            None
        }
    }
}
