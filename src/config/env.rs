use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub admin_user_id: Option<i64>,
    pub admin_group_id: Option<i64>,
    pub filter: FilterConfig,
    pub relay: RelayConfig,
    pub archive: ArchiveConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub timezone: Tz,
    pub scheduler: SchedulerConfig,
}

/// Keyword policy applied to every scanned message. Keywords are stored
/// lowercased and trimmed.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub mode: MatchMode,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub job: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Job gate + include + exclude.
    Strict,
    /// Include + exclude only; job keywords are ignored.
    Simple,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub target_group: String,
    pub lookback: chrono::Duration,
    pub send_delay: Duration,
    pub run_on_startup: bool,
}

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub retention: chrono::Duration,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub db_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub cron_specs: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
