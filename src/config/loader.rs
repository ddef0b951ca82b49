use std::{env, str::FromStr, time::Duration};

use chrono_tz::Tz;

use super::env::{
    AppConfig, ArchiveConfig, ConfigError, DirectoryConfig, FilterConfig, LoggingConfig, MatchMode,
    RelayConfig, SchedulerConfig,
};

const MAX_WINDOW_DAYS: i64 = 3_650;

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let telegram_bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let admin_user_id = parse_int("ADMIN_USER_ID");
        let admin_group_id = parse_int("ADMIN_GROUP_ID").map(|id| if id > 0 { -id } else { id });

        let filter = FilterConfig {
            mode: match env::var("MATCH_MODE") {
                Ok(value) => value.parse()?,
                Err(_) => MatchMode::Strict,
            },
            include: parse_keywords(&env::var("KEYWORDS_INCLUDE").unwrap_or_default()),
            exclude: parse_keywords(&env::var("KEYWORDS_EXCLUDE").unwrap_or_default()),
            job: parse_keywords(&env::var("KEYWORDS_JOB").unwrap_or_default()),
        };

        let days_back = parse_or("DAYS_BACK", 30_i64)?;
        let lookback = days_to_duration("DAYS_BACK", days_back)?;
        let relay = RelayConfig {
            target_group: env::var("TARGET_GROUP")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "Vagas".to_string()),
            lookback,
            send_delay: Duration::from_millis(parse_or("SEND_DELAY_MS", 1_500_u64)?),
            run_on_startup: parse_bool("RUN_ON_STARTUP"),
        };

        let archive = ArchiveConfig {
            retention: days_to_duration(
                "ARCHIVE_RETENTION_DAYS",
                parse_or("ARCHIVE_RETENTION_DAYS", days_back)?,
            )?,
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            db_filename: env::var("DB_FILENAME").unwrap_or_else(|_| "archive.db".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let timezone = match env::var("BOT_TIMEZONE") {
            Ok(value) => value.parse::<Tz>().map_err(|_| ConfigError::Invalid {
                key: "BOT_TIMEZONE",
                value,
            })?,
            Err(_) => chrono_tz::America::Sao_Paulo,
        };

        let scheduler = SchedulerConfig {
            cron_specs: env::var("RELAY_CRONS")
                .map(|value| parse_cron_specs(&value))
                .unwrap_or_else(|_| vec!["0 0 9 * * *".to_string()]),
        };

        Ok(Self {
            telegram_bot_token,
            admin_user_id,
            admin_group_id,
            filter,
            relay,
            archive,
            directories,
            logging,
            timezone,
            scheduler,
        })
    }
}

impl FromStr for MatchMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" | "" => Ok(MatchMode::Strict),
            "simple" => Ok(MatchMode::Simple),
            _ => Err(ConfigError::Invalid {
                key: "MATCH_MODE",
                value: value.to_string(),
            }),
        }
    }
}

/// Splits a comma-separated keyword list, trimming and lowercasing each entry
/// and dropping empty ones.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .collect()
}

fn parse_cron_specs(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Day counts outside `1..=MAX_WINDOW_DAYS` are rejected.
fn days_to_duration(key: &'static str, days: i64) -> Result<chrono::Duration, ConfigError> {
    if !(1..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(ConfigError::Invalid {
            key,
            value: days.to_string(),
        });
    }
    chrono::Duration::try_days(days).ok_or(ConfigError::Invalid {
        key,
        value: days.to_string(),
    })
}

fn parse_int(key: &str) -> Option<i64> {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
}

fn parse_bool(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True" | "yes"))
        .unwrap_or(false)
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(default),
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
