use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use axum::http::HeaderValue;
use meme_arena_engine::EngineConfig;
use meme_arena_engine::config::{DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_MAX_UPLOAD_BYTES};
use meme_arena_engine::daily::DailySelectionPolicy;
use meme_arena_engine::policy::DeletePolicyKind;

use crate::errors::ConfigError;

pub const DEFAULT_SERVER_HOST: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
pub const DEFAULT_SERVER_PORT: u16 = 4000;

/// Origins allowed by CORS when `CORS_ALLOWED_ORIGINS` is unset.
pub const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}', expected 'pretty' or 'json'")),
        }
    }
}

/// Process configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// PostgreSQL connection string; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub delete_policy: DeletePolicyKind,
    /// Users allowed to run maintenance. Empty admits any identified caller.
    pub admin_user_ids: Vec<String>,
    pub engine: EngineConfig,
    /// Item limit of the in-memory store. Ignored with a database.
    pub memory_item_capacity: Option<usize>,
    pub cors_origins: Vec<HeaderValue>,
    pub log_format: LogFormat,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: DEFAULT_SERVER_HOST,
            port: DEFAULT_SERVER_PORT,
            delete_policy: DeletePolicyKind::default(),
            admin_user_ids: Vec::new(),
            engine: EngineConfig::default(),
            memory_item_capacity: None,
            cors_origins: DEFAULT_CORS_ORIGINS
                .into_iter()
                .map(HeaderValue::from_static)
                .collect(),
            log_format: LogFormat::default(),
        }
    }
}

/// Reads `name`, treating an unset or blank variable as absent.
fn var(name: &'static str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    var(name)
        .map(|value| {
            value.parse::<T>().map_err(|e| ConfigError::Invalid {
                name,
                value: value.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
                name: "CORS_ALLOWED_ORIGINS",
                value: origin.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

impl ArenaConfig {
    /// Builds the configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first variable that cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = ArenaConfig::default();

        let event_channel_capacity = parse_var::<usize>("EVENT_CHANNEL_CAPACITY")?
            .unwrap_or(DEFAULT_EVENT_CHANNEL_CAPACITY);
        if event_channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "EVENT_CHANNEL_CAPACITY",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let cors_origins = match var("CORS_ALLOWED_ORIGINS") {
            Some(raw) => parse_origins(&raw)?,
            None => defaults.cors_origins,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            host: parse_var("SERVER_HOST")?.unwrap_or(defaults.host),
            port: parse_var("SERVER_PORT")?.unwrap_or(defaults.port),
            delete_policy: parse_var("DELETE_POLICY")?.unwrap_or_default(),
            admin_user_ids: var("ADMIN_USER_IDS").map(|raw| parse_list(&raw)).unwrap_or_default(),
            engine: EngineConfig {
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
                daily_selection_policy: parse_var::<DailySelectionPolicy>("DAILY_SELECTION_POLICY")?
                    .unwrap_or_default(),
                event_channel_capacity,
            },
            memory_item_capacity: parse_var("MEMORY_ITEM_CAPACITY")?,
            cors_origins,
            log_format: parse_var("LOG_FORMAT")?.unwrap_or_default(),
        })
    }
}
