use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::core::RetryPolicy;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "todouser".to_string(),
            password: "todopass".to_string(),
            name: "tododb".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub environment: String,
    pub backend: StorageBackend,
    pub seed_demo_data: bool,
    pub database: DatabaseConfig,
    pub connect_retry: RetryPolicy,
    /// Whether an exhausted startup probe aborts the process.
    pub connect_required: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            environment: "development".to_string(),
            backend: StorageBackend::default(),
            seed_demo_data: false,
            database: DatabaseConfig::default(),
            connect_retry: RetryPolicy::default(),
            connect_required: true,
        }
    }
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let db = defaults.database;
        let retry = defaults.connect_retry;
        Ok(Self {
            port: parse(&lookup, "PORT", defaults.port)?,
            environment: lookup("APP_ENV").unwrap_or(defaults.environment),
            backend: parse(&lookup, "STORAGE_BACKEND", defaults.backend)?,
            seed_demo_data: parse(&lookup, "SEED_DEMO_DATA", defaults.seed_demo_data)?,
            database: DatabaseConfig {
                host: lookup("DB_HOST").unwrap_or(db.host),
                port: parse(&lookup, "DB_PORT", db.port)?,
                user: lookup("DB_USER").unwrap_or(db.user),
                password: lookup("DB_PASSWORD").unwrap_or(db.password),
                name: lookup("DB_NAME").unwrap_or(db.name),
                max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", db.max_connections)?,
            },
            connect_retry: RetryPolicy {
                attempts: parse(&lookup, "DB_CONNECT_RETRIES", retry.attempts)?,
                delay: Duration::from_secs(parse(
                    &lookup,
                    "DB_CONNECT_DELAY_SECS",
                    retry.delay.as_secs(),
                )?),
            },
            connect_required: parse(&lookup, "DB_CONNECT_REQUIRED", defaults.connect_required)?,
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
