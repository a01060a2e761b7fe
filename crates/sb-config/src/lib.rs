//! # sb-config
//!
//! Layered runtime settings: built-in defaults, then `SB_*` environment
//! variables (a `.env` file is loaded first when present).
//!
//! Nested keys use a double underscore, e.g. `SB_NEWS__API_KEY` or
//! `SB_SERVER__PORT`. Secrets never have defaults.

use std::path::PathBuf;

use config::{Config, Environment};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("required setting `{0}` is empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub news: NewsSettings,
    pub auth: AuthSettings,
    pub log: LogSettings,
    /// The `.env` file that was loaded, if any. Logged by the caller once
    /// tracing is up.
    #[serde(skip)]
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// sqlx connection string, e.g. `sqlite:sister_board.db`
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsSettings {
    /// Currents API key
    pub api_key: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// HMAC secret for signing JWTs
    pub jwt_secret: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Settings {
    /// Loads `.env` (if any) and reads settings from the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        let env_file = dotenvy::dotenv().ok();
        let mut settings = Self::from_environment(sb_environment())?;
        settings.env_file = env_file;
        Ok(settings)
    }

    /// Builds settings from an explicit environment source.
    pub fn from_environment(env: Environment) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .set_default("database.url", "sqlite:sister_board.db")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("log.json", false)?
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.news.api_key.expose_secret().trim().is_empty() {
            return Err(SettingsError::Empty("news.api_key"));
        }
        if self.auth.jwt_secret.expose_secret().trim().is_empty() {
            return Err(SettingsError::Empty("auth.jwt_secret"));
        }
        Ok(())
    }
}

/// The `SB_` environment source with `__` as the nesting separator.
pub fn sb_environment() -> Environment {
    Environment::with_prefix("SB")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
