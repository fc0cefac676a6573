//! # rt-config
//!
//! Layered settings: built-in defaults, then an optional
//! `config/rusty-turk.toml`, then `RUSTY_TURK__SECTION__KEY` environment
//! variables (a `.env` file is loaded first when present).

use std::path::PathBuf;

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const ENV_PREFIX: &str = "RUSTY_TURK";
pub const CONFIG_FILE: &str = "config/rusty-turk";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Prefix for the `image_url` handed to annotators. Defaults to `http://{host}:{port}`.
    pub public_base_url: Option<String>,
}

impl ServerSettings {
    pub fn public_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageSettings {
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct VisionSettings {
    pub base_url: String,
    pub model: String,
    #[serde(default, deserialize_with = "secret_opt")]
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub format: LogFormat,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub images: ImageSettings,
    pub vision: VisionSettings,
    pub log: LogSettings,
}

impl LogSettings {
    /// Installs the global subscriber. `RUST_LOG` wins over the default `info` filter.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
        match self.format {
            LogFormat::Json => builder.json().init(),
            LogFormat::Pretty => builder.init(),
        }
    }
}

fn secret_opt<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(SecretString::from))
}

impl Settings {
    /// Loads settings from `.env`, the config file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_from(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
    }

    /// Same as [`Settings::load`] with an explicit environment source.
    pub fn load_from(env: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite://annotations.db")?
            .set_default("database.max_connections", 5)?
            .set_default("images.dir", "image")?
            .set_default("vision.base_url", "https://generativelanguage.googleapis.com/v1beta")?
            .set_default("vision.model", "gemini-1.5-flash")?
            .set_default("vision.timeout_secs", 60)?
            .set_default("log.format", "pretty")?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(env)
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
