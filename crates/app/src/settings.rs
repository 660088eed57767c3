//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and from `FINANCERY_`-prefixed environment
//! variables (`FINANCERY_APP__LEVEL=debug`).
//!
//! See `settings.toml` for the configuration.
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_SQLITE_PATH: &str = "financery.db";

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Self::Memory => String::from("sqlite::memory:"),
            Self::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Engine {
    pub cache_capacity: usize,
    /// Decimal amount, e.g. `"100000000.00"`.
    pub max_amount: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Option<Database>,
    pub engine: Engine,
}

impl Settings {
    /// Loads `path` (or `settings.toml` in the working directory when it
    /// exists), then the environment on top.
    pub fn new(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("settings").required(false),
        };
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("engine.cache_capacity", engine::DEFAULT_CACHE_CAPACITY as u64)?
            .add_source(file)
            .add_source(Environment::with_prefix("FINANCERY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn database(&self) -> Database {
        self.database
            .clone()
            .unwrap_or_else(|| Database::Sqlite(DEFAULT_SQLITE_PATH.to_string()))
    }
}
