use crate::db::RowShape;
use crate::error::AppError;
use config::builder::DefaultState;
use config::{Config as Cfg, ConfigBuilder, Environment, File};
use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub service_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub db: DatabaseConfig,
}

/// Connection settings for the cache-key database.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: Secret<String>,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub dbname: String,
    /// Shape of rows handed back by cursors.
    #[serde(default)]
    pub row_shape: RowShape,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_db_port() -> u16 {
    5432
}

impl AppConfig {
    /// Load from `configuration.*` (optional) and `APP__`-prefixed
    /// environment variables, e.g. `APP__DB__HOST`.
    pub fn load(service_name: &str) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let builder = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"));

        Self::from_builder(builder, service_name)
    }

    pub fn from_builder(
        builder: ConfigBuilder<DefaultState>,
        service_name: &str,
    ) -> Result<Self, AppError> {
        let config = builder.set_default("service_name", service_name)?.build()?;

        Ok(config.try_deserialize()?)
    }
}
