//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` next to the binary, overridden by `PETALPOS__*`
//! environment variables (e.g. `PETALPOS__SERVER__PORT=8080`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Shop {
    pub default_vat_rate: u8,
    pub labor_surcharge_percent: u32,
    /// IANA zone name; sales reports group by this calendar.
    pub timezone: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub database: Database,
    pub shop: Shop,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("settings").required(false))
                .add_source(Environment::with_prefix("PETALPOS").separator("__")),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .set_default("app.level", "info")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite:./petalpos.db?mode=rwc")?
            .set_default("shop.default_vat_rate", 19)?
            .set_default("shop.labor_surcharge_percent", 10)?
            .set_default("shop.timezone", "Europe/Berlin")?
            .build()?
            .try_deserialize()
    }
}
