// Service configuration: optional TOML file overlaid by environment variables
use crate::domain::price::{NormalizerSettings, PriceArea};
use chrono::TimeDelta;
use serde::Deserialize;
use std::time::Duration;

const CONFIG_FILE: &str = "config/battery-scheduler";
const ENV_PREFIX: &str = "BATTERY_SCHEDULER";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub prices: PriceSettings,
    #[serde(default)]
    pub normalization: NormalizationSettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub pushover: PushoverSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceSettings {
    #[serde(default = "default_area")]
    pub area: PriceArea,
    /// SEK per EUR
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: f64,
    #[serde(default = "default_vat_multiplier")]
    pub vat_multiplier: f64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_entsoe_url")]
    pub entsoe_url: String,
    /// Used when the `entsoe_token` setting is empty
    #[serde(default)]
    pub entsoe_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NormalizationSettings {
    #[serde(default = "default_search_horizon_minutes")]
    pub search_horizon_minutes: i64,
    #[serde(default = "default_fallback_price")]
    pub fallback_price: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSettings {
    #[serde(default = "default_charger_horizon_hours")]
    pub charger_horizon_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshSettings {
    #[serde(default = "default_refresh_enabled")]
    pub enabled: bool,
    #[serde(default = "default_refresh_cron")]
    pub cron: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushoverSettings {
    #[serde(default = "default_pushover_url")]
    pub url: String,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "data/battery.db".to_owned()
}

fn default_area() -> PriceArea {
    PriceArea::SE3
}

fn default_exchange_rate() -> f64 {
    11.6
}

fn default_vat_multiplier() -> f64 {
    1.25
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_entsoe_url() -> String {
    "https://web-api.tp.entsoe.eu/api".to_owned()
}

fn default_search_horizon_minutes() -> i64 {
    240
}

fn default_fallback_price() -> i64 {
    100
}

fn default_charger_horizon_hours() -> i64 {
    48
}

fn default_refresh_enabled() -> bool {
    true
}

fn default_refresh_cron() -> String {
    "0 5 13 * * *".to_owned()
}

fn default_pushover_url() -> String {
    "https://api.pushover.net/1/messages.json".to_owned()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self {
            area: default_area(),
            exchange_rate: default_exchange_rate(),
            vat_multiplier: default_vat_multiplier(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            entsoe_url: default_entsoe_url(),
            entsoe_token: None,
        }
    }
}

impl Default for NormalizationSettings {
    fn default() -> Self {
        Self {
            search_horizon_minutes: default_search_horizon_minutes(),
            fallback_price: default_fallback_price(),
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            charger_horizon_hours: default_charger_horizon_hours(),
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            enabled: default_refresh_enabled(),
            cron: default_refresh_cron(),
        }
    }
}

impl Default for PushoverSettings {
    fn default() -> Self {
        Self {
            url: default_pushover_url(),
        }
    }
}

impl AppConfig {
    /// Reject values that would silently disable checks downstream
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.normalization.search_horizon_minutes >= 0,
            "normalization.search_horizon_minutes must not be negative, got {}",
            self.normalization.search_horizon_minutes
        );
        anyhow::ensure!(
            self.schedule.charger_horizon_hours >= 0,
            "schedule.charger_horizon_hours must not be negative, got {}",
            self.schedule.charger_horizon_hours
        );
        Ok(())
    }
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl PriceSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl NormalizationSettings {
    pub fn normalizer(&self) -> NormalizerSettings {
        NormalizerSettings {
            search_horizon: TimeDelta::minutes(self.search_horizon_minutes),
            fallback_price: self.fallback_price,
        }
    }
}

impl ScheduleSettings {
    pub fn charger_horizon(&self) -> TimeDelta {
        TimeDelta::hours(self.charger_horizon_hours)
    }
}

/// Load `config/battery-scheduler.{toml,yaml,json}` if present, then apply
/// `BATTERY_SCHEDULER__SECTION__KEY` environment overrides.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}
