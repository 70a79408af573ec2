// Repository traits for prices, schedule and settings
use crate::domain::price::PricePoint;
use crate::domain::schedule::{ScheduleBreakpoint, StoredBreakpoint};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// Replace every stored price in `[from, to)` with `points` in one transaction
    async fn replace_prices(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        points: &[PricePoint],
    ) -> anyhow::Result<()>;

    /// Stored prices in `[from, to)`, ascending by timestamp
    async fn prices_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PricePoint>>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Replace the whole schedule in one transaction
    async fn replace_schedule(&self, breakpoints: &[ScheduleBreakpoint]) -> anyhow::Result<()>;

    /// The persisted schedule, ascending by timestamp
    async fn load_schedule(&self) -> anyhow::Result<Vec<StoredBreakpoint>>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn setting(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn all_settings(&self) -> anyhow::Result<HashMap<String, String>>;

    /// Store every entry of `settings` in one transaction
    async fn save_settings(&self, settings: &HashMap<String, String>) -> anyhow::Result<()>;
}
