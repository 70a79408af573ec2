// Push notification boundary
use crate::domain::price::PriceSeriesStats;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification credentials are not configured")]
    MissingCredentials,

    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification service returned status {0}")]
    Status(u16),

    #[error("failed to read notification settings: {0:#}")]
    Settings(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn price_update(stats: &PriceSeriesStats) -> Self {
        Self {
            title: "Battery schedule".to_string(),
            message: format!(
                "Tomorrow's electricity prices are here!\n\nAverage: {} öre/kWh\nLowest: {} öre/kWh\nHighest: {} öre/kWh",
                stats.average, stats.min, stats.max
            ),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}
