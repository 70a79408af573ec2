// External price feed boundary
use crate::domain::price::{PriceArea, PricePoint};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("price feed token is not configured")]
    MissingToken,

    #[error("price feed request timed out")]
    Timeout,

    #[error("price feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("price feed returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse price feed document: {0}")]
    Parse(String),

    #[error("price feed returned no prices")]
    NoData,
}

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Raw prices for `area` in `[from, to)`, converted to öre/kWh. The points
    /// may be sparse or duplicated; callers normalize them.
    async fn fetch(
        &self,
        area: PriceArea,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, FeedError>;
}
