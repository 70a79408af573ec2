// Price service - Use cases for reading and refreshing the price series
use crate::application::notifier::{Notification, Notifier};
use crate::application::price_feed::{FeedError, PriceFeed};
use crate::application::repository::PriceRepository;
use crate::domain::price::{normalize, NormalizerSettings, PriceArea, PricePoint, PriceSeriesStats};
use crate::domain::slot::slot_start;
use crate::infrastructure::synthetic_prices;
use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest range a single price read may cover.
pub const MAX_PRICE_RANGE: TimeDelta = TimeDelta::days(31);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Fetched from the price feed during this request
    Feed,
    /// Read back from storage
    Stored,
    /// Stored prices with the uncovered start or end of the range generated
    Partial,
    /// Generated because no real prices were available
    Synthetic,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    pub source: PriceSource,
    pub prices: Vec<PricePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    pub count: usize,
    pub source: PriceSource,
}

/// Local midnight today until 48 hours later.
pub fn default_range<Tz: TimeZone>(now: DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    let start = now
        .timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| slot_start(now.with_timezone(&Utc)));
    (start, start + TimeDelta::hours(48))
}

#[derive(Clone)]
pub struct PriceService {
    repository: Arc<dyn PriceRepository>,
    feed: Arc<dyn PriceFeed>,
    notifier: Arc<dyn Notifier>,
    area: PriceArea,
    normalizer: NormalizerSettings,
    fetch_timeout: Duration,
}

impl PriceService {
    pub fn new(
        repository: Arc<dyn PriceRepository>,
        feed: Arc<dyn PriceFeed>,
        notifier: Arc<dyn Notifier>,
        area: PriceArea,
    ) -> Self {
        Self {
            repository,
            feed,
            notifier,
            area,
            normalizer: NormalizerSettings::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_normalizer(mut self, normalizer: NormalizerSettings) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Complete series for `[from, to)`: stored prices when there are any,
    /// synthetic ones otherwise. Slots before the first or after the last
    /// stored price are generated and the series is marked partial.
    pub async fn prices(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> anyhow::Result<PriceSeries> {
        let mut raw = self.repository.prices_between(from, to).await?;
        let (Some(first), Some(last)) = (
            raw.iter().map(|p| slot_start(p.timestamp)).min(),
            raw.iter().map(|p| slot_start(p.timestamp)).max(),
        ) else {
            tracing::debug!(%from, %to, "No stored prices, serving synthetic series");
            return Ok(self.synthetic(from, to));
        };

        let uncovered: Vec<PricePoint> = synthetic_prices::generate(from, to, self.area)
            .into_iter()
            .filter(|p| p.timestamp < first || p.timestamp > last)
            .collect();
        let source = if uncovered.is_empty() {
            PriceSource::Stored
        } else {
            tracing::debug!(generated = uncovered.len(), "Stored prices cover part of the range");
            PriceSource::Partial
        };
        raw.extend(uncovered);

        Ok(PriceSeries {
            source,
            prices: normalize(&raw, from, to, self.area, &self.normalizer),
        })
    }

    /// Fetch, normalize and store prices for `[from, to)`.
    ///
    /// A feed failure is not an error: the synthetic series is returned
    /// instead and the stored prices are left alone. Storage failures are.
    pub async fn refresh(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> anyhow::Result<RefreshOutcome> {
        let raw = match self.fetch(from, to).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, area = %self.area, "Price feed unavailable, falling back to synthetic prices");
                let series = self.synthetic(from, to);
                return Ok(RefreshOutcome {
                    count: series.prices.len(),
                    source: series.source,
                });
            }
        };

        let prices = normalize(&raw, from, to, self.area, &self.normalizer);
        self.repository.replace_prices(from, to, &prices).await?;
        tracing::info!(
            raw = raw.len(),
            stored = prices.len(),
            area = %self.area,
            "Stored refreshed prices"
        );

        if let Some(stats) = PriceSeriesStats::from_points(&prices) {
            self.notify(Notification::price_update(&stats));
        }

        Ok(RefreshOutcome {
            count: prices.len(),
            source: PriceSource::Feed,
        })
    }

    async fn fetch(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<PricePoint>, FeedError> {
        match tokio::time::timeout(self.fetch_timeout, self.feed.fetch(self.area, from, to)).await {
            Ok(Ok(raw)) if raw.is_empty() => Err(FeedError::NoData),
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout),
        }
    }

    fn synthetic(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> PriceSeries {
        let raw = synthetic_prices::generate(from, to, self.area);
        PriceSeries {
            source: PriceSource::Synthetic,
            prices: normalize(&raw, from, to, self.area, &self.normalizer),
        }
    }

    /// Delivery runs detached; a failure is logged and never reaches the caller.
    fn notify(&self, notification: Notification) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            match notifier.send(&notification).await {
                Ok(()) => tracing::info!("Price notification sent"),
                Err(e) => tracing::warn!(error = %e, "Failed to send price notification"),
            }
        });
    }
}
