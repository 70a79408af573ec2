// ENTSO-E transparency platform client for day-ahead prices
use crate::application::price_feed::{FeedError, PriceFeed};
use crate::application::repository::SettingsRepository;
use crate::domain::price::{convert, PriceArea, PricePoint};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const TOKEN_SETTING: &str = "entsoe_token";
const DAY_AHEAD_PRICES: &str = "A44";

#[derive(Debug, Deserialize)]
struct MarketDocument {
    #[serde(rename = "TimeSeries", default)]
    time_series: Vec<TimeSeries>,
}

#[derive(Debug, Deserialize)]
struct TimeSeries {
    #[serde(rename = "Period", default)]
    periods: Vec<Period>,
}

#[derive(Debug, Deserialize)]
struct Period {
    #[serde(rename = "timeInterval")]
    time_interval: TimeInterval,
    #[serde(default)]
    resolution: Option<String>,
    #[serde(rename = "Point", default)]
    points: Vec<Point>,
}

#[derive(Debug, Deserialize)]
struct TimeInterval {
    start: String,
}

#[derive(Debug, Deserialize)]
struct Point {
    position: i32,
    #[serde(rename = "price.amount")]
    price: f64,
}

pub struct EntsoeClient {
    client: reqwest::Client,
    base_url: String,
    settings: Arc<dyn SettingsRepository>,
    fallback_token: Option<String>,
    exchange_rate: f64,
    vat_multiplier: f64,
}

impl EntsoeClient {
    pub fn new(
        base_url: String,
        timeout: Duration,
        settings: Arc<dyn SettingsRepository>,
        fallback_token: Option<String>,
        exchange_rate: f64,
        vat_multiplier: f64,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            settings,
            fallback_token,
            exchange_rate,
            vat_multiplier,
        })
    }

    /// Stored setting first, then the configured token
    async fn token(&self) -> Result<String, FeedError> {
        let stored = match self.settings.setting(TOKEN_SETTING).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read ENTSO-E token setting");
                None
            }
        };

        stored
            .into_iter()
            .chain(self.fallback_token.clone())
            .find(|t| !t.is_empty())
            .ok_or(FeedError::MissingToken)
    }

    fn build_url(&self, token: &str, area: PriceArea, from: DateTime<Utc>, to: DateTime<Utc>) -> String {
        format!(
            "{}?securityToken={}&documentType={}&in_Domain={}&out_Domain={}&periodStart={}&periodEnd={}",
            self.base_url,
            urlencoding::encode(token),
            DAY_AHEAD_PRICES,
            area.eic(),
            area.eic(),
            from.format("%Y%m%d%H%M"),
            to.format("%Y%m%d%H%M"),
        )
    }
}

#[async_trait]
impl PriceFeed for EntsoeClient {
    async fn fetch(
        &self,
        area: PriceArea,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, FeedError> {
        let token = self.token().await?;
        let url = self.build_url(&token, area, from, to);

        tracing::debug!(%area, %from, %to, "Requesting day-ahead prices");
        let response = self.client.get(&url).send().await.map_err(request_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status { status, body });
        }

        let body = response.text().await.map_err(request_error)?;
        let points = parse_document(&body, area, self.exchange_rate, self.vat_multiplier)?;
        if points.is_empty() {
            return Err(FeedError::NoData);
        }

        tracing::info!(%area, points = points.len(), "Fetched day-ahead prices");
        Ok(points)
    }
}

fn request_error(e: reqwest::Error) -> FeedError {
    if e.is_timeout() {
        FeedError::Timeout
    } else {
        FeedError::Http(e)
    }
}

/// Flatten a market document into price points in öre/kWh. Periods with an
/// unreadable start are skipped.
fn parse_document(
    xml: &str,
    area: PriceArea,
    exchange_rate: f64,
    vat_multiplier: f64,
) -> Result<Vec<PricePoint>, FeedError> {
    let document: MarketDocument =
        quick_xml::de::from_str(xml).map_err(|e| FeedError::Parse(e.to_string()))?;

    let mut points = Vec::new();
    for period in document.time_series.iter().flat_map(|ts| &ts.periods) {
        let Some(start) = parse_interval_start(&period.time_interval.start) else {
            tracing::warn!(start = %period.time_interval.start, "Skipping period with unreadable start");
            continue;
        };
        let step = resolution(period.resolution.as_deref());

        for point in &period.points {
            points.push(PricePoint::new(
                start + step * (point.position - 1),
                convert(point.price, exchange_rate, vat_multiplier),
                area,
            ));
        }
    }
    Ok(points)
}

fn parse_interval_start(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|t| t.and_utc())
}

fn resolution(value: Option<&str>) -> TimeDelta {
    match value {
        Some("PT60M") => TimeDelta::minutes(60),
        Some("PT30M") => TimeDelta::minutes(30),
        _ => TimeDelta::minutes(15),
    }
}
