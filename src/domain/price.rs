// Price domain model, series normalization and unit conversion
use super::slot::{slot_start, slots, SLOT};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// How far the interpolation looks in each direction for a known price.
pub const DEFAULT_SEARCH_HORIZON: TimeDelta = TimeDelta::hours(4);

/// Price used for slots with no known neighbour within the search horizon.
pub const DEFAULT_FALLBACK_PRICE: i64 = 100;

/// Swedish bidding zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceArea {
    SE1,
    SE2,
    SE3,
    SE4,
}

impl PriceArea {
    pub fn code(self) -> &'static str {
        match self {
            PriceArea::SE1 => "SE1",
            PriceArea::SE2 => "SE2",
            PriceArea::SE3 => "SE3",
            PriceArea::SE4 => "SE4",
        }
    }

    /// ENTSO-E Energy Identification Code of the zone.
    pub fn eic(self) -> &'static str {
        match self {
            PriceArea::SE1 => "10Y1001A1001A44P",
            PriceArea::SE2 => "10Y1001A1001A45N",
            PriceArea::SE3 => "10Y1001A1001A46L",
            PriceArea::SE4 => "10Y1001A1001A47J",
        }
    }
}

impl fmt::Display for PriceArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown price area {0:?}")]
pub struct UnknownPriceArea(pub String);

impl FromStr for PriceArea {
    type Err = UnknownPriceArea;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SE1" => Ok(PriceArea::SE1),
            "SE2" => Ok(PriceArea::SE2),
            "SE3" => Ok(PriceArea::SE3),
            "SE4" => Ok(PriceArea::SE4),
            other => Err(UnknownPriceArea(other.to_string())),
        }
    }
}

/// Price of one quarter-hour in öre/kWh including VAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: i64,
    pub area: PriceArea,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: i64, area: PriceArea) -> Self {
        Self {
            timestamp,
            price,
            area,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizerSettings {
    pub search_horizon: TimeDelta,
    pub fallback_price: i64,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            search_horizon: DEFAULT_SEARCH_HORIZON,
            fallback_price: DEFAULT_FALLBACK_PRICE,
        }
    }
}

/// Turn a raw, possibly sparse or duplicated feed into exactly one point per
/// quarter-hour in `[from, to)`.
///
/// The first point seen for a timestamp (and for a slot) wins. Missing slots
/// take the floored mean of the nearest known neighbours within the search
/// horizon, a single neighbour's price when only one side is known, and the
/// fallback price otherwise. Every emitted point carries `area`.
pub fn normalize(
    raw: &[PricePoint],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    area: PriceArea,
    settings: &NormalizerSettings,
) -> Vec<PricePoint> {
    let mut seen = HashSet::new();
    let mut known: HashMap<DateTime<Utc>, i64> = HashMap::new();
    for point in raw.iter().filter(|p| seen.insert(p.timestamp)) {
        known.entry(slot_start(point.timestamp)).or_insert(point.price);
    }

    slots(slot_start(from), slot_start(to))
        .map(|slot| {
            let price = match known.get(&slot) {
                Some(price) => *price,
                None => interpolate(&known, slot, settings),
            };
            PricePoint::new(slot, price, area)
        })
        .collect()
}

fn interpolate(
    known: &HashMap<DateTime<Utc>, i64>,
    slot: DateTime<Utc>,
    settings: &NormalizerSettings,
) -> i64 {
    let before = nearest(known, slot, -SLOT, settings.search_horizon);
    let after = nearest(known, slot, SLOT, settings.search_horizon);

    match (before, after) {
        (Some(before), Some(after)) => (before + after).div_euclid(2),
        (Some(price), None) | (None, Some(price)) => price,
        (None, None) => settings.fallback_price,
    }
}

fn nearest(
    known: &HashMap<DateTime<Utc>, i64>,
    slot: DateTime<Utc>,
    step: TimeDelta,
    horizon: TimeDelta,
) -> Option<i64> {
    let mut offset = step;
    while offset.abs() <= horizon {
        let candidate = slot.checked_add_signed(offset)?;
        if let Some(price) = known.get(&candidate) {
            return Some(*price);
        }
        offset += step;
    }
    None
}

/// Convert a per-MWh price in the source currency to öre/kWh including VAT.
///
/// The result is truncated towards zero, never rounded.
pub fn convert(source_price: f64, exchange_rate: f64, vat_multiplier: f64) -> i64 {
    (source_price / 1000.0 * exchange_rate * 100.0 * vat_multiplier).trunc() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceSeriesStats {
    pub average: i64,
    pub min: i64,
    pub max: i64,
}

impl PriceSeriesStats {
    pub fn from_points(points: &[PricePoint]) -> Option<Self> {
        let min = points.iter().map(|p| p.price).min()?;
        let max = points.iter().map(|p| p.price).max()?;
        let sum: i64 = points.iter().map(|p| p.price).sum();
        Some(Self {
            average: sum / points.len() as i64,
            min,
            max,
        })
    }
}
