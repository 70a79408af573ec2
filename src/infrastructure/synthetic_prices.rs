// Synthetic price generator used when the real feed is unavailable
use crate::domain::price::{PriceArea, PricePoint};
use crate::domain::slot::{slot_start, slots};
use chrono::{DateTime, Local, TimeZone, Timelike, Utc};

const BASE_PRICE: i64 = 80;

/// A plausible daily price curve: cheap nights, morning and evening peaks.
pub fn generate(from: DateTime<Utc>, to: DateTime<Utc>, area: PriceArea) -> Vec<PricePoint> {
    generate_in(from, to, area, &Local)
}

pub fn generate_in<Tz: TimeZone>(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    area: PriceArea,
    tz: &Tz,
) -> Vec<PricePoint> {
    slots(slot_start(from), to)
        .map(|slot| {
            let hour = slot.with_timezone(tz).hour();
            PricePoint::new(slot, price_for_hour(hour), area)
        })
        .collect()
}

fn price_for_hour(hour: u32) -> i64 {
    let price = BASE_PRICE
        + match hour {
            0..=4 => -25,
            6..=8 => 30,
            17..=20 => 40,
            _ => 0,
        };
    // 25% VAT, truncated
    price * 125 / 100
}
