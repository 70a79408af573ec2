// Daily price refresh driven by a cron expression in local time
use crate::application::price_service::{default_range, PriceService};
use chrono::{DateTime, Local, TimeZone};
use cron::Schedule;
use std::str::FromStr;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Parse a cron expression, prepending a seconds field to 5-field expressions.
pub fn parse_cron(expr: &str) -> Result<Schedule, cron::error::Error> {
    if expr.split_whitespace().count() == 5 {
        Schedule::from_str(&format!("0 {expr}"))
    } else {
        Schedule::from_str(expr)
    }
}

/// Time until the next fire after `now`, if the schedule fires again at all
fn next_delay<Tz: TimeZone>(schedule: &Schedule, now: &DateTime<Tz>) -> Option<Duration> {
    let next = schedule.after(now).next()?;
    Some((next - now.clone()).to_std().unwrap_or_default())
}

pub fn spawn(service: PriceService, schedule: Schedule) -> JoinHandle<()> {
    tokio::spawn(run(service, schedule))
}

async fn run(service: PriceService, schedule: Schedule) {
    loop {
        let now = Local::now();
        let Some(delay) = next_delay(&schedule, &now) else {
            tracing::warn!("Refresh schedule has no upcoming fire time, stopping");
            return;
        };
        tracing::info!(next_in_secs = delay.as_secs(), "Next price refresh scheduled");
        tokio::time::sleep(delay).await;

        let (from, to) = default_range(Local::now());
        match service.refresh(from, to).await {
            Ok(outcome) => tracing::info!(
                count = outcome.count,
                source = ?outcome.source,
                "Scheduled price refresh finished"
            ),
            Err(e) => tracing::error!(error = %e, "Scheduled price refresh failed"),
        }
    }
}
