// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::price_service::PriceService;
use crate::application::schedule_service::ScheduleService;
use crate::application::settings_service::SettingsService;
use crate::infrastructure::config::load_config;
use crate::infrastructure::entsoe::EntsoeClient;
use crate::infrastructure::pushover::PushoverNotifier;
use crate::infrastructure::refresh_job;
use crate::infrastructure::sqlite_repository::SqliteRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config().context("Failed to load configuration")?;

    // Infrastructure
    let repository = Arc::new(
        SqliteRepository::open(&config.database.path)
            .with_context(|| format!("Failed to open database at {}", config.database.path))?,
    );
    let feed = EntsoeClient::new(
        config.prices.entsoe_url.clone(),
        config.prices.fetch_timeout(),
        repository.clone(),
        config.prices.entsoe_token.clone(),
        config.prices.exchange_rate,
        config.prices.vat_multiplier,
    )?;
    let notifier = PushoverNotifier::new(config.pushover.url.clone(), repository.clone());

    // Services
    let schedule_service = ScheduleService::new(repository.clone())
        .with_charger_horizon(config.schedule.charger_horizon());
    let restored = schedule_service.load().await.context("Failed to load schedule")?;
    tracing::info!(breakpoints = restored, "Schedule restored");

    let price_service = PriceService::new(
        repository.clone(),
        Arc::new(feed),
        Arc::new(notifier),
        config.prices.area,
    )
    .with_normalizer(config.normalization.normalizer())
    .with_fetch_timeout(config.prices.fetch_timeout());
    let settings_service = SettingsService::new(repository);

    if config.refresh.enabled {
        let schedule = refresh_job::parse_cron(&config.refresh.cron)
            .with_context(|| format!("Invalid refresh cron expression {:?}", config.refresh.cron))?;
        refresh_job::spawn(price_service.clone(), schedule);
        tracing::info!(cron = %config.refresh.cron, "Price refresh job started");
    }

    let state = Arc::new(AppState {
        schedule_service,
        price_service,
        settings_service,
    });
    let router = build_router(state);

    let addr = config.server.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, area = %config.prices.area, "Starting battery-scheduler");

    axum::serve(listener, router).await?;

    Ok(())
}
