// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod entsoe;
pub mod pushover;
pub mod refresh_job;
pub mod sqlite_repository;
pub mod synthetic_prices;
