// Application layer - Use cases and the ports they depend on
pub mod notifier;
pub mod price_feed;
pub mod price_service;
pub mod repository;
pub mod schedule_service;
pub mod settings_service;
