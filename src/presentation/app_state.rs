// Application state for HTTP handlers
use crate::application::price_service::PriceService;
use crate::application::schedule_service::ScheduleService;
use crate::application::settings_service::SettingsService;

#[derive(Clone)]
pub struct AppState {
    pub schedule_service: ScheduleService,
    pub price_service: PriceService,
    pub settings_service: SettingsService,
}
