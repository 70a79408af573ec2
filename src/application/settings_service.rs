// Settings service - Operator-editable key/value settings with defaults
use crate::application::repository::SettingsRepository;
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULTS: &[(&str, &str)] = &[
    ("entsoe_token", ""),
    ("pushover_app", ""),
    ("pushover_user", ""),
    ("app_url", ""),
    ("battery_capacity", "42"),
];

#[derive(Clone)]
pub struct SettingsService {
    repository: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    pub fn new(repository: Arc<dyn SettingsRepository>) -> Self {
        Self { repository }
    }

    /// The known keys, each with its non-empty stored value or its default
    pub async fn all(&self) -> anyhow::Result<HashMap<String, String>> {
        let mut stored = self.repository.all_settings().await?;
        let settings = DEFAULTS
            .iter()
            .map(|(key, default)| {
                let value = stored
                    .remove(*key)
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| default.to_string());
                (key.to_string(), value)
            })
            .collect();
        Ok(settings)
    }

    pub async fn save(&self, settings: HashMap<String, String>) -> anyhow::Result<()> {
        self.repository.save_settings(&settings).await?;
        tracing::info!(keys = settings.len(), "Settings saved");
        Ok(())
    }
}
