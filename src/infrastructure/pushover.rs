// Pushover notifier
use crate::application::notifier::{Notification, Notifier, NotifyError};
use crate::application::repository::SettingsRepository;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Serialize, PartialEq)]
struct PushoverMessage<'a> {
    token: &'a str,
    user: &'a str,
    message: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    priority: i32,
}

/// Credentials are read from the settings store on every send, so changes
/// made through the settings API apply without a restart.
pub struct PushoverNotifier {
    client: reqwest::Client,
    endpoint: String,
    settings: Arc<dyn SettingsRepository>,
}

impl PushoverNotifier {
    pub fn new(endpoint: String, settings: Arc<dyn SettingsRepository>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            settings,
        }
    }
}

fn non_empty<'a>(settings: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    settings.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn build_message<'a>(
    settings: &'a HashMap<String, String>,
    notification: &'a Notification,
) -> Result<PushoverMessage<'a>, NotifyError> {
    let (Some(token), Some(user)) = (
        non_empty(settings, "pushover_app"),
        non_empty(settings, "pushover_user"),
    ) else {
        return Err(NotifyError::MissingCredentials);
    };

    Ok(PushoverMessage {
        token,
        user,
        message: &notification.message,
        title: &notification.title,
        url: non_empty(settings, "app_url"),
        priority: 0,
    })
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let settings = self
            .settings
            .all_settings()
            .await
            .map_err(NotifyError::Settings)?;
        let message = build_message(&settings, notification)?;

        tracing::debug!(title = %notification.title, "Sending Pushover notification");
        let response = self.client.post(&self.endpoint).json(&message).send().await?;

        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
