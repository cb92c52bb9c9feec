// src/presentation.rs
//! How a received push payload is shown on a device.
//!
//! The web client's service worker follows these rules; keeping them here lets
//! admins preview a notification before it goes out and keeps the rendering
//! contract under test.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::models::notification::{ContentType, PushMessage};

pub const DEFAULT_TITLE: &str = "Community Portal";
pub const DEFAULT_URL: &str = "/";
pub const NOTIFICATION_TAG: &str = "portal-notification";
pub const DEFAULT_ICON: &str = "/icons/icon-192x192.png";
pub const DEFAULT_BADGE: &str = "/icons/badge-72x72.png";
pub const EMERGENCY_TAG: &str = "portal-emergency";
pub const EMERGENCY_ICON: &str = "/icons/emergency-192x192.png";
pub const EMERGENCY_BADGE: &str = "/icons/emergency-badge-72x72.png";
pub const EMERGENCY_VIBRATION: [u32; 5] = [300, 100, 300, 100, 300];

pub const ACTION_OPEN: &str = "open";
pub const ACTION_CLOSE: &str = "close";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayloadNotification {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image: Option<String>,
}

/// Push payload as the device receives it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub notification: Option<PayloadNotification>,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

fn non_blank(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|s| !s.is_empty())
}

impl PushPayload {
    fn field(&self, pick: impl Fn(&PayloadNotification) -> Option<&String>, data_key: &str) -> Option<&str> {
        self.notification
            .as_ref()
            .and_then(pick)
            .map(String::as_str)
            .and_then(non_blank)
            .or_else(|| self.data.get(data_key).map(String::as_str).and_then(non_blank))
    }

    pub fn title(&self) -> Option<&str> {
        self.field(|n| n.title.as_ref(), "title")
    }

    pub fn body(&self) -> Option<&str> {
        self.field(|n| n.body.as_ref(), "body")
    }

    pub fn image(&self) -> Option<&str> {
        self.field(|n| n.image.as_ref(), "image")
    }

    pub fn target_url(&self) -> &str {
        ["url", "link"]
            .iter()
            .filter_map(|key| self.data.get(*key))
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or(DEFAULT_URL)
    }

    pub fn content_type(&self) -> Option<ContentType> {
        ["content_type", "type"]
            .iter()
            .filter_map(|key| self.data.get(*key))
            .find_map(|value| value.parse().ok())
    }

    pub fn is_emergency(&self) -> bool {
        self.content_type() == Some(ContentType::Emergency)
    }
}

impl From<&PushMessage> for PushPayload {
    fn from(message: &PushMessage) -> Self {
        let mut data: HashMap<String, String> = message.data.clone().into_iter().collect();
        if let Some(link) = &message.link {
            data.insert("url".to_string(), link.clone());
        }
        Self {
            notification: Some(PayloadNotification {
                title: Some(message.title.clone()),
                body: Some(message.body.clone()),
                image: message.image.clone(),
            }),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayData {
    pub url: String,
}

/// Arguments for `showNotification` on the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDisplay {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub tag: String,
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vibrate: Vec<u32>,
    pub data: DisplayData,
}

fn standard_actions() -> Vec<NotificationAction> {
    vec![
        NotificationAction {
            action: ACTION_OPEN.to_string(),
            title: "Open".to_string(),
        },
        NotificationAction {
            action: ACTION_CLOSE.to_string(),
            title: "Close".to_string(),
        },
    ]
}

/// Display for a message delivered through the regular background path.
pub fn background_display(payload: &PushPayload) -> NotificationDisplay {
    NotificationDisplay {
        title: payload.title().unwrap_or(DEFAULT_TITLE).to_string(),
        body: payload.body().unwrap_or_default().to_string(),
        icon: DEFAULT_ICON.to_string(),
        badge: DEFAULT_BADGE.to_string(),
        image: payload.image().map(str::to_string),
        tag: NOTIFICATION_TAG.to_string(),
        require_interaction: true,
        actions: standard_actions(),
        vibrate: Vec::new(),
        data: DisplayData {
            url: payload.target_url().to_string(),
        },
    }
}

/// Emphasised display raised from the raw push event for emergency content.
pub fn emergency_display(payload: &PushPayload) -> Option<NotificationDisplay> {
    if !payload.is_emergency() {
        return None;
    }
    Some(NotificationDisplay {
        icon: EMERGENCY_ICON.to_string(),
        badge: EMERGENCY_BADGE.to_string(),
        tag: EMERGENCY_TAG.to_string(),
        vibrate: EMERGENCY_VIBRATION.to_vec(),
        ..background_display(payload)
    })
}

/// Everything a device shows for one payload: the standard notification and,
/// for emergencies, the emphasised one as well.
pub fn displays_for(payload: &PushPayload) -> Vec<NotificationDisplay> {
    let mut displays = vec![background_display(payload)];
    displays.extend(emergency_display(payload));
    displays
}

/// An open window of the web app.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientWindow {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Notification closed, nothing else happens.
    Dismiss,
    Focus(String),
    OpenWindow(String),
}

/// What a click on a notification does. The notification itself is always closed.
pub fn click_outcome(action: Option<&str>, target_url: &str, origin: &str, clients: &[ClientWindow]) -> ClickOutcome {
    if action == Some(ACTION_CLOSE) {
        return ClickOutcome::Dismiss;
    }

    let target = absolute_url(target_url, origin);
    match clients.iter().find(|client| absolute_url(&client.url, origin) == target) {
        Some(client) => ClickOutcome::Focus(client.id.clone()),
        None => ClickOutcome::OpenWindow(target),
    }
}

fn absolute_url(url: &str, origin: &str) -> String {
    if url.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), url)
    } else {
        url.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Install,
    Activate,
    Message(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    SkipWaiting,
    ClaimClients,
    Ignore,
}

pub fn lifecycle_command(event: &WorkerEvent) -> WorkerCommand {
    match event {
        WorkerEvent::Install => WorkerCommand::SkipWaiting,
        WorkerEvent::Activate => WorkerCommand::ClaimClients,
        WorkerEvent::Message(message) if message["type"] == "SKIP_WAITING" => WorkerCommand::SkipWaiting,
        WorkerEvent::Message(_) => WorkerCommand::Ignore,
    }
}
