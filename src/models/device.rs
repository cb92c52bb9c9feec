// src/models/device.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::language::Language;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeviceRegistration {
    pub user_id: String,
    pub push_token: String,
    pub locale: Language,
    pub registered_at: DateTime<Utc>,
}

// Request/Response Models
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub locale: Option<Language>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub user_id: String,
    pub locale: Language,
    pub registered_at: DateTime<Utc>,
    pub subscribed_topics: Vec<String>,
}
