// src/config.rs
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::{
    errors::{PortalError, PortalResult},
    services::session_service::MAX_SESSION_TTL_SECS,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// `None` disables the external translation provider.
    pub translation_api_url: Option<String>,
    pub translation_contact_email: Option<String>,
    /// `None` selects the mock push provider.
    pub fcm_server_key: Option<String>,
    pub fcm_send_url: String,
    pub fcm_iid_url: String,
    /// `None` keeps device registrations in memory.
    pub redis_url: Option<String>,
    pub admin_password: Option<String>,
    pub session_secret: String,
    pub session_ttl_secs: u64,
    pub provider_timeout: Duration,
    pub phrase_file: Option<PathBuf>,
    pub default_topics: Vec<String>,
    pub allowed_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            translation_api_url: Some("https://api.mymemory.translated.net/get".to_string()),
            translation_contact_email: None,
            fcm_server_key: None,
            fcm_send_url: "https://fcm.googleapis.com/fcm/send".to_string(),
            fcm_iid_url: "https://iid.googleapis.com/iid/v1".to_string(),
            redis_url: None,
            admin_password: None,
            session_secret: uuid::Uuid::new_v4().to_string(),
            session_ttl_secs: 8 * 60 * 60,
            provider_timeout: Duration::from_secs(10),
            phrase_file: None,
            default_topics: vec!["all".to_string()],
            allowed_origin: None,
        }
    }
}

impl Config {
    pub fn load() -> PortalResult<Self> {
        let defaults = Self::default();

        let session_secret = optional("SESSION_SECRET").unwrap_or_else(|| {
            warn!("SESSION_SECRET not set, admin sessions will not survive a restart");
            defaults.session_secret.clone()
        });

        let admin_password = optional("ADMIN_PASSWORD");
        if admin_password.is_none() {
            warn!("ADMIN_PASSWORD not set, admin routes are unreachable");
        }

        let translation_api_url = match optional("TRANSLATION_API_URL") {
            Some(url) if url.eq_ignore_ascii_case("off") => None,
            Some(url) => Some(url),
            None => defaults.translation_api_url.clone(),
        };

        Ok(Self {
            port: try_load("PORT", defaults.port)?,
            translation_api_url,
            translation_contact_email: optional("TRANSLATION_CONTACT_EMAIL"),
            fcm_server_key: optional("FCM_SERVER_KEY"),
            fcm_send_url: optional("FCM_SEND_URL").unwrap_or(defaults.fcm_send_url),
            fcm_iid_url: optional("FCM_IID_URL").unwrap_or(defaults.fcm_iid_url),
            redis_url: optional("REDIS_URL"),
            admin_password,
            session_secret,
            session_ttl_secs: check_session_ttl(try_load("SESSION_TTL_SECS", defaults.session_ttl_secs)?)?,
            provider_timeout: Duration::from_secs(try_load(
                "PROVIDER_TIMEOUT_SECS",
                defaults.provider_timeout.as_secs(),
            )?),
            phrase_file: optional("PHRASE_FILE").map(PathBuf::from),
            default_topics: optional("DEFAULT_TOPICS")
                .map(|raw| parse_list(&raw))
                .unwrap_or(defaults.default_topics),
            allowed_origin: optional("ALLOWED_ORIGIN"),
        })
    }
}

/// Non-empty value of an environment variable.
fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn try_load<T: FromStr + Display>(key: &str, default: T) -> PortalResult<T>
where
    T::Err: Display,
{
    match optional(key) {
        Some(raw) => raw.parse().map_err(|e| {
            warn!("Invalid {key} value: {e}");
            PortalError::ConfigurationError(format!("{key}: {e}"))
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn check_session_ttl(secs: u64) -> PortalResult<u64> {
    if secs == 0 || secs > MAX_SESSION_TTL_SECS {
        return Err(PortalError::ConfigurationError(format!(
            "SESSION_TTL_SECS must be between 1 and {MAX_SESSION_TTL_SECS}, got {secs}"
        )));
    }
    Ok(secs)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
