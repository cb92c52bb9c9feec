// src/services/session_service.rs
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing;
use uuid::Uuid;

use crate::errors::PortalError;

const KEY_CONTEXT: &str = "bilingual-portal 2024-01-01 admin session tokens";

/// Longest lifetime an admin session may be configured with (30 days).
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("admin login is not configured")]
    LoginDisabled,

    #[error("wrong admin password")]
    WrongPassword,

    #[error("session token expired")]
    Expired,

    #[error("session token invalid")]
    Invalid,

    #[error("session expiry out of range")]
    ExpiryOutOfRange,
}

impl From<SessionError> for PortalError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::LoginDisabled => PortalError::AdminLoginDisabled,
            SessionError::WrongPassword => PortalError::Unauthorized("wrong admin password".to_string()),
            SessionError::Expired => PortalError::TokenExpired,
            SessionError::Invalid => PortalError::TokenInvalid,
            SessionError::ExpiryOutOfRange => PortalError::internal_error("session expiry out of range"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionClaims {
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and checks admin session tokens of the form
/// `<session id>.<expiry unix seconds>.<hex keyed blake3 mac>`.
pub struct SessionSigner {
    key: [u8; 32],
    ttl: Duration,
    admin_password: Option<String>,
}

impl SessionSigner {
    /// `ttl_secs` is clamped to `1..=MAX_SESSION_TTL_SECS`.
    pub fn new(secret: &str, ttl_secs: u64, admin_password: Option<String>) -> Self {
        let clamped = ttl_secs.clamp(1, MAX_SESSION_TTL_SECS);
        if clamped != ttl_secs {
            tracing::warn!("Session TTL {}s out of range, using {}s", ttl_secs, clamped);
        }
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
            ttl: Duration::try_seconds(clamped as i64).unwrap_or_else(Duration::zero),
            admin_password: admin_password.filter(|p| !p.is_empty()),
        }
    }

    pub fn login_enabled(&self) -> bool {
        self.admin_password.is_some()
    }

    pub fn login(&self, password: &str) -> Result<IssuedSession, SessionError> {
        let expected = self.admin_password.as_deref().ok_or(SessionError::LoginDisabled)?;
        // blake3::Hash equality is constant time
        if blake3::hash(password.as_bytes()) != blake3::hash(expected.as_bytes()) {
            tracing::warn!("Rejected admin login attempt");
            return Err(SessionError::WrongPassword);
        }
        let session = self.issue_at(Utc::now())?;
        tracing::info!("Issued admin session expiring at {}", session.expires_at);
        Ok(session)
    }

    pub fn issue_at(&self, now: DateTime<Utc>) -> Result<IssuedSession, SessionError> {
        let expires_at = now.checked_add_signed(self.ttl).ok_or(SessionError::ExpiryOutOfRange)?;
        let claims = format!("{}.{}", Uuid::new_v4().simple(), expires_at.timestamp());
        let mac = blake3::keyed_hash(&self.key, claims.as_bytes());
        Ok(IssuedSession {
            token: format!("{}.{}", claims, hex::encode(mac.as_bytes())),
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let (claims, mac_hex) = token.trim().rsplit_once('.').ok_or(SessionError::Invalid)?;
        let (session_id, expiry) = claims.split_once('.').ok_or(SessionError::Invalid)?;

        let mac_bytes: [u8; 32] = hex::decode(mac_hex)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(SessionError::Invalid)?;
        if blake3::Hash::from(mac_bytes) != blake3::keyed_hash(&self.key, claims.as_bytes()) {
            return Err(SessionError::Invalid);
        }

        let expires_at = expiry
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .ok_or(SessionError::Invalid)?;
        if expires_at <= now {
            return Err(SessionError::Expired);
        }

        Ok(SessionClaims {
            session_id: session_id.to_string(),
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> SessionSigner {
        SessionSigner::new("test-secret", 3600, Some("correct horse".to_string()))
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = signer();
        let now = Utc::now();
        let session = signer.issue_at(now).unwrap();

        let claims = signer.verify_at(&session.token, now).unwrap();
        assert_eq!(claims.expires_at.timestamp(), session.expires_at.timestamp());
        assert_eq!(claims.session_id.len(), 32);
    }

    #[test]
    fn test_expired_token() {
        let signer = signer();
        let now = Utc::now();
        let session = signer.issue_at(now).unwrap();
        assert_eq!(
            signer.verify_at(&session.token, now + Duration::seconds(3601)),
            Err(SessionError::Expired)
        );
    }

    #[test]
    fn test_tampered_token() {
        let signer = signer();
        let now = Utc::now();
        let session = signer.issue_at(now).unwrap();

        // Push the expiry out without re-signing
        let later = (now.timestamp() + 999_999).to_string();
        let mut parts: Vec<&str> = session.token.split('.').collect();
        parts[1] = &later;
        assert_eq!(signer.verify_at(&parts.join("."), now), Err(SessionError::Invalid));

        assert_eq!(signer.verify_at("garbage", now), Err(SessionError::Invalid));
        assert_eq!(signer.verify_at("a.b.zz", now), Err(SessionError::Invalid));
    }

    #[test]
    fn test_other_secret_rejected() {
        let now = Utc::now();
        let session = signer().issue_at(now).unwrap();
        let other = SessionSigner::new("different-secret", 3600, None);
        assert_eq!(other.verify_at(&session.token, now), Err(SessionError::Invalid));
    }

    #[test]
    fn test_huge_ttl_is_clamped() {
        let signer = SessionSigner::new("test-secret", 10_000_000_000_000_000, Some("pw".to_string()));
        let now = Utc::now();
        let session = signer.login("pw").unwrap();
        assert!(session.expires_at <= now + Duration::seconds(MAX_SESSION_TTL_SECS as i64 + 5));
        assert!(signer.verify(&session.token).is_ok());

        let zero = SessionSigner::new("test-secret", 0, None);
        let session = zero.issue_at(now).unwrap();
        assert_eq!(session.expires_at, now + Duration::seconds(1));
    }

    #[test]
    fn test_expiry_overflow_is_an_error() {
        let signer = signer();
        assert_eq!(signer.issue_at(DateTime::<Utc>::MAX_UTC).unwrap_err(), SessionError::ExpiryOutOfRange);
    }

    #[test]
    fn test_login() {
        let signer = signer();
        assert!(signer.login("correct horse").is_ok());
        assert_eq!(signer.login("admin123").unwrap_err(), SessionError::WrongPassword);

        let disabled = SessionSigner::new("test-secret", 3600, None);
        assert!(!disabled.login_enabled());
        assert_eq!(disabled.login("anything").unwrap_err(), SessionError::LoginDisabled);
    }
}
