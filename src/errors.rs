// src/errors.rs
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for the portal service
#[derive(Debug)]
pub enum PortalError {
    // HTTP and API errors
    Unauthorized(String),
    NotFound(String),
    InternalServer(String),

    // Input errors
    InvalidInput(String),
    InvalidAddressMode(String),
    MissingRequiredField(String),
    ValidationFailed(Vec<ValidationError>),

    // Network and HTTP client errors
    NetworkTimeout,
    NetworkConnection(String),
    HttpClient(String),

    // Serialization and parsing errors
    JsonParsing(String),
    JsonSerialization(String),

    // Device store errors
    StoreConnection(String),
    StoreQuery(String),

    // Configuration and setup errors
    ConfigurationError(String),

    // Session errors
    TokenExpired,
    TokenInvalid,
    AdminLoginDisabled,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortalError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            PortalError::NotFound(msg) => write!(f, "Not found: {}", msg),
            PortalError::InternalServer(msg) => write!(f, "Internal server error: {}", msg),

            PortalError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            PortalError::InvalidAddressMode(mode) => write!(f, "Invalid address mode: {}", mode),
            PortalError::MissingRequiredField(field) => write!(f, "Missing required field: {}", field),
            PortalError::ValidationFailed(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }

            PortalError::NetworkTimeout => write!(f, "Network request timed out"),
            PortalError::NetworkConnection(msg) => write!(f, "Network connection error: {}", msg),
            PortalError::HttpClient(msg) => write!(f, "HTTP client error: {}", msg),

            PortalError::JsonParsing(msg) => write!(f, "JSON parsing error: {}", msg),
            PortalError::JsonSerialization(msg) => write!(f, "JSON serialization error: {}", msg),

            PortalError::StoreConnection(msg) => write!(f, "Device store connection error: {}", msg),
            PortalError::StoreQuery(msg) => write!(f, "Device store query error: {}", msg),

            PortalError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),

            PortalError::TokenExpired => write!(f, "Session token has expired"),
            PortalError::TokenInvalid => write!(f, "Session token is invalid"),
            PortalError::AdminLoginDisabled => write!(f, "Admin login is not configured"),
        }
    }
}

impl std::error::Error for PortalError {}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            tracing::debug!("Rejecting request: {}", self);
        } else {
            tracing::error!("Request failed: {}", self);
        }

        let (status, error_type, message, details) = match self {
            PortalError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            PortalError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),

            PortalError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg, None),
            PortalError::InvalidAddressMode(mode) => (
                StatusCode::BAD_REQUEST,
                "invalid_address_mode",
                format!("Unknown notification type: {}", mode),
                None,
            ),
            PortalError::MissingRequiredField(field) => {
                (StatusCode::BAD_REQUEST, "missing_field", format!("Missing required field: {}", field), None)
            }
            PortalError::ValidationFailed(errors) => {
                let details = serde_json::to_value(&errors).ok();
                (StatusCode::BAD_REQUEST, "validation_failed", "Validation errors occurred".to_string(), details)
            }

            PortalError::TokenExpired => (StatusCode::UNAUTHORIZED, "token_expired", "Session token has expired".to_string(), None),
            PortalError::TokenInvalid => (StatusCode::UNAUTHORIZED, "token_invalid", "Session token is invalid".to_string(), None),
            PortalError::AdminLoginDisabled => {
                (StatusCode::FORBIDDEN, "admin_login_disabled", "Admin login is not configured".to_string(), None)
            }

            // All other errors are treated as internal server errors
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", self.to_string(), None),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type PortalResult<T> = Result<T, PortalError>;

impl From<redis::RedisError> for PortalError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::IoError => PortalError::StoreConnection(err.to_string()),
            redis::ErrorKind::AuthenticationFailed => PortalError::StoreConnection("Authentication failed".to_string()),
            _ => PortalError::StoreQuery(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PortalError::NetworkTimeout
        } else if err.is_connect() {
            PortalError::NetworkConnection(err.to_string())
        } else {
            PortalError::HttpClient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() {
            PortalError::JsonParsing(err.to_string())
        } else {
            PortalError::JsonSerialization(err.to_string())
        }
    }
}

impl PortalError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        PortalError::InvalidInput(msg.into())
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        PortalError::MissingRequiredField(field.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        PortalError::NotFound(resource.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        PortalError::InternalServer(msg.into())
    }

    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        PortalError::ValidationFailed(vec![ValidationError {
            field: field.into(),
            message: message.into(),
        }])
    }

    /// True for errors the caller caused, as opposed to faults on our side.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PortalError::Unauthorized(_)
                | PortalError::NotFound(_)
                | PortalError::InvalidInput(_)
                | PortalError::InvalidAddressMode(_)
                | PortalError::MissingRequiredField(_)
                | PortalError::ValidationFailed(_)
                | PortalError::TokenExpired
                | PortalError::TokenInvalid
                | PortalError::AdminLoginDisabled
        )
    }
}
