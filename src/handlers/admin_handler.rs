// src/handlers/admin_handler.rs
use axum::{
    Json,
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    errors::{PortalError, PortalResult},
    services::session_service::{IssuedSession, SessionClaims},
    state::AppState,
};

/// Proof that the request carries a valid admin session token.
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionClaims);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| PortalError::Unauthorized("missing bearer token".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| PortalError::Unauthorized("expected a bearer token".to_string()))?;

        let claims = state.sessions.verify(token)?;
        tracing::debug!("Admin session {} accepted", claims.session_id);
        Ok(AdminSession(claims))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> PortalResult<Json<IssuedSession>> {
    if request.password.is_empty() {
        return Err(PortalError::missing_field("password"));
    }
    Ok(Json(state.sessions.login(&request.password)?))
}
