// src/handlers/mod.rs
use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

pub mod admin_handler;
pub mod device_handler;
pub mod notification_handler;
pub mod translation_handler;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub dictionary_phrases: usize,
    pub admin_login: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        dictionary_phrases: state.translation_service.dictionary().len(),
        admin_login: state.sessions.login_enabled(),
    })
}
