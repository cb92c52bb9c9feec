// src/handlers/device_handler.rs
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::{
    errors::PortalResult,
    models::device::{DeviceResponse, RegisterDeviceRequest},
    state::AppState,
};

pub async fn register_device(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterDeviceRequest>,
) -> PortalResult<(StatusCode, Json<DeviceResponse>)> {
    let response = state.device_service.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn unregister_device(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> PortalResult<StatusCode> {
    state.device_service.unregister(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
