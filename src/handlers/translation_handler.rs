// src/handlers/translation_handler.rs
use axum::{Json, extract::State};
use std::sync::Arc;

use crate::{
    errors::{PortalError, PortalResult},
    models::{
        language::Language,
        translation::{BatchTranslateRequest, BatchTranslateResponse, TranslateRequest, TranslateResponse, Translation},
    },
    state::AppState,
};

const MAX_BATCH_SIZE: usize = 50;

pub async fn translate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TranslateRequest>,
) -> PortalResult<Json<TranslateResponse>> {
    let translation = state
        .translation_service
        .resolve(&request.text, request.target_language, request.source_language)
        .await?;
    Ok(Json(translation.into()))
}

/// Translates several texts one after another. Blank entries come back unchanged.
pub async fn translate_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchTranslateRequest>,
) -> PortalResult<Json<BatchTranslateResponse>> {
    if request.texts.is_empty() {
        return Err(PortalError::missing_field("texts"));
    }
    if request.texts.len() > MAX_BATCH_SIZE {
        return Err(PortalError::validation_error(
            "texts",
            format!("at most {} texts per request", MAX_BATCH_SIZE),
        ));
    }

    tracing::info!("Translating batch of {} texts to {}", request.texts.len(), request.target_language);

    let mut results = Vec::with_capacity(request.texts.len());
    for text in &request.texts {
        let translation = if text.trim().is_empty() {
            let source = request.source_language.unwrap_or(Language::En);
            Translation::passthrough(text, source, request.target_language)
        } else {
            state
                .translation_service
                .resolve(text, request.target_language, request.source_language)
                .await?
        };
        results.push(translation.into());
    }

    Ok(Json(BatchTranslateResponse { results }))
}
