// src/handlers/notification_handler.rs
use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    errors::{PortalError, PortalResult, ValidationError},
    handlers::admin_handler::AdminSession,
    models::notification::{
        NotificationIntent, NotificationTarget, PushMessage, SendNotificationRequest, SubscriptionRequest,
        SuccessResponse,
    },
    presentation::{self, NotificationDisplay, PushPayload},
    state::AppState,
};

fn intent_from(request: SendNotificationRequest) -> PortalResult<NotificationIntent> {
    let intent = NotificationIntent::try_from(request)?;
    let missing = intent.missing_fields();
    if !missing.is_empty() {
        return Err(PortalError::ValidationFailed(
            missing
                .into_iter()
                .map(|field| ValidationError {
                    field: field.to_string(),
                    message: format!("{} is required", field),
                })
                .collect(),
        ));
    }
    Ok(intent)
}

pub async fn send_notification(
    _admin: AdminSession,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendNotificationRequest>,
) -> PortalResult<Json<SuccessResponse>> {
    let intent = intent_from(request)?;
    let success = state.dispatcher.dispatch(&intent).await;
    if !success {
        tracing::warn!("Notification was not delivered to the provider");
    }
    Ok(Json(SuccessResponse { success }))
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubscriptionRequest>,
) -> PortalResult<Json<SuccessResponse>> {
    let success = state.dispatcher.subscribe(request.token.trim(), request.topic.trim()).await?;
    Ok(Json(SuccessResponse { success }))
}

pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubscriptionRequest>,
) -> PortalResult<Json<SuccessResponse>> {
    let success = state.dispatcher.unsubscribe(request.token.trim(), request.topic.trim()).await?;
    Ok(Json(SuccessResponse { success }))
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub message: PushMessage,
    pub displays: Vec<NotificationDisplay>,
}

/// Shows what devices would display for a notification, without sending it.
pub async fn preview_notification(
    _admin: AdminSession,
    Json(request): Json<SendNotificationRequest>,
) -> PortalResult<Json<PreviewResponse>> {
    let intent = intent_from(request)?;
    let topic = match &intent.target {
        NotificationTarget::Topic(topic) => Some(topic.clone()),
        NotificationTarget::Content(content_type) => Some(content_type.topic().to_string()),
        NotificationTarget::Token(_) => None,
    };
    let message = intent.message();
    let displays = presentation::displays_for(&PushPayload::from(&message));

    Ok(Json(PreviewResponse {
        topic,
        message,
        displays,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{admin, test_state};
    use crate::services::messaging_service::Delivery;

    fn request(mode: &str, target: Option<&str>) -> SendNotificationRequest {
        SendNotificationRequest {
            mode: mode.to_string(),
            target: target.map(str::to_string),
            title: "T".to_string(),
            body: "B".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_send_topic_notification() {
        let (state, provider) = test_state();
        let Json(response) = send_notification(admin(&state), State(state.clone()), Json(request("topic", Some("news"))))
            .await
            .unwrap();

        assert!(response.success);
        assert!(matches!(provider.deliveries().as_slice(), [Delivery::Topic { topic, .. }] if topic == "news"));
    }

    #[tokio::test]
    async fn test_send_bogus_mode() {
        let (state, provider) = test_state();
        let result = send_notification(admin(&state), State(state.clone()), Json(request("bogus", Some("x")))).await;
        assert!(matches!(result, Err(PortalError::InvalidAddressMode(_))));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_send_missing_title() {
        let (state, provider) = test_state();
        let mut req = request("token", Some("device-1"));
        req.title = String::new();

        let result = send_notification(admin(&state), State(state.clone()), Json(req)).await;
        match result {
            Err(PortalError::ValidationFailed(errors)) => assert_eq!(errors[0].field, "title"),
            _ => panic!("expected validation failure"),
        }
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_endpoints() {
        let (state, provider) = test_state();
        let sub = SubscriptionRequest {
            token: "device-1".to_string(),
            topic: "events".to_string(),
        };

        let Json(response) = subscribe(State(state.clone()), Json(sub.clone())).await.unwrap();
        assert!(response.success);
        assert_eq!(provider.subscribers("events"), vec!["device-1"]);

        let Json(response) = unsubscribe(State(state.clone()), Json(sub)).await.unwrap();
        assert!(response.success);
        assert!(provider.subscribers("events").is_empty());

        let blank = SubscriptionRequest::default();
        assert!(matches!(subscribe(State(state), Json(blank)).await, Err(PortalError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_preview_emergency() {
        let (state, provider) = test_state();
        let mut req = request("content", None);
        req.content_type = Some("emergency".to_string());
        req.link = Some("/alerts/1".to_string());

        let Json(preview) = preview_notification(admin(&state), Json(req)).await.unwrap();
        assert_eq!(preview.topic.as_deref(), Some("emergency"));
        assert_eq!(preview.displays.len(), 2);
        assert_eq!(preview.displays[0].data.url, "/alerts/1");
        assert_eq!(provider.call_count(), 0);
    }
}
