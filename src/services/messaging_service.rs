// src/services/messaging_service.rs
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing;
use uuid::Uuid;

use crate::{
    errors::{PortalError, PortalResult},
    models::notification::{NotificationIntent, NotificationTarget, PushMessage},
};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("FCM send failed: {0}")]
    FcmError(String),

    #[error("FCM rejected the request: {0}")]
    Rejected(String),

    #[error("FCM returned status {0}")]
    Status(u16),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub fcm_server_key: String,
    pub fcm_url: String,
    pub iid_url: String,
    pub timeout: Duration,
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            fcm_server_key: String::new(),
            fcm_url: "https://fcm.googleapis.com/fcm/send".to_string(),
            iid_url: "https://iid.googleapis.com/iid/v1".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Push-messaging provider operations. Each call is a single attempt.
#[async_trait]
pub trait PushProvider: Send + Sync {
    async fn send_to_token(&self, token: &str, message: &PushMessage) -> Result<(), NotificationError>;
    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> Result<(), NotificationError>;
    async fn subscribe(&self, token: &str, topic: &str) -> Result<(), NotificationError>;
    async fn unsubscribe(&self, token: &str, topic: &str) -> Result<(), NotificationError>;
}

pub struct FcmPushProvider {
    config: FcmConfig,
    client: reqwest::Client,
}

impl FcmPushProvider {
    pub fn new(config: FcmConfig) -> PortalResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn build_message(to: &str, message: &PushMessage) -> Value {
        let mut notification = json!({
            "title": message.title,
            "body": message.body,
        });
        if let Some(image) = &message.image {
            notification["image"] = json!(image);
        }
        if let Some(link) = &message.link {
            notification["click_action"] = json!(link);
        }

        // The service worker reads everything from the data block, so the
        // visible fields are mirrored there.
        let mut data = json!({
            "notification_id": Uuid::new_v4().to_string(),
            "sent_at": Utc::now().to_rfc3339(),
            "title": message.title,
            "body": message.body,
        });
        if let Some(image) = &message.image {
            data["image"] = json!(image);
        }
        if let Some(link) = &message.link {
            data["url"] = json!(link);
        }
        for (key, value) in &message.data {
            data[key.as_str()] = json!(value);
        }

        json!({
            "to": to,
            "priority": "high",
            "notification": notification,
            "data": data,
        })
    }

    async fn post(&self, url: &str, payload: &Value) -> Result<Value, NotificationError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("key={}", self.config.fcm_server_key))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| NotificationError::FcmError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("FCM request failed with {}: {}", status, error_text);
            return Err(NotificationError::Status(status));
        }

        response
            .json()
            .await
            .map_err(|e| NotificationError::SerializationError(e.to_string()))
    }

    async fn send(&self, to: &str, message: &PushMessage) -> Result<(), NotificationError> {
        let payload = Self::build_message(to, message);
        let body = self.post(&self.config.fcm_url, &payload).await?;
        check_send_response(&body)?;
        tracing::debug!("FCM notification sent to {}", to);
        Ok(())
    }

    async fn batch(&self, action: &str, token: &str, topic: &str) -> Result<(), NotificationError> {
        let url = format!("{}:{}", self.config.iid_url, action);
        let payload = json!({
            "to": topic_address(topic),
            "registration_tokens": [token],
        });
        let body = self.post(&url, &payload).await?;
        check_batch_response(&body)
    }
}

fn topic_address(topic: &str) -> String {
    if topic.starts_with("/topics/") {
        topic.to_string()
    } else {
        format!("/topics/{}", topic)
    }
}

/// Legacy send responses report failures in the body with a 200 status.
fn check_send_response(body: &Value) -> Result<(), NotificationError> {
    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Err(NotificationError::Rejected(error.to_string()));
    }
    if body.get("failure").and_then(Value::as_u64).unwrap_or(0) > 0 {
        let reason = body["results"][0]["error"].as_str().unwrap_or("unknown");
        return Err(NotificationError::Rejected(reason.to_string()));
    }
    Ok(())
}

fn check_batch_response(body: &Value) -> Result<(), NotificationError> {
    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Err(NotificationError::Rejected(error.to_string()));
    }
    if let Some(error) = body["results"][0]["error"].as_str() {
        return Err(NotificationError::Rejected(error.to_string()));
    }
    Ok(())
}

#[async_trait]
impl PushProvider for FcmPushProvider {
    async fn send_to_token(&self, token: &str, message: &PushMessage) -> Result<(), NotificationError> {
        tracing::info!("Sending FCM notification to device: {}", token);
        self.send(token, message).await
    }

    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> Result<(), NotificationError> {
        tracing::info!("Sending FCM notification to topic: {}", topic);
        self.send(&topic_address(topic), message).await
    }

    async fn subscribe(&self, token: &str, topic: &str) -> Result<(), NotificationError> {
        tracing::info!("Subscribing device to topic: {}", topic);
        self.batch("batchAdd", token, topic).await
    }

    async fn unsubscribe(&self, token: &str, topic: &str) -> Result<(), NotificationError> {
        tracing::info!("Unsubscribing device from topic: {}", topic);
        self.batch("batchRemove", token, topic).await
    }
}

/// A message the mock provider accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Token { token: String, message: PushMessage },
    Topic { topic: String, message: PushMessage },
}

// Mock provider for development and testing. Keeps what it was asked to do
// so callers can inspect it.
#[derive(Debug, Default)]
pub struct MockPushProvider {
    failing: bool,
    deliveries: Mutex<Vec<Delivery>>,
    subscriptions: Mutex<HashMap<String, BTreeSet<String>>>,
    calls: Mutex<usize>,
}

impl MockPushProvider {
    /// Mock that rejects every call.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        lock(&self.deliveries).clone()
    }

    pub fn call_count(&self) -> usize {
        *lock(&self.calls)
    }

    /// Tokens subscribed to a topic, sorted.
    pub fn subscribers(&self, topic: &str) -> Vec<String> {
        lock(&self.subscriptions)
            .get(topic)
            .map(|tokens| tokens.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn record_call(&self) -> Result<(), NotificationError> {
        *lock(&self.calls) += 1;
        if self.failing {
            return Err(NotificationError::FcmError("mock provider configured to fail".to_string()));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl PushProvider for MockPushProvider {
    async fn send_to_token(&self, token: &str, message: &PushMessage) -> Result<(), NotificationError> {
        self.record_call()?;
        tracing::info!("[MOCK] Would send FCM to {}: {} - {}", token, message.title, message.body);
        lock(&self.deliveries).push(Delivery::Token {
            token: token.to_string(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> Result<(), NotificationError> {
        self.record_call()?;
        tracing::info!("[MOCK] Would send FCM to topic {}: {} - {}", topic, message.title, message.body);
        lock(&self.deliveries).push(Delivery::Topic {
            topic: topic.to_string(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn subscribe(&self, token: &str, topic: &str) -> Result<(), NotificationError> {
        self.record_call()?;
        tracing::info!("[MOCK] Would subscribe {} to {}", token, topic);
        lock(&self.subscriptions)
            .entry(topic.to_string())
            .or_default()
            .insert(token.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, token: &str, topic: &str) -> Result<(), NotificationError> {
        self.record_call()?;
        tracing::info!("[MOCK] Would unsubscribe {} from {}", token, topic);
        let mut subscriptions = lock(&self.subscriptions);
        let now_empty = match subscriptions.get_mut(topic) {
            Some(tokens) => {
                tokens.remove(token);
                tokens.is_empty()
            }
            None => false,
        };
        if now_empty {
            subscriptions.remove(topic);
        }
        Ok(())
    }
}

/// Turns admin notification intents into provider calls. Provider failures
/// come back as `false`, never as errors.
pub struct NotificationDispatcher {
    provider: Arc<dyn PushProvider>,
}

impl NotificationDispatcher {
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self { provider }
    }

    pub async fn dispatch(&self, intent: &NotificationIntent) -> bool {
        let missing = intent.missing_fields();
        if !missing.is_empty() {
            tracing::warn!("Refusing to dispatch notification, missing: {}", missing.join(", "));
            return false;
        }

        let message = intent.message();
        match &intent.target {
            NotificationTarget::Token(token) => self.send_to_token(token, &message).await,
            NotificationTarget::Topic(topic) => self.send_to_topic(topic, &message).await,
            NotificationTarget::Content(content_type) => {
                tracing::debug!("Routing {} notification to its topic", content_type);
                self.send_to_topic(content_type.topic(), &message).await
            }
        }
    }

    async fn send_to_token(&self, token: &str, message: &PushMessage) -> bool {
        if token.trim().is_empty() {
            tracing::warn!("Refusing to dispatch notification, empty device token");
            return false;
        }
        match self.provider.send_to_token(token, message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Direct notification failed: {}", e);
                false
            }
        }
    }

    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> bool {
        if topic.trim().is_empty() {
            tracing::warn!("Refusing to dispatch notification, empty topic");
            return false;
        }
        match self.provider.send_to_topic(topic, message).await {
            Ok(()) => {
                tracing::info!("Notification sent to topic {}", topic);
                true
            }
            Err(e) => {
                tracing::error!("Topic notification to {} failed: {}", topic, e);
                false
            }
        }
    }

    pub async fn subscribe(&self, token: &str, topic: &str) -> PortalResult<bool> {
        require_subscription_fields(token, topic)?;
        Ok(match self.provider.subscribe(token, topic).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Subscribing to {} failed: {}", topic, e);
                false
            }
        })
    }

    pub async fn unsubscribe(&self, token: &str, topic: &str) -> PortalResult<bool> {
        require_subscription_fields(token, topic)?;
        Ok(match self.provider.unsubscribe(token, topic).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Unsubscribing from {} failed: {}", topic, e);
                false
            }
        })
    }
}

fn require_subscription_fields(token: &str, topic: &str) -> PortalResult<()> {
    if token.trim().is_empty() {
        return Err(PortalError::invalid_input("token is required"));
    }
    if topic.trim().is_empty() {
        return Err(PortalError::invalid_input("topic is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::ContentType;

    fn dispatcher() -> (NotificationDispatcher, Arc<MockPushProvider>) {
        let provider = Arc::new(MockPushProvider::default());
        (NotificationDispatcher::new(provider.clone()), provider)
    }

    #[tokio::test]
    async fn test_blank_title_or_body_never_reaches_provider() {
        let (dispatcher, provider) = dispatcher();

        let no_title = NotificationIntent::new(NotificationTarget::Topic("news".into()), "", "x");
        let no_body = NotificationIntent::new(NotificationTarget::Topic("news".into()), "x", "");
        assert!(!dispatcher.dispatch(&no_title).await);
        assert!(!dispatcher.dispatch(&no_body).await);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_topic_dispatch_sends_once() {
        let (dispatcher, provider) = dispatcher();

        let intent = NotificationIntent::new(NotificationTarget::Topic("news".into()), "T", "B");
        assert!(dispatcher.dispatch(&intent).await);

        let expected = PushMessage {
            title: "T".to_string(),
            body: "B".to_string(),
            ..Default::default()
        };
        assert_eq!(
            provider.deliveries(),
            vec![Delivery::Topic {
                topic: "news".to_string(),
                message: expected,
            }]
        );
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_token_dispatch() {
        let (dispatcher, provider) = dispatcher();

        let intent = NotificationIntent::new(NotificationTarget::Token("device-1".into()), "T", "B")
            .with_image("https://example.org/a.png");
        assert!(dispatcher.dispatch(&intent).await);

        match provider.deliveries().as_slice() {
            [Delivery::Token { token, message }] => {
                assert_eq!(token, "device-1");
                assert_eq!(message.image.as_deref(), Some("https://example.org/a.png"));
            }
            other => panic!("unexpected deliveries: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_token_rejected_without_call() {
        let (dispatcher, provider) = dispatcher();
        let intent = NotificationIntent::new(NotificationTarget::Token(" ".into()), "T", "B");
        assert!(!dispatcher.dispatch(&intent).await);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_content_dispatch_routes_to_topic() {
        let (dispatcher, provider) = dispatcher();

        let intent = NotificationIntent::new(NotificationTarget::Content(ContentType::Emergency), "Flood alert", "Stay indoors")
            .with_tamil("வெள்ள எச்சரிக்கை", "வீட்டிலேயே இருங்கள்");
        assert!(dispatcher.dispatch(&intent).await);

        match provider.deliveries().as_slice() {
            [Delivery::Topic { topic, message }] => {
                assert_eq!(topic, "emergency");
                assert_eq!(message.title, "Flood alert | வெள்ள எச்சரிக்கை");
                assert_eq!(message.data.get("content_type").map(String::as_str), Some("emergency"));
            }
            other => panic!("unexpected deliveries: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_failure_is_false() {
        let provider = Arc::new(MockPushProvider::failing());
        let dispatcher = NotificationDispatcher::new(provider.clone());

        let intent = NotificationIntent::new(NotificationTarget::Topic("news".into()), "T", "B");
        assert!(!dispatcher.dispatch(&intent).await);
        assert_eq!(provider.call_count(), 1);

        assert!(!dispatcher.subscribe("device-1", "news").await.unwrap());
    }

    #[tokio::test]
    async fn test_subscribe_then_unsubscribe_round_trip() {
        let (dispatcher, provider) = dispatcher();
        dispatcher.subscribe("device-0", "events").await.unwrap();
        let before = provider.subscribers("events");

        assert!(dispatcher.subscribe("device-1", "events").await.unwrap());
        assert_eq!(provider.subscribers("events"), vec!["device-0", "device-1"]);

        assert!(dispatcher.unsubscribe("device-1", "events").await.unwrap());
        assert_eq!(provider.subscribers("events"), before);
    }

    #[tokio::test]
    async fn test_subscription_requires_both_fields() {
        let (dispatcher, provider) = dispatcher();
        assert!(matches!(dispatcher.subscribe("", "news").await, Err(PortalError::InvalidInput(_))));
        assert!(matches!(dispatcher.unsubscribe("device-1", " ").await, Err(PortalError::InvalidInput(_))));
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_build_message() {
        let mut message = PushMessage {
            title: "T".to_string(),
            body: "B".to_string(),
            link: Some("/events/7".to_string()),
            ..Default::default()
        };
        message.data.insert("content_type".to_string(), "events".to_string());

        let payload = FcmPushProvider::build_message("/topics/events", &message);
        assert_eq!(payload["to"], "/topics/events");
        assert_eq!(payload["notification"]["title"], "T");
        assert_eq!(payload["notification"]["click_action"], "/events/7");
        assert!(payload["notification"].get("image").is_none());
        assert_eq!(payload["data"]["url"], "/events/7");
        assert_eq!(payload["data"]["content_type"], "events");
        assert!(payload["data"]["notification_id"].is_string());
    }

    #[test]
    fn test_response_checks() {
        assert!(check_send_response(&json!({"message_id": 42})).is_ok());
        assert!(check_send_response(&json!({"success": 1, "failure": 0, "results": [{"message_id": "a"}]})).is_ok());
        assert!(matches!(
            check_send_response(&json!({"success": 0, "failure": 1, "results": [{"error": "NotRegistered"}]})),
            Err(NotificationError::Rejected(reason)) if reason == "NotRegistered"
        ));
        assert!(check_send_response(&json!({"error": "TopicsMessageRateExceeded"})).is_err());

        assert!(check_batch_response(&json!({"results": [{}]})).is_ok());
        assert!(check_batch_response(&json!({"results": [{"error": "INVALID_ARGUMENT"}]})).is_err());
    }

    #[test]
    fn test_topic_address() {
        assert_eq!(topic_address("news"), "/topics/news");
        assert_eq!(topic_address("/topics/news"), "/topics/news");
    }
}
