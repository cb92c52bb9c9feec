// src/services/device_service.rs
use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing;

use crate::{
    errors::{PortalError, PortalResult},
    models::{
        device::{DeviceRegistration, DeviceResponse, RegisterDeviceRequest},
        language::Language,
    },
    services::messaging_service::NotificationDispatcher,
};

const DEVICES_KEY: &str = "portal:devices";

/// Where device registrations live. One registration per user.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Stores a registration, returning the one it replaced.
    async fn put(&self, registration: &DeviceRegistration) -> PortalResult<Option<DeviceRegistration>>;
    async fn get(&self, user_id: &str) -> PortalResult<Option<DeviceRegistration>>;
    async fn remove(&self, user_id: &str) -> PortalResult<Option<DeviceRegistration>>;
}

/// Registrations kept as JSON values in a single Redis hash keyed by user id.
pub struct RedisDeviceStore {
    connection: redis::aio::MultiplexedConnection,
}

impl RedisDeviceStore {
    pub async fn connect(redis_url: &str) -> PortalResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        tracing::info!("Connected device store to Redis");
        Ok(Self { connection })
    }
}

#[async_trait]
impl DeviceStore for RedisDeviceStore {
    async fn put(&self, registration: &DeviceRegistration) -> PortalResult<Option<DeviceRegistration>> {
        let previous = self.get(&registration.user_id).await?;
        let json = serde_json::to_string(registration)?;
        let mut conn = self.connection.clone();
        let _: () = conn.hset(DEVICES_KEY, &registration.user_id, json).await?;
        Ok(previous)
    }

    async fn get(&self, user_id: &str) -> PortalResult<Option<DeviceRegistration>> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn.hget(DEVICES_KEY, user_id).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn remove(&self, user_id: &str) -> PortalResult<Option<DeviceRegistration>> {
        let previous = self.get(user_id).await?;
        if previous.is_some() {
            let mut conn = self.connection.clone();
            let _: () = conn.hdel(DEVICES_KEY, user_id).await?;
        }
        Ok(previous)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDeviceStore {
    devices: RwLock<HashMap<String, DeviceRegistration>>,
}

#[async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn put(&self, registration: &DeviceRegistration) -> PortalResult<Option<DeviceRegistration>> {
        let mut devices = self.devices.write().await;
        Ok(devices.insert(registration.user_id.clone(), registration.clone()))
    }

    async fn get(&self, user_id: &str) -> PortalResult<Option<DeviceRegistration>> {
        Ok(self.devices.read().await.get(user_id).cloned())
    }

    async fn remove(&self, user_id: &str) -> PortalResult<Option<DeviceRegistration>> {
        Ok(self.devices.write().await.remove(user_id))
    }
}

/// Registers devices and keeps their default topic subscriptions in step.
pub struct DeviceService {
    store: Arc<dyn DeviceStore>,
    dispatcher: Arc<NotificationDispatcher>,
    default_topics: Vec<String>,
}

impl DeviceService {
    pub fn new(store: Arc<dyn DeviceStore>, dispatcher: Arc<NotificationDispatcher>, default_topics: Vec<String>) -> Self {
        Self {
            store,
            dispatcher,
            default_topics,
        }
    }

    pub async fn register(&self, request: RegisterDeviceRequest) -> PortalResult<DeviceResponse> {
        let user_id = request.user_id.trim();
        let token = request.token.trim();
        if user_id.is_empty() {
            return Err(PortalError::missing_field("userId"));
        }
        if token.is_empty() {
            return Err(PortalError::missing_field("token"));
        }

        let registration = DeviceRegistration {
            user_id: user_id.to_string(),
            push_token: token.to_string(),
            locale: request.locale.unwrap_or(Language::En),
            registered_at: Utc::now(),
        };

        tracing::info!("Registering device for user: {}", user_id);
        let previous = self.store.put(&registration).await?;

        // A replaced token no longer belongs to this user.
        if let Some(previous) = previous.filter(|p| p.push_token != registration.push_token) {
            self.unsubscribe_defaults(&previous.push_token).await;
        }

        let mut subscribed_topics = Vec::new();
        for topic in &self.default_topics {
            if self.dispatcher.subscribe(token, topic).await? {
                subscribed_topics.push(topic.clone());
            } else {
                tracing::warn!("Device for {} was not subscribed to {}", user_id, topic);
            }
        }

        Ok(DeviceResponse {
            user_id: registration.user_id,
            locale: registration.locale,
            registered_at: registration.registered_at,
            subscribed_topics,
        })
    }

    pub async fn unregister(&self, user_id: &str) -> PortalResult<()> {
        let removed = self
            .store
            .remove(user_id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("device for user {}", user_id)))?;

        tracing::info!("Unregistered device for user: {}", user_id);
        self.unsubscribe_defaults(&removed.push_token).await;
        Ok(())
    }

    pub async fn get(&self, user_id: &str) -> PortalResult<Option<DeviceRegistration>> {
        self.store.get(user_id).await
    }

    async fn unsubscribe_defaults(&self, token: &str) {
        for topic in &self.default_topics {
            match self.dispatcher.unsubscribe(token, topic).await {
                Ok(true) => {}
                Ok(false) => tracing::warn!("Could not unsubscribe stale token from {}", topic),
                Err(e) => tracing::warn!("Skipping unsubscribe from {}: {}", topic, e),
            }
        }
    }
}
