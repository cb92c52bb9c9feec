// src/state.rs
use std::sync::Arc;

use crate::{
    config::Config,
    errors::PortalResult,
    services::{
        device_service::{DeviceService, DeviceStore, InMemoryDeviceStore, RedisDeviceStore},
        dictionary::PhraseDictionary,
        messaging_service::{FcmConfig, FcmPushProvider, MockPushProvider, NotificationDispatcher, PushProvider},
        session_service::SessionSigner,
        translation_service::{
            MockTranslationProvider, MyMemoryProvider, TranslationProvider, TranslationProviderConfig,
            TranslationService,
        },
    },
};

pub struct AppState {
    pub translation_service: Arc<TranslationService>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub device_service: Arc<DeviceService>,
    pub sessions: Arc<SessionSigner>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> PortalResult<Self> {
        let mut dictionary = PhraseDictionary::builtin();
        if let Some(path) = &config.phrase_file {
            dictionary = dictionary.extend(PhraseDictionary::load_entries(path)?);
        }
        tracing::info!("Loaded {} dictionary phrases", dictionary.len());

        let translation_provider: Arc<dyn TranslationProvider> = match &config.translation_api_url {
            Some(api_url) => Arc::new(MyMemoryProvider::new(TranslationProviderConfig {
                api_url: api_url.clone(),
                contact_email: config.translation_contact_email.clone(),
                timeout: config.provider_timeout,
            })?),
            None => {
                tracing::warn!("Translation provider disabled, only dictionary phrases will translate");
                Arc::new(MockTranslationProvider)
            }
        };

        let push_provider: Arc<dyn PushProvider> = match &config.fcm_server_key {
            Some(server_key) => Arc::new(FcmPushProvider::new(FcmConfig {
                fcm_server_key: server_key.clone(),
                fcm_url: config.fcm_send_url.clone(),
                iid_url: config.fcm_iid_url.clone(),
                timeout: config.provider_timeout,
            })?),
            None => {
                tracing::warn!("FCM_SERVER_KEY not set, using mock notification service");
                Arc::new(MockPushProvider::default())
            }
        };

        let device_store: Arc<dyn DeviceStore> = match &config.redis_url {
            Some(redis_url) => Arc::new(RedisDeviceStore::connect(redis_url).await?),
            None => {
                tracing::warn!("REDIS_URL not set, device registrations are kept in memory");
                Arc::new(InMemoryDeviceStore::default())
            }
        };

        Ok(Self::from_parts(
            config,
            Arc::new(dictionary),
            translation_provider,
            push_provider,
            device_store,
        ))
    }

    /// Wires the services around already-built providers.
    pub fn from_parts(
        config: Config,
        dictionary: Arc<PhraseDictionary>,
        translation_provider: Arc<dyn TranslationProvider>,
        push_provider: Arc<dyn PushProvider>,
        device_store: Arc<dyn DeviceStore>,
    ) -> Self {
        let translation_service = Arc::new(TranslationService::new(dictionary, translation_provider));
        let dispatcher = Arc::new(NotificationDispatcher::new(push_provider));
        let device_service = Arc::new(DeviceService::new(
            device_store,
            dispatcher.clone(),
            config.default_topics.clone(),
        ));
        let sessions = Arc::new(SessionSigner::new(
            &config.session_secret,
            config.session_ttl_secs,
            config.admin_password.clone(),
        ));

        Self {
            translation_service,
            dispatcher,
            device_service,
            sessions,
            config,
        }
    }
}
