// src/server.rs
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{delete, get, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    config::Config,
    errors::{PortalError, PortalResult},
    handlers::{self, admin_handler, device_handler, notification_handler, translation_handler},
    state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let cors = match state
        .config
        .allowed_origin
        .as_deref()
        .and_then(|origin| origin.parse::<HeaderValue>().ok())
    {
        Some(origin) => cors.allow_origin(origin),
        None => cors.allow_origin(Any),
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/translate", post(translation_handler::translate))
        .route("/translate/batch", post(translation_handler::translate_batch))
        .route("/notifications/send", post(notification_handler::send_notification))
        .route("/notifications/preview", post(notification_handler::preview_notification))
        .route("/notifications/subscribe", post(notification_handler::subscribe))
        .route("/notifications/unsubscribe", post(notification_handler::unsubscribe))
        .route("/devices", post(device_handler::register_device))
        .route("/devices/:user_id", delete(device_handler::unregister_device))
        .route("/admin/session", post(admin_handler::create_session))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> PortalResult<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Loading configuration...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = Arc::new(AppState::new(config).await?);

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| PortalError::ConfigurationError(format!("cannot bind {address}: {e}")))?;
    info!("Server running on {address}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PortalError::internal_error(format!("server error: {e}")))?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
