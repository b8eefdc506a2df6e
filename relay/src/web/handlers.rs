//! HTTP endpoint handlers.
//!
//! The webhook handler always answers 200. Signature failures and delivery
//! failures are only visible in the logs, so GitHub never retries a delivery
//! because Telegram was unreachable.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Extension, Json,
};
use serde::Serialize;
use tracing::{error, info};

use crate::error::NotifyError;
use crate::github::{self, InboundEvent};
use crate::notify::{self, TelegramClient};
use crate::web::middleware::RequestId;
use crate::Config;

/// Body returned when a webhook was accepted but nothing was sent.
pub const WEBHOOK_ACK: &str = "Event received. Have a nice day";

/// Body returned once a notification has been dispatched.
pub const WEBHOOK_NOTIFIED: &str = "OK";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub telegram: TelegramClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, NotifyError> {
        let telegram = TelegramClient::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            telegram,
        })
    }
}

// =============================================================================
// Health & Version
// =============================================================================

/// Liveness check.
pub async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
}

pub async fn version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: state.config.version.clone(),
    })
}

// =============================================================================
// GitHub Webhook
// =============================================================================

/// GitHub webhook endpoint.
///
/// This endpoint:
/// 1. Verifies the HMAC signature against the shared secret
/// 2. Decodes `watch` events, ignoring every other kind
/// 3. Sends one Telegram notification per star
pub async fn webhook(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    headers: HeaderMap,
    body: Bytes,
) -> &'static str {
    let request_id = request_id
        .map(|Extension(id)| id.as_str().to_string())
        .unwrap_or_default();

    let event = match github::parse_webhook(&headers, &body, &state.config.webhook_secret) {
        Ok(Some(event)) => event,
        Ok(None) => return WEBHOOK_ACK,
        Err(e) => {
            error!(
                request_id = %request_id,
                event = github::event_name(&headers).unwrap_or_default(),
                error = %e,
                "webhook_rejected"
            );
            return WEBHOOK_ACK;
        }
    };

    match &event {
        InboundEvent::Watch(watch) => info!(
            request_id = %request_id,
            repository = %watch.repository_name,
            stars = watch.star_count,
            sender = %watch.sender_profile_url,
            "watch_event_received"
        ),
    }

    if let Err(e) = notify::dispatch(&state.telegram, &event).await {
        error!(request_id = %request_id, error = %e, "notification_send_failed");
    }

    WEBHOOK_NOTIFIED
}
