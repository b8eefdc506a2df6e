//! GitHub webhook decoding.
//!
//! Only the `watch` event (a repository being starred) is acted on. Every other
//! event kind that passes signature verification decodes to `None`.
//!
//! ## Flow
//!
//! ```text
//! headers + body → verify signature → match X-GitHub-Event → InboundEvent
//! ```

use axum::http::HeaderMap;
use serde::Deserialize;

use crate::error::WebhookError;
use crate::web::signature::verify_github_signature;

pub const EVENT_HEADER: &str = "x-github-event";

/// Event name GitHub uses for stars.
pub const WATCH_EVENT: &str = "watch";

/// Webhook events this service knows how to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Watch(WatchEvent),
}

/// A repository was starred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub repository_name: String,
    pub star_count: u64,
    pub sender_profile_url: String,
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct WatchPayload {
    repository: RepositoryPayload,
    sender: SenderPayload,
}

#[derive(Debug, Deserialize)]
struct RepositoryPayload {
    name: String,
    stargazers_count: u64,
}

#[derive(Debug, Deserialize)]
struct SenderPayload {
    html_url: String,
}

impl WatchPayload {
    fn into_event(self) -> WatchEvent {
        WatchEvent {
            repository_name: self.repository.name,
            star_count: self.repository.stargazers_count,
            sender_profile_url: self.sender.html_url,
        }
    }
}

/// Raw `X-GitHub-Event` header value, if any.
pub fn event_name(headers: &HeaderMap) -> Option<&str> {
    headers.get(EVENT_HEADER).and_then(|v| v.to_str().ok())
}

/// Authenticate and decode a webhook delivery.
///
/// Returns `Ok(None)` for authentic deliveries of events that are not acted on.
pub fn parse_webhook(
    headers: &HeaderMap,
    body: &[u8],
    secret: &str,
) -> Result<Option<InboundEvent>, WebhookError> {
    let event = event_name(headers)
        .filter(|name| !name.is_empty())
        .ok_or(WebhookError::MissingEventHeader)?;

    verify_github_signature(secret, body, headers)?;

    match event {
        WATCH_EVENT => {
            let payload: WatchPayload =
                serde_json::from_slice(body).map_err(|source| WebhookError::Payload {
                    event: event.to_string(),
                    source,
                })?;
            Ok(Some(InboundEvent::Watch(payload.into_event())))
        }
        _ => Ok(None),
    }
}
