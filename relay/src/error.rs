//! Error types for configuration, webhook validation and notification delivery.

use thiserror::Error;

/// Fatal configuration problems detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GitHub webhook secret not set (GITHUB_SECRET)")]
    MissingWebhookSecret,

    #[error("Telegram timeout of {timeout_ms} ms must be below the {limit_ms} ms webhook response timeout")]
    TelegramTimeoutTooLong { timeout_ms: u128, limit_ms: u128 },
}

/// Reasons an inbound webhook is rejected.
///
/// None of these reach the caller as a status code; the webhook handler logs
/// them and acknowledges the request anyway.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing X-GitHub-Event header")]
    MissingEventHeader,

    #[error("missing X-Hub-Signature-256 or X-Hub-Signature header")]
    MissingSignature,

    #[error("malformed signature header")]
    MalformedSignature,

    #[error("HMAC verification failed")]
    SignatureMismatch,

    #[error("failed to decode {event} payload: {source}")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures while talking to the Telegram Bot API.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram bot token not configured")]
    NotConfigured,

    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram API rejected {method}: {description}")]
    Api {
        method: &'static str,
        description: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = NotifyError::Api {
            method: "sendMessage",
            description: "Bad Request: chat not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "telegram API rejected sendMessage: Bad Request: chat not found"
        );
    }

    #[test]
    fn test_payload_error_names_event() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = WebhookError::Payload {
            event: "watch".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("failed to decode watch payload"));
    }
}
