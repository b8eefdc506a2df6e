//! GitHub webhook signature verification.
//!
//! GitHub signs each delivery with the webhook secret and sends the digest in
//! `X-Hub-Signature-256: sha256=<hex>` and, for older integrations,
//! `X-Hub-Signature: sha1=<hex>`. The SHA-256 header is preferred when both are
//! present.
//! Reference: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

/// Verify the delivery signature carried in `headers` against `body`.
pub fn verify_github_signature(
    secret: &str,
    body: &[u8],
    headers: &HeaderMap,
) -> Result<(), WebhookError> {
    if let Some(value) = header_str(headers, SIGNATURE_256_HEADER) {
        return verify_sha256(secret, body, value);
    }
    if let Some(value) = header_str(headers, SIGNATURE_HEADER) {
        return verify_sha1(secret, body, value);
    }
    Err(WebhookError::MissingSignature)
}

/// Check a `sha256=<hex>` header value.
pub fn verify_sha256(secret: &str, body: &[u8], signature: &str) -> Result<(), WebhookError> {
    let expected = decode_digest(signature, "sha256=")?;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::SignatureMismatch)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| WebhookError::SignatureMismatch)
}

/// Check a legacy `sha1=<hex>` header value.
pub fn verify_sha1(secret: &str, body: &[u8], signature: &str) -> Result<(), WebhookError> {
    let expected = decode_digest(signature, "sha1=")?;
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::SignatureMismatch)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| WebhookError::SignatureMismatch)
}

fn decode_digest(signature: &str, prefix: &str) -> Result<Vec<u8>, WebhookError> {
    let hex_digest = signature
        .trim()
        .strip_prefix(prefix)
        .ok_or(WebhookError::MalformedSignature)?;
    hex::decode(hex_digest).map_err(|_| WebhookError::MalformedSignature)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
