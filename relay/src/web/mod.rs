//! Web server module.
//!
//! Three routes behind one middleware chain:
//!
//! ```text
//! request_id → access_log → trace → timeouts → { /health, /version, /webhook }
//! ```

pub mod handlers;
pub mod middleware;
pub mod signature;

use std::time::Duration;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

pub use handlers::{
    health, version, webhook, AppState, VersionResponse, WEBHOOK_ACK, WEBHOOK_NOTIFIED,
};
pub use middleware::{access_log, request_id, RequestId, REQUEST_ID_HEADER};
pub use signature::verify_github_signature;

/// Upper bound for receiving a request body.
pub const READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound for producing a response.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

/// Build the application router with its middleware chain.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version))
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id))
                .layer(from_fn(access_log))
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyTimeoutLayer::new(READ_TIMEOUT))
                .layer(TimeoutLayer::new(WRITE_TIMEOUT)),
        )
        .with_state(state)
}
