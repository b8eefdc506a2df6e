//! Request middleware: correlation ids and structured access logging.
//!
//! Applied as `request_id` (outermost) → `access_log` → routes, so the access
//! log always finds the correlation id and times the whole handler.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{ConnectInfo, Request},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::info;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const REAL_IP_HEADER: &str = "x-real-ip";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Placeholder for values that could not be determined.
const UNKNOWN: &str = "unknown";

/// Correlation id attached to each request's extensions.
///
/// Keeps the header bytes exactly as received so they can be echoed back, plus
/// a lossy UTF-8 rendering for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId {
    header: HeaderValue,
    text: String,
}

impl RequestId {
    pub fn from_header(header: HeaderValue) -> Self {
        let text = String::from_utf8_lossy(header.as_bytes()).into_owned();
        Self { header, text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn header_value(&self) -> &HeaderValue {
        &self.header
    }
}

static LAST_GENERATED_ID: AtomicU64 = AtomicU64::new(0);

/// New id from the wall clock in nanoseconds, bumped when two requests land on
/// the same nanosecond so ids stay distinct within the process.
pub fn generate_request_id() -> RequestId {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();

    let mut last = LAST_GENERATED_ID.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_GENERATED_ID.compare_exchange_weak(
            last,
            next,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return RequestId::from_header(HeaderValue::from(next)),
            Err(actual) => last = actual,
        }
    }
}

/// Propagate `X-Request-Id` or mint one, and echo it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .filter(|v| !v.is_empty())
        .cloned()
        .map(RequestId::from_header)
        .unwrap_or_else(generate_request_id);

    let echoed = id.header_value().clone();
    req.extensions_mut().insert(id);

    let mut response = next.run(req).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, echoed);
    response
}

/// Log one structured record per completed request.
pub async fn access_log(req: Request, next: Next) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let headers = req.headers().clone();

    let start = Instant::now();
    let response = next.run(req).await;
    let latency = latency_ms(start.elapsed());

    info!(
        hostname = %hostname(),
        request_id = %request_id,
        latency = latency,
        client_ip = %client_ip(&headers, peer.as_deref()),
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        header = ?headers,
        referer = header_value(&headers, header::REFERER.as_str()),
        user_agent = header_value(&headers, header::USER_AGENT.as_str()),
        "request"
    );

    response
}

/// Elapsed time in whole milliseconds, rounded up.
pub fn latency_ms(elapsed: Duration) -> u64 {
    elapsed.as_nanos().div_ceil(1_000_000) as u64
}

/// Originating client: `X-Real-Ip`, then `X-Forwarded-For`, then the peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<&str>) -> String {
    [REAL_IP_HEADER, FORWARDED_FOR_HEADER]
        .into_iter()
        .map(|name| header_value(headers, name))
        .find(|v| !v.is_empty())
        .or(peer)
        .unwrap_or(UNKNOWN)
        .to_string()
}

fn hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
