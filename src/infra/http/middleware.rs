use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, http::HeaderMap, http::Request, middleware::Next, response::Response};
use tracing::{info, warn};

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();

    if status.is_client_error() || status.is_server_error() {
        warn!(%method, %uri, status = status.as_u16(), elapsed_ms, "request failed");
    } else {
        info!(%method, %uri, status = status.as_u16(), elapsed_ms, "request served");
    }

    response
}

/// Client address for rate limiting and audit: first hop of
/// `X-Forwarded-For` when the storefront proxy sets it, else the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|hop| hop.trim().to_string())
        .filter(|hop| !hop.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}
