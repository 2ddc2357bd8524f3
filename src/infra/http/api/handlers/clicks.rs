//! Offer click handler.

use std::net::SocketAddr;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use metrics::counter;
use tracing::error;

use crate::application::clicks::ClickContext;
use crate::infra::http::api::models::{ClickFailure, ClickRequest, ClickResponse};
use crate::infra::http::api::state::ApiState;
use crate::infra::http::middleware::client_ip;

pub async fn click_offer(
    State(state): State<ApiState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(offer_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let client = client_ip(&headers, peer);

    if !state.rate_limiter.allow(&client, &offer_id) {
        counter!("dealstack_click_rate_limited_total").increment(1);
        let mut response = rejection(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many clicks for this offer, try again shortly",
        );
        let retry_after = state.rate_limiter.retry_after_secs().to_string();
        if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        return response;
    }

    // the body is optional and best-effort: clicks must not bounce on a
    // missing or malformed payload
    let payload: ClickRequest = if body.is_empty() {
        ClickRequest::default()
    } else {
        serde_json::from_slice(&body).unwrap_or_default()
    };
    let ctx = ClickContext {
        client_ip: client,
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        referrer: payload.referrer,
        platform: payload.platform,
        store_slug: payload.store_slug,
    };

    match state.clicks.register_click(&offer_id, ctx).await {
        Ok(Some(outcome)) => {
            let body = ClickResponse {
                ok: true,
                code: outcome.code,
                redirect_url: outcome.redirect_url,
                clicks: outcome.clicks,
                message: "Click registered".to_string(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(None) => rejection(StatusCode::NOT_FOUND, "Offer not found"),
        Err(err) => {
            error!(offer_id = %offer_id, error = %err, "click registration failed");
            rejection(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not register the click",
            )
        }
    }
}

fn rejection(status: StatusCode, message: &str) -> Response {
    let body = ClickFailure {
        ok: false,
        message: message.to_string(),
    };
    (status, Json(body)).into_response()
}
