//! Homepage spotlight handler.

use axum::Json;
use axum::extract::State;

use crate::infra::http::api::models::HomeEnvelope;
use crate::infra::http::api::state::ApiState;

pub async fn homepage(State(state): State<ApiState>) -> Json<HomeEnvelope> {
    let spotlight = state.listing.homepage().await;
    Json(HomeEnvelope::from(spotlight))
}
