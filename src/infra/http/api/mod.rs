pub mod error;
pub mod handlers;
pub mod models;
pub mod rate_limit;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::http::middleware::log_responses;

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/home", get(handlers::homepage))
        .route("/api/coupons", get(handlers::list_coupons))
        .route("/api/coupons/{id}", get(handlers::get_coupon))
        .route("/api/stores", get(handlers::list_stores))
        .route("/api/stores/{slug}", get(handlers::get_store))
        .route("/api/blogs", get(handlers::list_blogs))
        .route("/api/offers/{offer_id}/click", post(handlers::click_offer))
        .layer(axum_middleware::from_fn(log_responses))
        .with_state(state)
}
