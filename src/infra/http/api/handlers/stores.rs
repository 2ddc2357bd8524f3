//! Store listing and detail handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;

use crate::application::listing::ListError;

use super::StoreListQuery;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::offset_envelope;
use crate::infra::http::api::state::ApiState;

pub async fn list_stores(
    State(state): State<ApiState>,
    Query(query): Query<StoreListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query.into_params(state.listing.navigator().default_limit());

    match state.listing.list_merchants(&params).await {
        Ok(result) => Ok(Json(offset_envelope(result))),
        Err(ListError::UnknownCategory) => Err(ApiError::not_found("unknown category")),
        Err(ListError::UnknownStore) => Err(ApiError::not_found("unknown store")),
        Err(ListError::Repo(error)) => Err(ApiError::internal(error.to_string())),
    }
}

pub async fn get_store(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let merchant = state
        .listing
        .find_merchant(&slug)
        .await
        .map_err(|error| ApiError::internal(error.to_string()))?;

    match merchant {
        Some(merchant) => Ok(Json(merchant)),
        None => Err(ApiError::not_found("store not found")),
    }
}
