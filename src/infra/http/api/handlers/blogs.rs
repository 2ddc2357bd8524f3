//! Blog listing handler.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;

use crate::application::listing::ListError;

use super::BlogListQuery;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::offset_envelope;
use crate::infra::http::api::state::ApiState;

pub async fn list_blogs(
    State(state): State<ApiState>,
    Query(query): Query<BlogListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query.into_params(state.listing.navigator().default_limit());

    match state.listing.list_articles(&params).await {
        Ok(result) => Ok(Json(offset_envelope(result))),
        Err(ListError::UnknownCategory) => Err(ApiError::not_found("unknown category")),
        Err(ListError::UnknownStore) => Err(ApiError::not_found("unknown store")),
        Err(ListError::Repo(error)) => Err(ApiError::internal(error.to_string())),
    }
}
