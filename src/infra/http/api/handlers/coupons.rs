//! Coupon listing and detail handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use tracing::warn;

use crate::application::listing::{KeysetResult, ListError, OfferListing};
use crate::application::pagination::CursorPage;
use crate::domain::offer_ref::CanonicalId;

use super::CouponListQuery;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{keyset_envelope, offset_envelope};
use crate::infra::http::api::state::ApiState;

pub async fn list_coupons(
    State(state): State<ApiState>,
    Query(query): Query<CouponListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query.into_params(state.listing.navigator().default_limit());

    match state.listing.list_offers(&params).await {
        Ok(OfferListing::Offset(result)) => Ok(Json(offset_envelope(result))),
        Ok(OfferListing::Keyset(result)) => Ok(Json(keyset_envelope(result))),
        Err(ListError::UnknownCategory) => Err(ApiError::not_found("unknown category")),
        Err(ListError::UnknownStore) => Err(ApiError::not_found("unknown store")),
        // keyset failures degrade here: an empty page beats a broken listing
        Err(ListError::Repo(error)) => {
            warn!(error = %error, "coupon keyset listing failed, serving empty page");
            Ok(Json(keyset_envelope(KeysetResult {
                page: CursorPage::empty(),
                canonical: "/coupons".to_string(),
                limit: params.limit,
            })))
        }
    }
}

pub async fn get_coupon(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(canonical) = CanonicalId::parse(&id) else {
        return Err(ApiError::bad_request(
            "invalid coupon id",
            Some(format!("`{id}` is not a numeric or UUID identifier")),
        ));
    };

    let offer = state
        .listing
        .find_offer(canonical)
        .await
        .map_err(|error| ApiError::internal(error.to_string()))?;

    match offer {
        Some(offer) => Ok(Json(offer)),
        None => Err(ApiError::not_found("coupon not found")),
    }
}
