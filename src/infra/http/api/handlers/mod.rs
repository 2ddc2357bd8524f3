//! API handlers organized by resource type.

mod blogs;
mod clicks;
mod coupons;
mod home;
mod stores;

pub use blogs::*;
pub use clicks::*;
pub use coupons::*;
pub use home::*;
pub use stores::*;

use axum::Json;
use serde::Deserialize;

use crate::application::listing::{ArticleListParams, MerchantListParams, OfferListParams};
use crate::domain::types::{ArticleSort, CouponKind, MerchantSort, OfferSort, OfferStatusFilter};

use super::models::HealthResponse;

const MAX_QUERY_CHARS: usize = 200;
const MAX_PAGE_SIZE: u32 = 100;

// ----- Shared query structs -----

#[derive(Debug, Deserialize)]
pub struct CouponListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub q: Option<String>,
    pub category: Option<String>,
    pub store: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<CouponKind>,
    pub status: Option<OfferStatusFilter>,
    pub sort: Option<OfferSort>,
    pub locale: Option<String>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StoreListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<MerchantSort>,
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BlogListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<ArticleSort>,
    pub locale: Option<String>,
}

fn clean_text(value: Option<String>, max_chars: usize) -> Option<String> {
    value
        .map(|text| text.chars().take(max_chars).collect::<String>())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn page_and_limit(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> (u32, u32) {
    (
        page.unwrap_or(1).max(1),
        limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
    )
}

impl CouponListQuery {
    pub fn into_params(self, default_limit: u32) -> OfferListParams {
        let (page, limit) = page_and_limit(self.page, self.limit, default_limit);
        OfferListParams {
            page,
            limit,
            q: clean_text(self.q, MAX_QUERY_CHARS),
            category: clean_text(self.category, MAX_QUERY_CHARS),
            store: clean_text(self.store, MAX_QUERY_CHARS),
            kind: self.kind,
            status: self.status,
            sort: self.sort,
            locale: clean_text(self.locale, 16),
            cursor: self.cursor,
        }
    }
}

impl StoreListQuery {
    pub fn into_params(self, default_limit: u32) -> MerchantListParams {
        let (page, limit) = page_and_limit(self.page, self.limit, default_limit);
        MerchantListParams {
            page,
            limit,
            q: clean_text(self.q, MAX_QUERY_CHARS),
            category: clean_text(self.category, MAX_QUERY_CHARS),
            sort: self.sort,
            locale: clean_text(self.locale, 16),
        }
    }
}

impl BlogListQuery {
    pub fn into_params(self, default_limit: u32) -> ArticleListParams {
        let (page, limit) = page_and_limit(self.page, self.limit, default_limit);
        ArticleListParams {
            page,
            limit,
            q: clean_text(self.q, MAX_QUERY_CHARS),
            category: clean_text(self.category, MAX_QUERY_CHARS),
            sort: self.sort,
            locale: clean_text(self.locale, 16),
        }
    }
}

// ----- Health -----

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
