//! Wire shapes for the public API.

use serde::{Deserialize, Serialize};

use crate::application::listing::{HomepageSpotlight, KeysetResult, ListResult};
use crate::domain::entities::{ArticleRecord, MerchantRecord, OfferRecord};

/// Standard list response: rows plus navigation metadata.
#[derive(Debug, Serialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    pub meta: ListMeta,
}

#[derive(Debug, Serialize)]
pub struct ListMeta {
    pub page: u32,
    pub limit: u32,
    /// `null` under cursor pagination: counting a keyset range is not
    /// attempted.
    pub total: Option<u64>,
    pub canonical: String,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub total_pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

pub fn offset_envelope<T>(result: ListResult<T>) -> ListEnvelope<T> {
    ListEnvelope {
        data: result.items,
        meta: ListMeta {
            page: result.page,
            limit: result.limit,
            total: Some(result.total),
            canonical: result.links.canonical,
            prev: result.links.prev,
            next: result.links.next,
            total_pages: Some(result.links.total_pages),
            next_cursor: None,
            has_more: None,
        },
    }
}

pub fn keyset_envelope<T>(result: KeysetResult<T>) -> ListEnvelope<T> {
    ListEnvelope {
        data: result.page.items,
        meta: ListMeta {
            page: 1,
            limit: result.limit,
            total: None,
            canonical: result.canonical,
            prev: None,
            next: None,
            total_pages: None,
            next_cursor: result.page.next_cursor,
            has_more: Some(result.page.has_more),
        },
    }
}

#[derive(Debug, Serialize)]
pub struct HomeSection<T> {
    pub data: Vec<T>,
    /// Length of the section itself: a lower bound, not a full count.
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct HomeEnvelope {
    pub coupons: HomeSection<OfferRecord>,
    pub stores: HomeSection<MerchantRecord>,
    pub blogs: HomeSection<ArticleRecord>,
}

impl From<HomepageSpotlight> for HomeEnvelope {
    fn from(spotlight: HomepageSpotlight) -> Self {
        Self {
            coupons: HomeSection {
                total: spotlight.offers.len() as u64,
                data: spotlight.offers,
            },
            stores: HomeSection {
                total: spotlight.merchants.len() as u64,
                data: spotlight.merchants,
            },
            blogs: HomeSection {
                total: spotlight.articles.len() as u64,
                data: spotlight.articles,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClickRequest {
    pub referrer: Option<String>,
    pub platform: Option<String>,
    pub store_slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClickResponse {
    pub ok: bool,
    pub code: Option<String>,
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clicks: Option<i64>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ClickFailure {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
