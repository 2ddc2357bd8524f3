//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{BlockKind, CouponKind};

/// A coupon/deal persisted as its own row.
///
/// `click_count` is only ever mutated through the click accountant's atomic
/// store-side increment, never by reading and writing it back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferRecord {
    pub id: i64,
    pub uuid: Uuid,
    pub kind: CouponKind,
    pub title: String,
    pub description: String,
    pub code: Option<String>,
    pub ends_at: Option<OffsetDateTime>,
    pub click_count: i64,
    pub featured: bool,
    pub locale: String,
    pub merchant_id: i64,
    pub merchant_slug: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantRecord {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub category_slug: Option<String>,
    pub affiliate_url: Option<String>,
    pub website_url: Option<String>,
    pub offer_count: i64,
    pub featured: bool,
    pub locale: String,
    pub h2_blocks: Vec<ContentBlock>,
    pub h3_blocks: Vec<ContentBlock>,
    pub created_at: OffsetDateTime,
}

/// An editorial block embedded in a merchant row. Synthetic offers are
/// reconstructed from these per request and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub description: String,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleRecord {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub category_slug: Option<String>,
    pub locale: String,
    pub published_at: OffsetDateTime,
}

/// An offer reconstructed from a merchant block; exists only for the duration
/// of the request that resolved it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticOffer {
    pub id: String,
    pub merchant_id: i64,
    pub merchant_slug: String,
    pub title: String,
    pub description: String,
    pub redirect_url: Option<String>,
    pub block_kind: BlockKind,
    pub block_index: usize,
}

/// Outcome of offer reference resolution: either a stored row or a view
/// derived from merchant content.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedOffer {
    Canonical(OfferRecord),
    Synthetic(SyntheticOffer),
}

impl ResolvedOffer {
    pub fn merchant_id(&self) -> i64 {
        match self {
            ResolvedOffer::Canonical(offer) => offer.merchant_id,
            ResolvedOffer::Synthetic(offer) => offer.merchant_id,
        }
    }

    pub fn reference(&self) -> String {
        match self {
            ResolvedOffer::Canonical(offer) => offer.id.to_string(),
            ResolvedOffer::Synthetic(offer) => offer.id.clone(),
        }
    }
}

/// Click audit record, written best-effort by the background audit writer.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickAuditRecord {
    pub id: Uuid,
    pub offer_ref: String,
    pub merchant_id: i64,
    pub client_ip: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub platform: Option<String>,
    pub store_slug: Option<String>,
    pub source: ClickSource,
    pub block_kind: Option<BlockKind>,
    pub block_index: Option<i32>,
    pub created_at: OffsetDateTime,
}

/// How the clicked offer was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "click_source", rename_all = "snake_case")]
pub enum ClickSource {
    Canonical,
    MerchantBlock,
}
