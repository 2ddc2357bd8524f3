//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::OfferCursor;
use crate::domain::entities::{ArticleRecord, ClickAuditRecord, MerchantRecord, OfferRecord};
use crate::domain::offer_ref::CanonicalId;
use crate::domain::types::{ArticleSort, CouponKind, MerchantSort, OfferSort, OfferStatusFilter};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Filter predicates for offer listings. The same set is applied to the page
/// query, the count query, and the keyset query, so every mode sees one
/// consistent result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferFilter {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub merchant_id: Option<i64>,
    pub kind: Option<CouponKind>,
    pub status: Option<OfferStatusFilter>,
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MerchantFilter {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFilter {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub locale: Option<String>,
}

#[async_trait]
pub trait OffersRepo: Send + Sync {
    /// Offset-mode page: rows `[offset, offset + limit)` under `sort`, ties
    /// broken by id descending.
    async fn list_offers(
        &self,
        filter: &OfferFilter,
        sort: OfferSort,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<OfferRecord>, RepoError>;

    async fn count_offers(&self, filter: &OfferFilter) -> Result<u64, RepoError>;

    /// Keyset-mode page: rows with id strictly below the cursor id, id
    /// descending, exactly `limit` rows fetched.
    async fn list_offers_after(
        &self,
        filter: &OfferFilter,
        cursor: Option<OfferCursor>,
        limit: u32,
    ) -> Result<Vec<OfferRecord>, RepoError>;

    /// Homepage spotlight: small fixed projection, no counting.
    async fn spotlight_offers(&self, limit: u32) -> Result<Vec<OfferRecord>, RepoError>;

    async fn find_canonical(&self, id: CanonicalId) -> Result<Option<OfferRecord>, RepoError>;

    /// Store-side atomic increment; returns the post-increment count.
    async fn increment_clicks(&self, id: i64) -> Result<i64, RepoError>;
}

#[async_trait]
pub trait MerchantsRepo: Send + Sync {
    async fn list_merchants(
        &self,
        filter: &MerchantFilter,
        sort: MerchantSort,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<MerchantRecord>, RepoError>;

    async fn count_merchants(&self, filter: &MerchantFilter) -> Result<u64, RepoError>;

    async fn spotlight_merchants(&self, limit: u32) -> Result<Vec<MerchantRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<MerchantRecord>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<MerchantRecord>, RepoError>;
}

#[async_trait]
pub trait ArticlesRepo: Send + Sync {
    async fn list_articles(
        &self,
        filter: &ArticleFilter,
        sort: ArticleSort,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ArticleRecord>, RepoError>;

    async fn count_articles(&self, filter: &ArticleFilter) -> Result<u64, RepoError>;

    async fn spotlight_articles(&self, limit: u32) -> Result<Vec<ArticleRecord>, RepoError>;
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    async fn find_category_id(&self, slug: &str) -> Result<Option<i64>, RepoError>;
}

#[async_trait]
pub trait ClickAuditRepo: Send + Sync {
    async fn append_click(&self, record: ClickAuditRecord) -> Result<(), RepoError>;
}
