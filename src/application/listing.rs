//! Per-entity list retrieval: homepage, offset, and keyset modes.
//!
//! Offset and keyset pages are produced by two separate strategies, selected
//! by the presence of a `cursor` parameter. Offset pages are memoized in the
//! TTL cache and degrade to an empty page on store failure; keyset pages
//! bypass the cache and surface store errors to the handler, which owns the
//! degrade-or-fail decision for its surface.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::application::cache::{KeyFields, TtlCache, list_cache_key};
use crate::application::navigator::{Navigator, PageLinks};
use crate::application::pagination::{CursorPage, OfferCursor};
use crate::application::repos::{
    ArticleFilter, ArticlesRepo, CategoriesRepo, MerchantFilter, MerchantsRepo, OfferFilter,
    OffersRepo, RepoError,
};
use crate::domain::entities::{ArticleRecord, MerchantRecord, OfferRecord};
use crate::domain::offer_ref::CanonicalId;
use crate::domain::types::{ArticleSort, CouponKind, MerchantSort, OfferSort, OfferStatusFilter};

#[derive(Debug, Error)]
pub enum ListError {
    #[error("unknown category slug")]
    UnknownCategory,
    #[error("unknown store slug")]
    UnknownStore,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Validated listing parameters for offers.
#[derive(Debug, Clone, Default)]
pub struct OfferListParams {
    pub page: u32,
    pub limit: u32,
    pub q: Option<String>,
    pub category: Option<String>,
    pub store: Option<String>,
    pub kind: Option<CouponKind>,
    pub status: Option<OfferStatusFilter>,
    pub sort: Option<OfferSort>,
    pub locale: Option<String>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MerchantListParams {
    pub page: u32,
    pub limit: u32,
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<MerchantSort>,
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ArticleListParams {
    pub page: u32,
    pub limit: u32,
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<ArticleSort>,
    pub locale: Option<String>,
}

/// One assembled offset-mode page: rows, count, and derived links.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub links: PageLinks,
}

/// One keyset-mode page plus the canonical link of the listing it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct KeysetResult<T> {
    pub page: CursorPage<T>,
    pub canonical: String,
    pub limit: u32,
}

/// Offer listing outcome, one variant per page-producer strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum OfferListing {
    Offset(ListResult<OfferRecord>),
    Keyset(KeysetResult<OfferRecord>),
}

/// Homepage spotlight sections: small fixed projections, no counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomepageSpotlight {
    pub offers: Vec<OfferRecord>,
    pub merchants: Vec<MerchantRecord>,
    pub articles: Vec<ArticleRecord>,
}

pub struct ListingService {
    offers: Arc<dyn OffersRepo>,
    merchants: Arc<dyn MerchantsRepo>,
    articles: Arc<dyn ArticlesRepo>,
    categories: Arc<dyn CategoriesRepo>,
    navigator: Navigator,
    ttl: Duration,
    homepage_limit: u32,
    offer_lists: TtlCache<ListResult<OfferRecord>>,
    merchant_lists: TtlCache<ListResult<MerchantRecord>>,
    article_lists: TtlCache<ListResult<ArticleRecord>>,
    homepage: TtlCache<HomepageSpotlight>,
}

impl ListingService {
    pub fn new(
        offers: Arc<dyn OffersRepo>,
        merchants: Arc<dyn MerchantsRepo>,
        articles: Arc<dyn ArticlesRepo>,
        categories: Arc<dyn CategoriesRepo>,
        navigator: Navigator,
        ttl: Duration,
        homepage_limit: u32,
    ) -> Self {
        Self {
            offers,
            merchants,
            articles,
            categories,
            navigator,
            ttl,
            homepage_limit,
            offer_lists: TtlCache::new("coupons"),
            merchant_lists: TtlCache::new("stores"),
            article_lists: TtlCache::new("blogs"),
            homepage: TtlCache::new("home"),
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// List offers: keyset strategy when a `cursor` parameter was supplied,
    /// offset strategy otherwise. A cursor token that fails to decode is
    /// treated as "no cursor supplied" and the keyset listing restarts from
    /// the beginning.
    pub async fn list_offers(&self, params: &OfferListParams) -> Result<OfferListing, ListError> {
        match params.cursor.as_deref() {
            Some(token) => {
                let cursor = OfferCursor::decode(token);
                let page = self.offers_keyset(params, cursor).await?;
                Ok(OfferListing::Keyset(page))
            }
            None => {
                let page = self.offers_offset(params).await;
                Ok(OfferListing::Offset(page?))
            }
        }
    }

    async fn offers_keyset(
        &self,
        params: &OfferListParams,
        cursor: Option<OfferCursor>,
    ) -> Result<KeysetResult<OfferRecord>, ListError> {
        let filter = self.offer_filter(params).await?;
        let limit = params.limit.max(1);
        let rows = self.offers.list_offers_after(&filter, cursor, limit).await?;

        let has_more = rows.len() as u64 == u64::from(limit);
        let next_cursor = if has_more {
            rows.last()
                .map(|row| OfferCursor::new(row.id, Some(row.created_at)).encode())
        } else {
            None
        };

        let canonical = self
            .navigator
            .links("/coupons", 1, limit, 0, &self.offer_link_params(params))
            .canonical;

        Ok(KeysetResult {
            page: CursorPage::new(rows, next_cursor, has_more),
            canonical,
            limit,
        })
    }

    async fn offers_offset(
        &self,
        params: &OfferListParams,
    ) -> Result<ListResult<OfferRecord>, ListError> {
        let key = list_cache_key(
            "coupons",
            &KeyFields {
                page: params.page,
                limit: params.limit,
                q: params.q.as_deref().unwrap_or(""),
                category: params.category.as_deref().unwrap_or(""),
                kind: params.kind.map(CouponKind::as_str).unwrap_or(""),
                sort: params.sort.map(OfferSort::as_str).unwrap_or(""),
                locale: params.locale.as_deref().unwrap_or(""),
                status: params.status.map(OfferStatusFilter::as_str).unwrap_or(""),
            },
        );

        let produce = || async {
            let filter = self.offer_filter(params).await?;
            let sort = params.sort.unwrap_or_default();
            let (page, limit) = (params.page.max(1), params.limit.max(1));
            let offset = u64::from(page - 1) * u64::from(limit);

            let total = self.offers.count_offers(&filter).await?;
            let items = self.offers.list_offers(&filter, sort, offset, limit).await?;
            let links = self
                .navigator
                .links("/coupons", page, limit, total, &self.offer_link_params(params));

            Ok::<_, ListError>(ListResult {
                items,
                total,
                page,
                limit,
                links,
            })
        };

        // the store filter is not part of the key shape, so store-scoped
        // listings skip the cache instead of colliding in it
        let result = if params.store.is_some() {
            produce().await
        } else {
            self.offer_lists.get_or_compute(&key, self.ttl, produce).await
        };

        match result {
            Ok(page) => Ok(page),
            Err(ListError::Repo(error)) => {
                warn!(error = %error, entity = "coupons", "list query failed, serving empty page");
                Ok(self.empty_page("/coupons", params.page, params.limit))
            }
            Err(other) => Err(other),
        }
    }

    pub async fn list_merchants(
        &self,
        params: &MerchantListParams,
    ) -> Result<ListResult<MerchantRecord>, ListError> {
        let key = list_cache_key(
            "stores",
            &KeyFields {
                page: params.page,
                limit: params.limit,
                q: params.q.as_deref().unwrap_or(""),
                category: params.category.as_deref().unwrap_or(""),
                kind: "",
                sort: params.sort.map(MerchantSort::as_str).unwrap_or(""),
                locale: params.locale.as_deref().unwrap_or(""),
                status: "",
            },
        );

        let produce = || async {
            let filter = MerchantFilter {
                search: params.q.clone(),
                category_id: self.resolve_category(params.category.as_deref()).await?,
                locale: params.locale.clone(),
            };
            let sort = params.sort.unwrap_or_default();
            let (page, limit) = (params.page.max(1), params.limit.max(1));
            let offset = u64::from(page - 1) * u64::from(limit);

            let total = self.merchants.count_merchants(&filter).await?;
            let items = self
                .merchants
                .list_merchants(&filter, sort, offset, limit)
                .await?;
            let extra = [
                ("q", params.q.clone().unwrap_or_default()),
                ("category", params.category.clone().unwrap_or_default()),
                (
                    "sort",
                    params.sort.map(|s| s.as_str().to_string()).unwrap_or_default(),
                ),
                ("locale", params.locale.clone().unwrap_or_default()),
            ];
            let links = self.navigator.links("/stores", page, limit, total, &extra);

            Ok::<_, ListError>(ListResult {
                items,
                total,
                page,
                limit,
                links,
            })
        };

        match self.merchant_lists.get_or_compute(&key, self.ttl, produce).await {
            Ok(page) => Ok(page),
            Err(ListError::Repo(error)) => {
                warn!(error = %error, entity = "stores", "list query failed, serving empty page");
                Ok(self.empty_page("/stores", params.page, params.limit))
            }
            Err(other) => Err(other),
        }
    }

    pub async fn list_articles(
        &self,
        params: &ArticleListParams,
    ) -> Result<ListResult<ArticleRecord>, ListError> {
        let key = list_cache_key(
            "blogs",
            &KeyFields {
                page: params.page,
                limit: params.limit,
                q: params.q.as_deref().unwrap_or(""),
                category: params.category.as_deref().unwrap_or(""),
                kind: "",
                sort: params.sort.map(ArticleSort::as_str).unwrap_or(""),
                locale: params.locale.as_deref().unwrap_or(""),
                status: "",
            },
        );

        let produce = || async {
            let filter = ArticleFilter {
                search: params.q.clone(),
                category_id: self.resolve_category(params.category.as_deref()).await?,
                locale: params.locale.clone(),
            };
            let sort = params.sort.unwrap_or_default();
            let (page, limit) = (params.page.max(1), params.limit.max(1));
            let offset = u64::from(page - 1) * u64::from(limit);

            let total = self.articles.count_articles(&filter).await?;
            let items = self
                .articles
                .list_articles(&filter, sort, offset, limit)
                .await?;
            let extra = [
                ("q", params.q.clone().unwrap_or_default()),
                ("category", params.category.clone().unwrap_or_default()),
                (
                    "sort",
                    params.sort.map(|s| s.as_str().to_string()).unwrap_or_default(),
                ),
                ("locale", params.locale.clone().unwrap_or_default()),
            ];
            let links = self.navigator.links("/blogs", page, limit, total, &extra);

            Ok::<_, ListError>(ListResult {
                items,
                total,
                page,
                limit,
                links,
            })
        };

        match self.article_lists.get_or_compute(&key, self.ttl, produce).await {
            Ok(page) => Ok(page),
            Err(ListError::Repo(error)) => {
                warn!(error = %error, entity = "blogs", "list query failed, serving empty page");
                Ok(self.empty_page("/blogs", params.page, params.limit))
            }
            Err(other) => Err(other),
        }
    }

    /// Homepage spotlight lists. No counts are issued; each section's length
    /// is a lower bound, not an authoritative total.
    pub async fn homepage(&self) -> HomepageSpotlight {
        let limit = self.homepage_limit;
        let produce = || async {
            let (offers, merchants, articles) = tokio::try_join!(
                self.offers.spotlight_offers(limit),
                self.merchants.spotlight_merchants(limit),
                self.articles.spotlight_articles(limit),
            )?;
            Ok::<_, RepoError>(HomepageSpotlight {
                offers,
                merchants,
                articles,
            })
        };

        match self.homepage.get_or_compute("home", self.ttl, produce).await {
            Ok(spotlight) => spotlight,
            Err(error) => {
                warn!(error = %error, entity = "home", "spotlight query failed, serving empty sections");
                HomepageSpotlight::default()
            }
        }
    }

    pub async fn find_offer(&self, id: CanonicalId) -> Result<Option<OfferRecord>, RepoError> {
        self.offers.find_canonical(id).await
    }

    pub async fn find_merchant(&self, slug: &str) -> Result<Option<MerchantRecord>, RepoError> {
        self.merchants.find_by_slug(slug).await
    }

    async fn offer_filter(&self, params: &OfferListParams) -> Result<OfferFilter, ListError> {
        let merchant_id = match params.store.as_deref() {
            Some(slug) => Some(
                self.merchants
                    .find_by_slug(slug)
                    .await?
                    .ok_or(ListError::UnknownStore)?
                    .id,
            ),
            None => None,
        };
        Ok(OfferFilter {
            search: params.q.clone(),
            category_id: self.resolve_category(params.category.as_deref()).await?,
            merchant_id,
            kind: params.kind,
            status: params.status,
            locale: params.locale.clone(),
        })
    }

    async fn resolve_category(&self, slug: Option<&str>) -> Result<Option<i64>, ListError> {
        match slug {
            Some(slug) => Ok(Some(
                self.categories
                    .find_category_id(slug)
                    .await?
                    .ok_or(ListError::UnknownCategory)?,
            )),
            None => Ok(None),
        }
    }

    fn offer_link_params(&self, params: &OfferListParams) -> Vec<(&'static str, String)> {
        vec![
            ("q", params.q.clone().unwrap_or_default()),
            ("category", params.category.clone().unwrap_or_default()),
            ("store", params.store.clone().unwrap_or_default()),
            (
                "type",
                params.kind.map(|k| k.as_str().to_string()).unwrap_or_default(),
            ),
            (
                "status",
                params
                    .status
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
            ),
            (
                "sort",
                params.sort.map(|s| s.as_str().to_string()).unwrap_or_default(),
            ),
            ("locale", params.locale.clone().unwrap_or_default()),
        ]
    }

    fn empty_page<T>(&self, base_path: &str, page: u32, limit: u32) -> ListResult<T> {
        let (page, limit) = (page.max(1), limit.max(1));
        let links = self.navigator.links(base_path, page, limit, 0, &[]);
        ListResult {
            items: Vec::new(),
            total: 0,
            page,
            limit,
            links,
        }
    }
}
