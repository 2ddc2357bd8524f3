//! Shared fixtures: an in-memory store and a fully wired router.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use time::macros::datetime;
use tower::ServiceExt;
use uuid::Uuid;

use dealstack::application::audit::ClickAudit;
use dealstack::application::clicks::ClickService;
use dealstack::application::listing::ListingService;
use dealstack::application::navigator::Navigator;
use dealstack::application::offers::OfferResolver;
use dealstack::application::pagination::OfferCursor;
use dealstack::application::repos::{
    ArticleFilter, ArticlesRepo, CategoriesRepo, ClickAuditRepo, MerchantFilter, MerchantsRepo,
    OfferFilter, OffersRepo, RepoError,
};
use dealstack::domain::entities::{
    ArticleRecord, ClickAuditRecord, ContentBlock, MerchantRecord, OfferRecord,
};
use dealstack::domain::offer_ref::CanonicalId;
use dealstack::domain::types::{ArticleSort, CouponKind, MerchantSort, OfferSort};
use dealstack::infra::http::api::rate_limit::ClickRateLimiter;
use dealstack::infra::http::api::{ApiState, build_api_router};

pub struct FakeStore {
    pub offers: Mutex<Vec<OfferRecord>>,
    pub merchants: Vec<MerchantRecord>,
    pub articles: Vec<ArticleRecord>,
    pub fail_lists: AtomicBool,
    pub audit: Mutex<Vec<ClickAuditRecord>>,
}

fn block(heading: &str, redirect: Option<&str>) -> ContentBlock {
    ContentBlock {
        heading: heading.to_string(),
        description: format!("{heading} details"),
        redirect_url: redirect.map(str::to_string),
    }
}

pub fn seeded_store() -> Arc<FakeStore> {
    let merchants = vec![
        MerchantRecord {
            id: 42,
            slug: "acme".to_string(),
            name: "Acme".to_string(),
            category_slug: Some("electronics".to_string()),
            affiliate_url: Some("https://aff.example/acme".to_string()),
            website_url: Some("https://acme.example".to_string()),
            offer_count: 25,
            featured: true,
            locale: "en".to_string(),
            h2_blocks: vec![
                block("Spring sale", Some("https://go.example/spring")),
                block("Clearance", None),
            ],
            h3_blocks: vec![
                block("Weekly deal", None),
                block("Student discount", None),
                block("Free returns", None),
            ],
            created_at: datetime!(2026-01-01 00:00 UTC),
        },
        MerchantRecord {
            id: 43,
            slug: "globex".to_string(),
            name: "Globex".to_string(),
            category_slug: None,
            affiliate_url: None,
            website_url: None,
            offer_count: 0,
            featured: false,
            locale: "en".to_string(),
            h2_blocks: Vec::new(),
            h3_blocks: Vec::new(),
            created_at: datetime!(2026-01-02 00:00 UTC),
        },
    ];

    let offers = (1..=25)
        .map(|id| OfferRecord {
            id,
            uuid: Uuid::new_v4(),
            kind: if id % 2 == 0 {
                CouponKind::Deal
            } else {
                CouponKind::Code
            },
            title: format!("offer {id}"),
            description: "save big".to_string(),
            code: (id % 2 == 1).then(|| format!("SAVE{id}")),
            ends_at: None,
            click_count: 0,
            featured: id % 5 == 0,
            locale: "en".to_string(),
            merchant_id: 42,
            merchant_slug: "acme".to_string(),
            created_at: datetime!(2026-01-03 00:00 UTC) + time::Duration::hours(id),
        })
        .collect();

    let articles = (1..=3)
        .map(|id| ArticleRecord {
            id,
            slug: format!("post-{id}"),
            title: format!("post {id}"),
            excerpt: "words".to_string(),
            category_slug: None,
            locale: "en".to_string(),
            published_at: datetime!(2026-02-01 00:00 UTC) + time::Duration::days(id),
        })
        .collect();

    Arc::new(FakeStore {
        offers: Mutex::new(offers),
        merchants,
        articles,
        fail_lists: AtomicBool::new(false),
        audit: Mutex::new(Vec::new()),
    })
}

impl FakeStore {
    fn check_fail(&self) -> Result<(), RepoError> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("store unavailable".into()));
        }
        Ok(())
    }

    fn offers_desc(&self, filter: &OfferFilter) -> Vec<OfferRecord> {
        let mut rows: Vec<OfferRecord> = self
            .offers
            .lock()
            .expect("lock")
            .iter()
            .filter(|row| {
                filter
                    .merchant_id
                    .map(|merchant| row.merchant_id == merchant)
                    .unwrap_or(true)
            })
            .filter(|row| {
                filter
                    .search
                    .as_ref()
                    .map(|q| row.title.contains(q.as_str()))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows
    }
}

#[async_trait]
impl OffersRepo for FakeStore {
    async fn list_offers(
        &self,
        filter: &OfferFilter,
        _: OfferSort,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<OfferRecord>, RepoError> {
        self.check_fail()?;
        Ok(self
            .offers_desc(filter)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_offers(&self, filter: &OfferFilter) -> Result<u64, RepoError> {
        self.check_fail()?;
        Ok(self.offers_desc(filter).len() as u64)
    }

    async fn list_offers_after(
        &self,
        filter: &OfferFilter,
        cursor: Option<OfferCursor>,
        limit: u32,
    ) -> Result<Vec<OfferRecord>, RepoError> {
        self.check_fail()?;
        let boundary = cursor.map(|c| c.id()).unwrap_or(i64::MAX);
        Ok(self
            .offers_desc(filter)
            .into_iter()
            .filter(|row| row.id < boundary)
            .take(limit as usize)
            .collect())
    }

    async fn spotlight_offers(&self, limit: u32) -> Result<Vec<OfferRecord>, RepoError> {
        self.check_fail()?;
        Ok(self
            .offers_desc(&OfferFilter::default())
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn find_canonical(&self, id: CanonicalId) -> Result<Option<OfferRecord>, RepoError> {
        let rows = self.offers.lock().expect("lock");
        Ok(match id {
            CanonicalId::Numeric(id) => rows.iter().find(|row| row.id == id).cloned(),
            CanonicalId::Uuid(uuid) => rows.iter().find(|row| row.uuid == uuid).cloned(),
        })
    }

    async fn increment_clicks(&self, id: i64) -> Result<i64, RepoError> {
        let mut rows = self.offers.lock().expect("lock");
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepoError::NotFound)?;
        row.click_count += 1;
        Ok(row.click_count)
    }
}

#[async_trait]
impl MerchantsRepo for FakeStore {
    async fn list_merchants(
        &self,
        _: &MerchantFilter,
        _: MerchantSort,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<MerchantRecord>, RepoError> {
        self.check_fail()?;
        Ok(self
            .merchants
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_merchants(&self, _: &MerchantFilter) -> Result<u64, RepoError> {
        self.check_fail()?;
        Ok(self.merchants.len() as u64)
    }

    async fn spotlight_merchants(&self, limit: u32) -> Result<Vec<MerchantRecord>, RepoError> {
        self.check_fail()?;
        Ok(self.merchants.iter().take(limit as usize).cloned().collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<MerchantRecord>, RepoError> {
        Ok(self.merchants.iter().find(|m| m.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<MerchantRecord>, RepoError> {
        Ok(self.merchants.iter().find(|m| m.id == id).cloned())
    }
}

#[async_trait]
impl ArticlesRepo for FakeStore {
    async fn list_articles(
        &self,
        _: &ArticleFilter,
        _: ArticleSort,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ArticleRecord>, RepoError> {
        self.check_fail()?;
        Ok(self
            .articles
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_articles(&self, _: &ArticleFilter) -> Result<u64, RepoError> {
        self.check_fail()?;
        Ok(self.articles.len() as u64)
    }

    async fn spotlight_articles(&self, limit: u32) -> Result<Vec<ArticleRecord>, RepoError> {
        self.check_fail()?;
        Ok(self.articles.iter().take(limit as usize).cloned().collect())
    }
}

#[async_trait]
impl CategoriesRepo for FakeStore {
    async fn find_category_id(&self, slug: &str) -> Result<Option<i64>, RepoError> {
        Ok((slug == "electronics").then_some(1))
    }
}

#[async_trait]
impl ClickAuditRepo for FakeStore {
    async fn append_click(&self, record: ClickAuditRecord) -> Result<(), RepoError> {
        self.audit.lock().expect("lock").push(record);
        Ok(())
    }
}

pub fn test_router(store: Arc<FakeStore>) -> Router {
    let navigator = Navigator::new(20, None, None);
    let listing = Arc::new(ListingService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        navigator,
        Duration::from_secs(60),
        8,
    ));

    let (audit, _worker) = ClickAudit::spawn(store.clone(), 64);
    let resolver = OfferResolver::new(store.clone(), store.clone());
    let clicks = Arc::new(ClickService::new(
        resolver,
        store.clone(),
        store.clone(),
        audit,
    ));

    let rate_limiter = Arc::new(ClickRateLimiter::new(
        Duration::from_secs(60),
        12,
        NonZeroUsize::new(64).expect("capacity"),
    ));

    build_api_router(ApiState {
        listing,
        clicks,
        rate_limiter,
    })
}

fn with_peer(mut request: Request<Body>) -> Request<Body> {
    let peer: SocketAddr = "203.0.113.9:55000".parse().expect("socket addr");
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = with_peer(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request"),
    );
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn post_click(router: &Router, offer_ref: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/api/offers/{offer_ref}/click"));
    let request_body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let request = with_peer(builder.body(request_body).expect("request"));
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
