use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::repos::{MerchantFilter, MerchantsRepo, RepoError};
use crate::domain::entities::{ContentBlock, MerchantRecord};
use crate::domain::types::MerchantSort;

use super::{PgRepositories, convert_count, map_sqlx_error};

const MERCHANT_SELECT: &str = "SELECT m.id, m.slug, m.name, c.slug AS category_slug, \
     m.affiliate_url, m.website_url, m.offer_count, m.featured, m.locale, \
     m.h2_blocks, m.h3_blocks, m.created_at \
     FROM merchants m LEFT JOIN categories c ON c.id = m.category_id WHERE 1=1 ";

const MERCHANT_COUNT: &str = "SELECT COUNT(*) FROM merchants m WHERE 1=1 ";

#[derive(sqlx::FromRow)]
struct MerchantRow {
    id: i64,
    slug: String,
    name: String,
    category_slug: Option<String>,
    affiliate_url: Option<String>,
    website_url: Option<String>,
    offer_count: i64,
    featured: bool,
    locale: String,
    h2_blocks: Json<Vec<ContentBlock>>,
    h3_blocks: Json<Vec<ContentBlock>>,
    created_at: OffsetDateTime,
}

impl From<MerchantRow> for MerchantRecord {
    fn from(row: MerchantRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            category_slug: row.category_slug,
            affiliate_url: row.affiliate_url,
            website_url: row.website_url,
            offer_count: row.offer_count,
            featured: row.featured,
            locale: row.locale,
            h2_blocks: row.h2_blocks.0,
            h3_blocks: row.h3_blocks.0,
            created_at: row.created_at,
        }
    }
}

fn apply_merchant_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q MerchantFilter) {
    if let Some(search) = filter.search.as_ref() {
        let pattern = format!("%{search}%");
        qb.push(" AND (m.name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR m.slug ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if let Some(category_id) = filter.category_id {
        qb.push(" AND m.category_id = ");
        qb.push_bind(category_id);
    }

    if let Some(locale) = filter.locale.as_ref() {
        qb.push(" AND m.locale = ");
        qb.push_bind(locale);
    }
}

fn push_merchant_sort(qb: &mut QueryBuilder<'_, Postgres>, sort: MerchantSort) {
    match sort {
        MerchantSort::Newest => qb.push(" ORDER BY m.created_at DESC, m.id DESC "),
        MerchantSort::Name => qb.push(" ORDER BY m.name ASC, m.id DESC "),
        MerchantSort::Popular => qb.push(" ORDER BY m.offer_count DESC, m.id DESC "),
    };
}

#[async_trait]
impl MerchantsRepo for PgRepositories {
    async fn list_merchants(
        &self,
        filter: &MerchantFilter,
        sort: MerchantSort,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<MerchantRecord>, RepoError> {
        let mut qb = QueryBuilder::new(MERCHANT_SELECT);
        apply_merchant_filter(&mut qb, filter);
        push_merchant_sort(&mut qb, sort);
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset as i64);

        let rows = qb
            .build_query_as::<MerchantRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MerchantRecord::from).collect())
    }

    async fn count_merchants(&self, filter: &MerchantFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new(MERCHANT_COUNT);
        apply_merchant_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }

    async fn spotlight_merchants(&self, limit: u32) -> Result<Vec<MerchantRecord>, RepoError> {
        let mut qb = QueryBuilder::new(MERCHANT_SELECT);
        qb.push(" ORDER BY m.featured DESC, m.offer_count DESC, m.id DESC LIMIT ");
        qb.push_bind(i64::from(limit));

        let rows = qb
            .build_query_as::<MerchantRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MerchantRecord::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<MerchantRecord>, RepoError> {
        let mut qb = QueryBuilder::new(MERCHANT_SELECT);
        qb.push(" AND m.slug = ");
        qb.push_bind(slug);
        qb.push(" LIMIT 1");

        let row = qb
            .build_query_as::<MerchantRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(MerchantRecord::from))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<MerchantRecord>, RepoError> {
        let mut qb = QueryBuilder::new(MERCHANT_SELECT);
        qb.push(" AND m.id = ");
        qb.push_bind(id);
        qb.push(" LIMIT 1");

        let row = qb
            .build_query_as::<MerchantRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(MerchantRecord::from))
    }
}
