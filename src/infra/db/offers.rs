use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::OfferCursor;
use crate::application::repos::{OfferFilter, OffersRepo, RepoError};
use crate::domain::entities::OfferRecord;
use crate::domain::offer_ref::CanonicalId;
use crate::domain::types::{CouponKind, OfferSort, OfferStatusFilter};

use super::{PgRepositories, convert_count, map_sqlx_error};

const OFFER_SELECT: &str = "SELECT o.id, o.uuid, o.kind, o.title, o.description, o.code, \
     o.ends_at, o.click_count, o.featured, o.locale, o.merchant_id, \
     m.slug AS merchant_slug, o.created_at \
     FROM offers o INNER JOIN merchants m ON m.id = o.merchant_id WHERE 1=1 ";

const OFFER_COUNT: &str =
    "SELECT COUNT(*) FROM offers o INNER JOIN merchants m ON m.id = o.merchant_id WHERE 1=1 ";

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: i64,
    uuid: Uuid,
    kind: CouponKind,
    title: String,
    description: String,
    code: Option<String>,
    ends_at: Option<OffsetDateTime>,
    click_count: i64,
    featured: bool,
    locale: String,
    merchant_id: i64,
    merchant_slug: String,
    created_at: OffsetDateTime,
}

impl From<OfferRow> for OfferRecord {
    fn from(row: OfferRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            kind: row.kind,
            title: row.title,
            description: row.description,
            code: row.code,
            ends_at: row.ends_at,
            click_count: row.click_count,
            featured: row.featured,
            locale: row.locale,
            merchant_id: row.merchant_id,
            merchant_slug: row.merchant_slug,
            created_at: row.created_at,
        }
    }
}

fn apply_offer_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q OfferFilter) {
    if let Some(search) = filter.search.as_ref() {
        let pattern = format!("%{search}%");
        qb.push(" AND (o.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR o.description ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if let Some(category_id) = filter.category_id {
        qb.push(" AND m.category_id = ");
        qb.push_bind(category_id);
    }

    if let Some(merchant_id) = filter.merchant_id {
        qb.push(" AND o.merchant_id = ");
        qb.push_bind(merchant_id);
    }

    if let Some(kind) = filter.kind {
        qb.push(" AND o.kind = ");
        qb.push_bind(kind);
    }

    match filter.status {
        Some(OfferStatusFilter::Active) => {
            qb.push(" AND (o.ends_at IS NULL OR o.ends_at > now())");
        }
        Some(OfferStatusFilter::Expired) => {
            qb.push(" AND o.ends_at IS NOT NULL AND o.ends_at <= now()");
        }
        None => {}
    }

    if let Some(locale) = filter.locale.as_ref() {
        qb.push(" AND o.locale = ");
        qb.push_bind(locale);
    }
}

fn push_offer_sort(qb: &mut QueryBuilder<'_, Postgres>, sort: OfferSort) {
    match sort {
        OfferSort::Newest => qb.push(" ORDER BY o.created_at DESC, o.id DESC "),
        OfferSort::EndingSoon => qb.push(" ORDER BY o.ends_at ASC NULLS LAST, o.id DESC "),
        OfferSort::Popular => qb.push(" ORDER BY o.click_count DESC, o.id DESC "),
        OfferSort::Featured => qb.push(" ORDER BY o.featured DESC, o.created_at DESC, o.id DESC "),
    };
}

#[async_trait]
impl OffersRepo for PgRepositories {
    async fn list_offers(
        &self,
        filter: &OfferFilter,
        sort: OfferSort,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<OfferRecord>, RepoError> {
        let mut qb = QueryBuilder::new(OFFER_SELECT);
        apply_offer_filter(&mut qb, filter);
        push_offer_sort(&mut qb, sort);
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset as i64);

        let rows = qb
            .build_query_as::<OfferRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(OfferRecord::from).collect())
    }

    async fn count_offers(&self, filter: &OfferFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new(OFFER_COUNT);
        apply_offer_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }

    async fn list_offers_after(
        &self,
        filter: &OfferFilter,
        cursor: Option<OfferCursor>,
        limit: u32,
    ) -> Result<Vec<OfferRecord>, RepoError> {
        let mut qb = QueryBuilder::new(OFFER_SELECT);
        apply_offer_filter(&mut qb, filter);

        if let Some(cursor) = cursor {
            qb.push(" AND o.id < ");
            qb.push_bind(cursor.id());
        }

        // keyset order is fixed to the primary key; exactly `limit` rows are
        // fetched, so a full page is the only "more remains" signal
        qb.push(" ORDER BY o.id DESC LIMIT ");
        qb.push_bind(i64::from(limit));

        let rows = qb
            .build_query_as::<OfferRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(OfferRecord::from).collect())
    }

    async fn spotlight_offers(&self, limit: u32) -> Result<Vec<OfferRecord>, RepoError> {
        let mut qb = QueryBuilder::new(OFFER_SELECT);
        qb.push(" AND (o.ends_at IS NULL OR o.ends_at > now())");
        qb.push(" ORDER BY o.featured DESC, o.created_at DESC, o.id DESC LIMIT ");
        qb.push_bind(i64::from(limit));

        let rows = qb
            .build_query_as::<OfferRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(OfferRecord::from).collect())
    }

    async fn find_canonical(&self, id: CanonicalId) -> Result<Option<OfferRecord>, RepoError> {
        let mut qb = QueryBuilder::new(OFFER_SELECT);
        match id {
            CanonicalId::Numeric(id) => {
                qb.push(" AND o.id = ");
                qb.push_bind(id);
            }
            CanonicalId::Uuid(uuid) => {
                qb.push(" AND o.uuid = ");
                qb.push_bind(uuid);
            }
        }
        qb.push(" LIMIT 1");

        let row = qb
            .build_query_as::<OfferRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(OfferRecord::from))
    }

    async fn increment_clicks(&self, id: i64) -> Result<i64, RepoError> {
        let mut qb =
            QueryBuilder::new("UPDATE offers SET click_count = click_count + 1 WHERE id = ");
        qb.push_bind(id);
        qb.push(" RETURNING click_count");

        qb.build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}
