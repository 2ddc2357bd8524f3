use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::repos::{ArticleFilter, ArticlesRepo, RepoError};
use crate::domain::entities::ArticleRecord;
use crate::domain::types::ArticleSort;

use super::{PgRepositories, convert_count, map_sqlx_error};

// only published articles are ever served
const ARTICLE_SELECT: &str = "SELECT a.id, a.slug, a.title, a.excerpt, \
     c.slug AS category_slug, a.locale, a.published_at \
     FROM articles a LEFT JOIN categories c ON c.id = a.category_id \
     WHERE a.published_at <= now() ";

const ARTICLE_COUNT: &str = "SELECT COUNT(*) FROM articles a WHERE a.published_at <= now() ";

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    slug: String,
    title: String,
    excerpt: String,
    category_slug: Option<String>,
    locale: String,
    published_at: OffsetDateTime,
}

impl From<ArticleRow> for ArticleRecord {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            excerpt: row.excerpt,
            category_slug: row.category_slug,
            locale: row.locale,
            published_at: row.published_at,
        }
    }
}

fn apply_article_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q ArticleFilter) {
    if let Some(search) = filter.search.as_ref() {
        let pattern = format!("%{search}%");
        qb.push(" AND (a.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR a.excerpt ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if let Some(category_id) = filter.category_id {
        qb.push(" AND a.category_id = ");
        qb.push_bind(category_id);
    }

    if let Some(locale) = filter.locale.as_ref() {
        qb.push(" AND a.locale = ");
        qb.push_bind(locale);
    }
}

fn push_article_sort(qb: &mut QueryBuilder<'_, Postgres>, sort: ArticleSort) {
    match sort {
        ArticleSort::Newest => qb.push(" ORDER BY a.published_at DESC, a.id DESC "),
        ArticleSort::Title => qb.push(" ORDER BY a.title ASC, a.id DESC "),
    };
}

#[async_trait]
impl ArticlesRepo for PgRepositories {
    async fn list_articles(
        &self,
        filter: &ArticleFilter,
        sort: ArticleSort,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ArticleRecord>, RepoError> {
        let mut qb = QueryBuilder::new(ARTICLE_SELECT);
        apply_article_filter(&mut qb, filter);
        push_article_sort(&mut qb, sort);
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset as i64);

        let rows = qb
            .build_query_as::<ArticleRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ArticleRecord::from).collect())
    }

    async fn count_articles(&self, filter: &ArticleFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new(ARTICLE_COUNT);
        apply_article_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }

    async fn spotlight_articles(&self, limit: u32) -> Result<Vec<ArticleRecord>, RepoError> {
        let mut qb = QueryBuilder::new(ARTICLE_SELECT);
        qb.push(" ORDER BY a.published_at DESC, a.id DESC LIMIT ");
        qb.push_bind(i64::from(limit));

        let rows = qb
            .build_query_as::<ArticleRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ArticleRecord::from).collect())
    }
}
