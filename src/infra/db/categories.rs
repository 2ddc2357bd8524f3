use async_trait::async_trait;

use crate::application::repos::{CategoriesRepo, RepoError};

use super::{PgRepositories, map_sqlx_error};

#[async_trait]
impl CategoriesRepo for PgRepositories {
    async fn find_category_id(&self, slug: &str) -> Result<Option<i64>, RepoError> {
        sqlx::query_scalar("SELECT id FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}
