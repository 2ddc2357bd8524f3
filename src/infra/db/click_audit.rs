use async_trait::async_trait;

use crate::application::repos::{ClickAuditRepo, RepoError};
use crate::domain::entities::ClickAuditRecord;
use crate::domain::types::BlockKind;

use super::{PgRepositories, map_sqlx_error};

#[async_trait]
impl ClickAuditRepo for PgRepositories {
    async fn append_click(&self, record: ClickAuditRecord) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO click_audit \
             (id, offer_ref, merchant_id, client_ip, user_agent, referrer, platform, \
              store_slug, source, block_kind, block_index, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(record.id)
        .bind(&record.offer_ref)
        .bind(record.merchant_id)
        .bind(&record.client_ip)
        .bind(&record.user_agent)
        .bind(&record.referrer)
        .bind(&record.platform)
        .bind(&record.store_slug)
        .bind(record.source)
        .bind(record.block_kind.map(BlockKind::as_str))
        .bind(record.block_index)
        .bind(record.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
