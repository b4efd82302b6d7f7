use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{ApiError, ApiResult},
    application::use_cases::auth::ApiKeyRepo,
    domain::entities::api_key::{ApiKeyRecord, ApiKeyStatus},
};

fn row_to_record(row: sqlx::postgres::PgRow) -> ApiKeyRecord {
    let status: String = row.get("status");
    ApiKeyRecord {
        id: row.get("id"),
        company_id: row.get("company_id"),
        key_prefix: row.get("key_prefix"),
        key_hash: row.get("key_hash"),
        name: row.get("name"),
        scopes: row.get("scopes"),
        rate_limit: row.get("rate_limit"),
        // Unknown status values are treated as revoked.
        status: status.parse().unwrap_or(ApiKeyStatus::Revoked),
        expires_at: row.get("expires_at"),
        last_used_at: row.get("last_used_at"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        company_active: row.get("company_active"),
    }
}

#[async_trait]
impl ApiKeyRepo for PostgresPersistence {
    async fn create(
        &self,
        company_id: Uuid,
        key_prefix: &str,
        key_hash: &str,
        name: &str,
        scopes: &[String],
        rate_limit: Option<i64>,
        expires_at: Option<DateTime<Utc>>,
        created_by: Option<Uuid>,
    ) -> ApiResult<ApiKeyRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO api_keys (company_id, key_prefix, key_hash, name, scopes, rate_limit, status, expires_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, 'active', $7, $8)
            RETURNING id, company_id, key_prefix, key_hash, name, scopes, rate_limit, status,
                      expires_at, last_used_at, created_by, created_at,
                      TRUE AS company_active
            "#,
        )
        .bind(company_id)
        .bind(key_prefix)
        .bind(key_hash)
        .bind(name)
        .bind(scopes)
        .bind(rate_limit)
        .bind(expires_at)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::from)?;

        Ok(row_to_record(row))
    }

    async fn get_by_hash(&self, key_hash: &str) -> ApiResult<Option<ApiKeyRecord>> {
        let row = sqlx::query(
            r#"
            SELECT k.id, k.company_id, k.key_prefix, k.key_hash, k.name, k.scopes, k.rate_limit,
                   k.status, k.expires_at, k.last_used_at, k.created_by, k.created_at,
                   c.active AS company_active
            FROM api_keys k
            JOIN companies c ON c.id = k.company_id
            WHERE k.key_hash = $1
            "#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::from)?;

        Ok(row.map(row_to_record))
    }

    async fn list_by_company(
        &self,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ApiResult<Vec<ApiKeyRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT k.id, k.company_id, k.key_prefix, k.key_hash, k.name, k.scopes, k.rate_limit,
                   k.status, k.expires_at, k.last_used_at, k.created_by, k.created_at,
                   c.active AS company_active
            FROM api_keys k
            JOIN companies c ON c.id = k.company_id
            WHERE k.company_id = $1
            ORDER BY k.created_at DESC, k.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::from)?;

        Ok(rows.into_iter().map(row_to_record).collect())
    }

    async fn count_by_company(&self, company_id: Uuid) -> ApiResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM api_keys WHERE company_id = $1")
            .bind(company_id)
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::from)?;

        Ok(row.get("count"))
    }

    async fn revoke(&self, company_id: Uuid, key_id: Uuid) -> ApiResult<()> {
        let result = sqlx::query(
            "UPDATE api_keys SET status = 'revoked' WHERE id = $1 AND company_id = $2 AND status = 'active'",
        )
        .bind(key_id)
        .bind(company_id)
        .execute(&self.pool)
        .await
        .map_err(ApiError::from)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn update_last_used(&self, key_id: Uuid) -> ApiResult<()> {
        sqlx::query("UPDATE api_keys SET last_used_at = CURRENT_TIMESTAMP WHERE id = $1")
            .bind(key_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::from)?;

        Ok(())
    }
}
