use async_trait::async_trait;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{ApiError, ApiResult},
    application::use_cases::audit::ApiLogRepo,
    domain::entities::api_log::ApiLogEntry,
};

#[async_trait]
impl ApiLogRepo for PostgresPersistence {
    async fn insert(&self, entry: &ApiLogEntry) -> ApiResult<()> {
        sqlx::query(
            r#"
            INSERT INTO api_logs (company_id, method, path, status_code, response_time_ms,
                                  ip_address, user_agent, rate_limit_hit, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.company_id)
        .bind(&entry.method)
        .bind(&entry.path)
        .bind(entry.status_code as i32)
        .bind(entry.response_time_ms as i64)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.rate_limit_hit)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(ApiError::from)?;

        Ok(())
    }
}
