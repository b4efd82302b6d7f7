use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{ApiError, ApiResult},
    application::use_cases::auth::OAuthTokenRepo,
    domain::entities::oauth_token::OAuthAccessTokenRecord,
};

fn row_to_record(row: sqlx::postgres::PgRow) -> OAuthAccessTokenRecord {
    OAuthAccessTokenRecord {
        id: row.get("id"),
        token: row.get("token"),
        company_id: row.get("company_id"),
        user_id: row.get("user_id"),
        scopes: row.get("scopes"),
        expires_at: row.get("expires_at"),
        revoked: row.get("revoked"),
        app_rate_limit: row.get("app_rate_limit"),
        last_used_at: row.get("last_used_at"),
        company_active: row.get("company_active"),
    }
}

#[async_trait]
impl OAuthTokenRepo for PostgresPersistence {
    async fn get_by_token(&self, token: &str) -> ApiResult<Option<OAuthAccessTokenRecord>> {
        let row = sqlx::query(
            r#"
            SELECT t.id, t.token, t.company_id, t.user_id, t.scopes, t.expires_at, t.revoked,
                   a.rate_limit AS app_rate_limit, t.last_used_at,
                   c.active AS company_active
            FROM oauth_access_tokens t
            JOIN oauth_apps a ON a.id = t.app_id
            JOIN companies c ON c.id = t.company_id
            WHERE t.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::from)?;

        Ok(row.map(row_to_record))
    }

    async fn update_last_used(&self, token_id: Uuid) -> ApiResult<()> {
        sqlx::query("UPDATE oauth_access_tokens SET last_used_at = CURRENT_TIMESTAMP WHERE id = $1")
            .bind(token_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::from)?;

        Ok(())
    }
}
