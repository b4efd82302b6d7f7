pub mod api_key;
pub mod api_log;
pub mod oauth_token;

use sqlx::PgPool;

pub struct PostgresPersistence {
    pub pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
