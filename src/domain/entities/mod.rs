pub mod api_key;
pub mod api_log;
pub mod auth_context;
pub mod oauth_token;
