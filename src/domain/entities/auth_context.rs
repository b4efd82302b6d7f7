use strum::Display;
use uuid::Uuid;

/// Which credential scheme authenticated the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuthMethod {
    ApiKey,
    OauthToken,
}

/// Identity resolved from a bearer credential.
///
/// Built per request and inserted into request extensions; never persisted.
/// An invalid credential never produces one of these (callers get `None`),
/// so a populated context always refers to an active company.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub company_id: Uuid,
    /// Set for OAuth tokens (the end user the token was issued to).
    /// API keys identify the company, not a user.
    pub user_id: Option<Uuid>,
    /// Id of the credential record, used for last-used bookkeeping.
    pub credential_id: Uuid,
    pub scopes: Vec<String>,
    pub auth_method: AuthMethod,
    /// Per-credential request quota overriding the global default.
    pub rate_limit: Option<u64>,
}
