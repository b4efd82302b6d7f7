use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use crate::{
    adapters::http::app_state::AppState,
    app_error::ApiError,
    application::use_cases::scopes::ScopeSet,
    domain::entities::api_log::ApiLogEntry,
    domain::entities::auth_context::AuthContext,
    infra::rate_limit::RateLimitDecision,
    infra::write_behind::WriteJob,
};

/// The gateway chain wrapped around every v1 route, terminal on first
/// failure: authenticate, check scopes, check quota, run the handler,
/// decorate the response, audit-log. Attach per route with
/// `middleware::from_fn_with_state` and the route's required scopes:
///
/// ```rust,ignore
/// .route_layer(middleware::from_fn_with_state(
///     state,
///     |s: State<AppState>, req: Request, next: Next| gateway(s, req, next, &["admin:read"]),
/// ))
/// ```
pub async fn gateway(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
    required_scopes: &'static [&'static str],
) -> Response {
    // Preflight never needs credentials; CORS headers come from the outer
    // CorsLayer.
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    let started = Instant::now();

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let Some(ctx) = state.auth.authenticate_request(auth_header).await else {
        // No authenticated company, so nothing to key an audit entry by.
        return ApiError::Unauthorized.into_response();
    };

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let ip_address = client_ip(&request, state.config.trust_proxy);
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let granted = ScopeSet::new(&ctx.scopes);
    let missing = granted.missing(required_scopes);
    if !missing.is_empty() {
        let response = ApiError::Forbidden {
            missing_scopes: missing,
        }
        .into_response();
        audit(&state, &ctx, &method, &path, &ip_address, user_agent, &response, started);
        return response;
    }

    let decision = state.rate_limiter.check(ctx.company_id, ctx.rate_limit).await;
    if !decision.allowed {
        let mut response = ApiError::RateLimited {
            limit: decision.limit,
            reset: reset_datetime(decision.reset_ms),
        }
        .into_response();
        apply_rate_limit_headers(&mut response, &decision);
        audit(&state, &ctx, &method, &path, &ip_address, user_agent, &response, started);
        return response;
    }

    request.extensions_mut().insert(ctx.clone());
    let mut response = next.run(request).await;

    apply_rate_limit_headers(&mut response, &decision);
    let elapsed_ms = started.elapsed().as_millis();
    if let Ok(value) = HeaderValue::from_str(&format!("{elapsed_ms}ms")) {
        response.headers_mut().insert("x-response-time", value);
    }

    audit(&state, &ctx, &method, &path, &ip_address, user_agent, &response, started);
    response
}

fn reset_datetime(reset_ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(reset_ms)
        .single()
        .unwrap_or_else(Utc::now)
}

fn apply_rate_limit_headers(response: &mut Response, decision: &RateLimitDecision) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert("x-ratelimit-limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", value);
    }
    let reset = reset_datetime(decision.reset_ms).to_rfc3339_opts(SecondsFormat::Millis, true);
    if let Ok(value) = HeaderValue::from_str(&reset) {
        headers.insert("x-ratelimit-reset", value);
    }
}

/// Queue one audit entry, regardless of where in the chain the request
/// terminated. Delivery is best-effort via the write-behind worker.
#[allow(clippy::too_many_arguments)]
fn audit(
    state: &AppState,
    ctx: &AuthContext,
    method: &str,
    path: &str,
    ip_address: &str,
    user_agent: Option<String>,
    response: &Response,
    started: Instant,
) {
    let status_code = response.status().as_u16();
    state.writer.submit(WriteJob::Audit(ApiLogEntry {
        company_id: ctx.company_id,
        method: method.to_string(),
        path: path.to_string(),
        status_code,
        response_time_ms: started.elapsed().as_millis() as u64,
        ip_address: ip_address.to_string(),
        user_agent,
        rate_limit_hit: status_code == StatusCode::TOO_MANY_REQUESTS.as_u16(),
        timestamp: Utc::now(),
    }));
}

fn client_ip(request: &Request, trust_proxy: bool) -> String {
    // Only trust forwarded headers if explicitly configured (when behind a reverse proxy)
    if trust_proxy && let Some(forwarded) = forwarded_ip(request) {
        return forwarded;
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(req: &Request) -> Option<String> {
    // Extract IP from X-Forwarded-For or X-Real-IP headers
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let trimmed = first.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    if let Some(real) = req.headers().get("x-real-ip")
        && let Ok(val) = real.to_str()
        && !val.trim().is_empty()
    {
        return Some(val.trim().to_string());
    }
    None
}
