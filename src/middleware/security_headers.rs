use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::config::AppConfig;

/// Adds security headers to every response and marks JSON bodies as non-cacheable.
///
/// HSTS and CSP are only emitted when the `security` config section asks for them.
pub async fn security_headers_middleware(
    State(cfg): State<Arc<AppConfig>>,
    req: Request,
    next: Next,
) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();

    for (name, value) in [
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("referrer-policy", "no-referrer"),
        ("permissions-policy", "geolocation=(), microphone=(), camera=()"),
        ("cross-origin-opener-policy", "same-origin"),
        ("cross-origin-resource-policy", "same-origin"),
    ] {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    if let Some(sec) = cfg.security.as_ref() {
        if sec.enable_hsts.unwrap_or(false) {
            let max_age = sec.hsts_max_age.unwrap_or(31_536_000);
            let include_sub = if sec.hsts_include_subdomains.unwrap_or(false) { "; includeSubDomains" } else { "" };
            if let Ok(value) = HeaderValue::from_str(&format!("max-age={}{}", max_age, include_sub)) {
                headers.insert(HeaderName::from_static("strict-transport-security"), value);
            }
        }
        if let Some(csp) = sec.csp.as_deref().map(str::trim).filter(|csp| !csp.is_empty()) {
            match HeaderValue::from_str(csp) {
                Ok(value) => {
                    headers.insert(HeaderName::from_static("content-security-policy"), value);
                }
                Err(e) => tracing::warn!("Ignoring invalid CSP value: {}", e),
            }
        }
    }

    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);
    if is_json {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    }

    res
}
