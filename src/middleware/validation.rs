use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Default request body cap; overridable with `BOOKMARKER_MAX_BODY_SIZE`.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Validates incoming requests for common abuse patterns before they reach a handler.
///
/// This middleware checks for:
/// - Path traversal attempts in the request URI.
/// - Suspicious user agents (logged, not rejected).
/// - Excessive content length on POST/PUT/PATCH.
pub async fn validate_request_middleware(req: Request, next: Next) -> Response {
    let uri_path = req.uri().path();
    if contains_path_traversal(uri_path) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "code": "INVALID_PATH",
                    "message": "Path traversal detected in request",
                },
                "status": 400,
            })),
        )
            .into_response();
    }

    if let Some(user_agent) = req.headers().get("user-agent") {
        if let Ok(ua_str) = user_agent.to_str() {
            if is_suspicious_user_agent(ua_str) {
                tracing::warn!("Suspicious user agent detected: {}", sanitize_for_logging(ua_str));
            }
        }
    }

    // Early rejection; DefaultBodyLimit enforces the same cap on the body itself
    if matches!(req.method(), &axum::http::Method::POST | &axum::http::Method::PUT | &axum::http::Method::PATCH) {
        if let Some(length) = req
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<usize>().ok())
        {
            let max_body_size = max_body_size();
            if length > max_body_size {
                return (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    Json(json!({
                        "error": {
                            "code": "PAYLOAD_TOO_LARGE",
                            "message": format!("Request body exceeds maximum size of {} bytes", max_body_size),
                        },
                        "status": 413,
                    })),
                )
                    .into_response();
            }
        }
    }

    next.run(req).await
}

pub fn max_body_size() -> usize {
    std::env::var("BOOKMARKER_MAX_BODY_SIZE")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_BODY_SIZE)
        .clamp(64 * 1024, 16 * 1024 * 1024)
}

fn contains_path_traversal(path: &str) -> bool {
    let lower = path.to_lowercase();

    if path.contains("/..") || path.contains("\\..") || path.starts_with("..") {
        return true;
    }
    if path.contains("/./") || path.contains("\\.\\") {
        return true;
    }
    // Multiple dots (bypass attempt: ....)
    if path.contains("....") {
        return true;
    }

    // URL-encoded variants (single and double encoding)
    let encoded_patterns = ["%2e%2e", "%252e%252e", "%2e/", "%252e%2f", "/%2e", "%2f%2e", "%2e%5c", "%5c%2e", "%00"];
    if encoded_patterns.iter().any(|p| lower.contains(p)) {
        return true;
    }

    path.contains('\0')
}

/// Check for suspicious user agents (simple heuristic)
fn is_suspicious_user_agent(ua: &str) -> bool {
    let ua_lower = ua.to_lowercase();
    ua_lower.contains("scanner")
        || (ua_lower.contains("crawler") && !ua_lower.contains("googlebot") && !ua_lower.contains("bingbot"))
        || ua_lower.contains("nikto")
        || ua_lower.contains("sqlmap")
        || ua_lower.contains("havij")
        || ua_lower.contains("acunetix")
}

/// Strips control characters, escapes quotes and caps the length of client supplied text
/// before it is written to the log.
pub fn sanitize_for_logging(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .take(200)
        .collect::<String>()
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\'', "\\\'")
}
