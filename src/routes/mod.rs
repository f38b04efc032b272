//! HTTP handlers for the bookmark API.
//!
//! - `health`: liveness, readiness, metrics and version
//! - `users`: accounts, their setting and avatar uploads
//! - `favorites`: bookmark folders, purge and recount
//! - `entries`: bookmarks, visits and thumbnail uploads
//! - `tags`: tags and entry/tag relations
//! - `settings`: per-user display settings

pub mod entries;
pub mod favorites;
pub mod health;
pub mod settings;
pub mod tags;
pub mod users;

use axum::{
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::{
    middleware::ip::{extract_ip_from_headers, MaybeRemoteAddr},
    state::AppState,
};

/// Applies the named per-endpoint limit; `Some` carries the 429 response to return.
pub(crate) async fn endpoint_limit(
    state: &AppState,
    endpoint: &str,
    headers: &HeaderMap,
    remote: MaybeRemoteAddr,
) -> Option<Response> {
    let ip = extract_ip_from_headers(headers, remote.ip());
    state.rate_limiter.check_endpoint_limit(endpoint, ip).await.err().map(IntoResponse::into_response)
}
