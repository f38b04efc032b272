//! # Bookmarker Backend Library
//!
//! Core of Bookmarker, a multi-user bookmark manager. Users own favorites (bookmark folders),
//! favorites hold entries (bookmarks), entries carry tags, and every user has one display
//! setting. Everything is served as a JSON REST API over SQLite.
//!
//! ## Core Components
//!
//! - [`config`]: layered configuration (embedded defaults, config file, environment)
//! - [`db`]: pool setup, schema and count reconciliation
//! - [`error`]: `AppError`, JSON error responses and field validation
//! - [`naming`]: storage path construction for uploaded avatars and thumbnails
//! - [`rules`]: lifecycle rules fired by the store (user provisioning, entry counting)
//! - [`store`]: transactional persistence for all entities
//! - [`routes`]: HTTP handlers
//! - [`middleware`]: security headers, rate limiting, request validation
//! - [`metrics`], [`state`], [`types`]
//!
//! ## Invariants kept by the store
//!
//! - A new user always gets a default favorite holding one seed entry, a setting, and
//!   `default_favor` pointing at that favorite. All of it commits or none of it does.
//! - `favorites.entries_num` moves by exactly one per entry created or deleted, and by the
//!   affected row count on bulk removal.
//! - A new entry copies `created_by` and `is_public` from its favorite at creation time.

pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod naming;
pub mod routes;
pub mod rules;
pub mod state;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use state::AppState;

/// Builds the full API router with its middleware stack. CORS is left to the binary.
pub fn build_router(state: AppState) -> Router {
    let cfg = state.config.clone();

    Router::new()
        .route("/healthz", get(routes::health::healthz))
        .route("/readyz", get(routes::health::readyz))
        .route("/metrics", get(routes::health::metrics))
        .route("/metrics/prometheus", get(routes::health::metrics_prometheus))
        .route("/version", get(routes::health::version))
        .route("/users", post(routes::users::create_user).get(routes::users::list_users))
        .route(
            "/users/{id}",
            get(routes::users::get_user).patch(routes::users::update_user).delete(routes::users::delete_user),
        )
        .route("/users/{id}/setting", get(routes::users::get_user_setting))
        .route("/users/{id}/avatar", post(routes::users::upload_avatar))
        .route("/favorites", post(routes::favorites::create_favorite).get(routes::favorites::list_favorites))
        .route(
            "/favorites/{id}",
            get(routes::favorites::get_favorite)
                .patch(routes::favorites::update_favorite)
                .delete(routes::favorites::delete_favorite),
        )
        .route("/favorites/{id}/entries", delete(routes::favorites::purge_entries))
        .route("/favorites/{id}/recount", post(routes::favorites::recount_entries))
        .route("/entries", post(routes::entries::create_entry).get(routes::entries::list_entries))
        .route(
            "/entries/{id}",
            get(routes::entries::get_entry).patch(routes::entries::update_entry).delete(routes::entries::delete_entry),
        )
        .route("/entries/{id}/visit", post(routes::entries::record_visit))
        .route("/entries/{id}/thumbnail", post(routes::entries::upload_thumbnail))
        .route("/tags", post(routes::tags::create_tag).get(routes::tags::list_tags))
        .route(
            "/tags/{id}",
            get(routes::tags::get_tag).patch(routes::tags::rename_tag).delete(routes::tags::delete_tag),
        )
        .route("/tagrelations", post(routes::tags::create_relation).get(routes::tags::list_relations))
        .route("/tagrelations/{entry_id}/{tag_id}", delete(routes::tags::delete_relation))
        .route("/settings", get(routes::settings::list_settings))
        .route("/settings/{id}", get(routes::settings::get_setting).patch(routes::settings::update_setting))
        .with_state(state)
        .layer(DefaultBodyLimit::max(middleware::validation::max_body_size()))
        .layer(from_fn(middleware::validation::validate_request_middleware))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(cfg, middleware::security_headers::security_headers_middleware))
}
