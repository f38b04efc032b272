//! Integration and unit tests for the Bookmarker backend.
//!
//! - **db_tests**: schema, foreign keys and count reconciliation
//! - **rules_tests**: user provisioning and entry counting through the entity store
//! - **store_tests**: tags, settings, uploads and paging
//! - **api_tests**: the HTTP API end to end through the router
//! - **health_api_tests**: liveness, readiness, metrics and version
//! - **config_tests**: configuration loading and validation
//! - **error_tests**: error mapping and field validation
//!
//! Every test gets its own in-memory database. The pool is capped at one connection so
//! all of them see the same database.

pub mod config_tests;
pub mod error_tests;
pub mod store_tests;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::rules::{BookmarkRules, LifecycleRules};
use crate::state::AppState;
use crate::store::EntityStore;

pub(crate) async fn test_pool() -> SqlitePool {
    let pool = crate::db::connect("sqlite::memory:", 1).await.unwrap();
    crate::db::init_db(&pool).await.unwrap();
    pool
}

pub(crate) async fn test_store() -> EntityStore {
    store_with_rules(Arc::new(BookmarkRules::default())).await
}

pub(crate) async fn store_with_rules(rules: Arc<dyn LifecycleRules>) -> EntityStore {
    EntityStore::new(test_pool().await, rules)
}

pub(crate) async fn test_state() -> AppState {
    AppState::new(test_pool().await, AppConfig::default())
}

pub(crate) async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table)).fetch_one(pool).await.unwrap()
}
