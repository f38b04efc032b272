use std::sync::Arc;

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::middleware::EndpointRateLimiter;
use crate::rules::BookmarkRules;
use crate::store::EntityStore;

/// The shared application state.
///
/// Holds everything HTTP handlers, middleware and background tasks need. It is cheap to
/// clone and is handed to Axum via `with_state`.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool, used directly only by health checks.
    pub db: sqlx::SqlitePool,
    /// The entity store with the bookmark lifecycle rules wired in.
    pub store: EntityStore,
    /// The application configuration.
    pub config: Arc<AppConfig>,
    /// Activity counters.
    pub metrics: Metrics,
    /// The per-endpoint rate limiter.
    pub rate_limiter: EndpointRateLimiter,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// The store receives [`BookmarkRules`] built from the provisioning section of `config`.
    /// Default endpoint limits:
    ///   - 30 user registrations per minute
    ///   - 300 entry creations per minute
    ///   - 60 uploads per minute
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> Self {
        let rate_limiter = EndpointRateLimiter::new().with_limits(vec![
            ("/users", 30, 60),
            ("/entries", 300, 60),
            ("/uploads", 60, 60),
        ]);
        let rules = Arc::new(BookmarkRules::new(config.provisioning.clone()));

        Self {
            store: EntityStore::new(db.clone(), rules),
            db,
            config: Arc::new(config),
            metrics: Metrics::new(),
            rate_limiter,
        }
    }
}
