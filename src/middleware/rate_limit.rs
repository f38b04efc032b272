use super::ip::extract_ip_from_headers;
use axum::{
    extract::{connect_info::ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::{Arc, Once},
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

pub type RateLimitRejection = (StatusCode, Json<serde_json::Value>);

/// Sliding-window request limiter keyed by client IP.
#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<RwLock<HashMap<IpAddr, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_seconds: u64) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_seconds),
        }
    }

    fn in_window(&self, now: Instant, t: Instant) -> bool {
        // A timestamp from the future (clock skew) counts as recent
        now.checked_duration_since(t).map(|d| d < self.window).unwrap_or(true)
    }

    /// Records the request and returns `Ok`, or a ready-made 429 body when `ip` is over
    /// its budget for the current window.
    pub async fn check_rate_limit(&self, ip: IpAddr) -> Result<(), RateLimitRejection> {
        let now = Instant::now();
        let mut requests = self.requests.write().await;
        let timestamps = requests.entry(ip).or_default();
        timestamps.retain(|&t| self.in_window(now, t));

        if timestamps.len() >= self.max_requests {
            let retry_after = timestamps
                .first()
                .and_then(|&oldest| now.checked_duration_since(oldest))
                .map(|elapsed| self.window.saturating_sub(elapsed))
                .unwrap_or(Duration::from_secs(1));
            let secs = retry_after.as_secs().max(1);
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": {
                        "code": "RATE_LIMITED",
                        "message": format!("Too many requests. Please retry after {} seconds", secs),
                    },
                    "retry_after_seconds": secs,
                    "status": 429,
                })),
            ));
        }

        timestamps.push(now);
        Ok(())
    }

    /// Drops expired timestamps and forgets IPs without recent requests.
    pub async fn cleanup_old_entries(&self) {
        let now = Instant::now();
        let mut requests = self.requests.write().await;
        requests.retain(|_, timestamps| {
            timestamps.retain(|&t| self.in_window(now, t));
            !timestamps.is_empty()
        });
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

lazy_static::lazy_static! {
    // 1000 requests per 60s unless BOOKMARKER_RATE_LIMIT_MAX_REQUESTS /
    // BOOKMARKER_RATE_LIMIT_WINDOW_SECONDS say otherwise
    static ref GLOBAL_RATE_LIMITER: RateLimiter = RateLimiter::new(
        env_or("BOOKMARKER_RATE_LIMIT_MAX_REQUESTS", 1000usize),
        env_or("BOOKMARKER_RATE_LIMIT_WINDOW_SECONDS", 60u64),
    );
}

static GLOBAL_CLEANUP: Once = Once::new();

/// Global per-IP limit applied to every route.
pub async fn rate_limit_middleware(req: Request, next: Next) -> Response {
    let remote_ip = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|info| info.0.ip());
    let ip = extract_ip_from_headers(req.headers(), remote_ip);

    GLOBAL_CLEANUP.call_once(|| {
        let limiter = GLOBAL_RATE_LIMITER.clone();
        let every = env_or("BOOKMARKER_GLOBAL_RATE_LIMIT_CLEANUP_INTERVAL", 600u64).clamp(60, 3600);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(every));
            loop {
                interval.tick().await;
                limiter.cleanup_old_entries().await;
            }
        });
    });

    match GLOBAL_RATE_LIMITER.check_rate_limit(ip).await {
        Ok(()) => next.run(req).await,
        Err(rejection) => rejection.into_response(),
    }
}

/// Named limiters for individual write-heavy endpoints, checked by the handlers themselves.
#[derive(Clone, Default)]
pub struct EndpointRateLimiter {
    limiters: Arc<HashMap<String, RateLimiter>>,
}

impl EndpointRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces limits given as `(endpoint, max_requests, window_seconds)`.
    pub fn with_limits(self, limits: Vec<(&str, usize, u64)>) -> Self {
        let mut map = Arc::try_unwrap(self.limiters).unwrap_or_else(|shared| (*shared).clone());
        for (endpoint, max_requests, window_seconds) in limits {
            map.insert(endpoint.to_string(), RateLimiter::new(max_requests, window_seconds));
        }
        Self { limiters: Arc::new(map) }
    }

    /// Endpoints without a configured limit always pass.
    pub async fn check_endpoint_limit(&self, endpoint: &str, ip: IpAddr) -> Result<(), RateLimitRejection> {
        match self.limiters.get(endpoint) {
            Some(limiter) => limiter.check_rate_limit(ip).await,
            None => Ok(()),
        }
    }

    pub async fn cleanup_all(&self) {
        for limiter in self.limiters.values() {
            limiter.cleanup_old_entries().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter() {
        let limiter = RateLimiter::new(3, 1);
        let ip = IpAddr::from([127, 0, 0, 1]);

        assert!(limiter.check_rate_limit(ip).await.is_ok());
        assert!(limiter.check_rate_limit(ip).await.is_ok());
        assert!(limiter.check_rate_limit(ip).await.is_ok());
        assert!(limiter.check_rate_limit(ip).await.is_err());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(limiter.check_rate_limit(ip).await.is_ok());
    }

    #[tokio::test]
    async fn test_different_ips() {
        let limiter = RateLimiter::new(1, 60);
        let ip1 = IpAddr::from([127, 0, 0, 1]);
        let ip2 = IpAddr::from([127, 0, 0, 2]);

        assert!(limiter.check_rate_limit(ip1).await.is_ok());
        assert!(limiter.check_rate_limit(ip2).await.is_ok());
        assert!(limiter.check_rate_limit(ip1).await.is_err());
        assert!(limiter.check_rate_limit(ip2).await.is_err());
    }

    #[tokio::test]
    async fn test_endpoint_limits_are_separate() {
        let limiter = EndpointRateLimiter::new().with_limits(vec![("/users", 1, 60), ("/entries", 2, 60)]);
        let ip = IpAddr::from([10, 0, 0, 1]);

        assert!(limiter.check_endpoint_limit("/users", ip).await.is_ok());
        assert!(limiter.check_endpoint_limit("/users", ip).await.is_err());

        assert!(limiter.check_endpoint_limit("/entries", ip).await.is_ok());
        assert!(limiter.check_endpoint_limit("/entries", ip).await.is_ok());
        assert!(limiter.check_endpoint_limit("/entries", ip).await.is_err());

        for _ in 0..10 {
            assert!(limiter.check_endpoint_limit("/tags", ip).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_cleanup_forgets_idle_ips() {
        let limiter = RateLimiter::new(5, 1);
        let ip = IpAddr::from([127, 0, 0, 3]);
        limiter.check_rate_limit(ip).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        limiter.cleanup_old_entries().await;
        assert!(limiter.requests.read().await.is_empty());
    }
}
