use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

// Liveness probe, no database access
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// Readiness probe: checks DB connectivity with timeout protection
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let query = sqlx::query("SELECT 1").fetch_one(&state.db);
    match tokio::time::timeout(std::time::Duration::from_secs(5), query).await {
        Ok(Ok(_)) => (StatusCode::OK, "ready").into_response(),
        Ok(Err(e)) => (StatusCode::SERVICE_UNAVAILABLE, format!("not ready: {}", e)).into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "not ready: timeout").into_response(),
    }
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.get_snapshot())
}

// Prometheus text exposition format
pub async fn metrics_prometheus(State(state): State<AppState>) -> impl IntoResponse {
    let m = state.metrics.get_snapshot();
    let series: [(&str, &str, &str, u64); 7] = [
        ("users_created", "counter", "Users registered", m.users_created),
        ("favorites_created", "counter", "Favorites created", m.favorites_created),
        ("favorites_deleted", "counter", "Favorites deleted", m.favorites_deleted),
        ("entries_created", "counter", "Entries created", m.entries_created),
        ("entries_deleted", "counter", "Entries deleted", m.entries_deleted),
        ("entry_visits", "counter", "Entry visits recorded", m.entry_visits),
        ("uptime_seconds", "gauge", "Uptime seconds", m.uptime_seconds),
    ];
    let mut body = String::new();
    for (name, kind, help, value) in series {
        body.push_str(&format!(
            "# HELP bookmarker_{name} {help}\n# TYPE bookmarker_{name} {kind}\nbookmarker_{name} {value}\n"
        ));
    }
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

pub async fn version() -> impl IntoResponse {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "package": {
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "license": env!("CARGO_PKG_LICENSE"),
        },
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        }
    });
    (StatusCode::OK, Json(body))
}
