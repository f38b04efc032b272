use std::net::SocketAddr;

use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::time::{self, Duration};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookmarker::{build_router, config, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout plus a daily rotated file under ./logs
    std::fs::create_dir_all("logs").ok();
    let (stdout_nb, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let file_appender = tracing_appender::rolling::daily("logs", "bookmarker.log");
    let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=info,sqlx=warn".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(stdout_nb))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_nb))
        .init();
    // Writers flush only while the guards live
    let _log_guards = (stdout_guard, file_guard);

    // embedded defaults -> bookmarker.toml -> BOOKMARKER__* env
    let app_cfg = config::load()?;

    let db_url = &app_cfg.database.url;
    config::ensure_sqlite_parent_dir(db_url)?;
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        info!("Creating SQLite database at {}", db_url);
        Sqlite::create_database(db_url).await?;
    }
    let pool = db::connect(db_url, app_cfg.database.max_connections).await?;
    db::init_db(&pool).await?;

    if app_cfg.maintenance.reconcile_counts_on_startup {
        let fixed = db::reconcile_entry_counts(&pool).await?;
        if fixed > 0 {
            info!("Repaired entry counts on {} favorites", fixed);
        }
    }

    let state = AppState::new(pool, app_cfg.clone());

    // Periodic cleanup keeps the per-endpoint limiter maps bounded
    {
        let rl = state.rate_limiter.clone();
        tokio::spawn(async move {
            let mut ticker = time::interval(Duration::from_secs(300));
            loop {
                ticker.tick().await;
                rl.cleanup_all().await;
            }
        });
    }

    let app = build_router(state);
    // Permissive CORS only for local development against a separate frontend
    let app = if cfg!(debug_assertions) { app.layer(CorsLayer::permissive()) } else { app };

    let host = app_cfg.server.host.clone();
    let port = app_cfg.server.port;
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen addr {}:{} - {}", host, port, e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Bookmarker listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received. Stopping server...");
}
