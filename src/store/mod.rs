//! The entity store: SQLite persistence for users, favorites, entries, tags and settings.
//!
//! Each submodule has two layers:
//!
//! - row helpers (`insert_*`, `fetch_*`, ...) that run plain SQL on a borrowed
//!   `SqliteConnection`, usable inside any transaction, including from the lifecycle rules;
//! - `EntityStore` methods that open a [`WriteTx`], validate input, write rows, fire the
//!   injected [`LifecycleRules`] and commit.

pub mod entries;
pub mod favorites;
pub mod settings;
pub mod tags;
pub mod users;

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use sqlx::{pool::PoolConnection, Executor, Sqlite, SqliteConnection, SqlitePool};

use crate::error::AppResult;
use crate::rules::LifecycleRules;
use crate::types::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Clone)]
pub struct EntityStore {
    db: SqlitePool,
    rules: Arc<dyn LifecycleRules>,
}

impl EntityStore {
    pub fn new(db: SqlitePool, rules: Arc<dyn LifecycleRules>) -> Self {
        Self { db, rules }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    pub(crate) async fn begin_write(&self) -> AppResult<WriteTx> {
        WriteTx::begin(&self.db).await
    }
}

/// A write transaction opened with `BEGIN IMMEDIATE`.
///
/// The write lock is taken before the first read, so overlapping writers wait on
/// `busy_timeout` instead of failing with `SQLITE_BUSY` on a stale snapshot. Dropping it
/// without [`WriteTx::commit`] rolls back before the connection returns to the pool.
pub struct WriteTx {
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteTx {
    pub async fn begin(pool: &SqlitePool) -> AppResult<Self> {
        let mut conn = pool.acquire().await?;
        (&mut *conn).execute("BEGIN IMMEDIATE").await?;
        Ok(Self { conn: Some(conn) })
    }

    pub async fn commit(mut self) -> AppResult<()> {
        if let Some(mut conn) = self.conn.take() {
            if let Err(e) = (&mut *conn).execute("COMMIT").await {
                rollback(conn).await;
                return Err(e.into());
            }
        }
        Ok(())
    }
}

async fn rollback(mut conn: PoolConnection<Sqlite>) {
    if let Err(e) = (&mut *conn).execute("ROLLBACK").await {
        // Never hand a connection with an open transaction back to the pool
        tracing::warn!("Rollback failed, closing connection: {}", e);
        drop(conn.detach());
    }
}

impl Drop for WriteTx {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(rollback(conn));
                }
                Err(_) => drop(conn.detach()),
            }
        }
    }
}

impl Deref for WriteTx {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        self.conn.as_deref().expect("write transaction used after commit")
    }
}

impl DerefMut for WriteTx {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        self.conn.as_deref_mut().expect("write transaction used after commit")
    }
}

/// Clamps user supplied paging values to `(limit, offset)`.
pub(crate) fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}
