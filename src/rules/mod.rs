//! Lifecycle rules fired by the entity store.
//!
//! The store calls these synchronously, on the same transaction as the mutation that
//! triggered them, so a failing rule rolls the whole operation back:
//!
//! - [`provisioning`]: a new user gets a default favorite, a sample entry and a setting.
//! - [`consistency`]: entries inherit owner and visibility from their favorite, and every
//!   favorite's `entries_num` tracks its live entry count.

pub mod consistency;
pub mod provisioning;

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::config::ProvisioningConfig;
use crate::error::AppResult;
use crate::types::{Entry, User};

/// Hooks the [`EntityStore`](crate::store::EntityStore) invokes after it writes a row.
///
/// Every method receives the open transaction's connection. Implementations must not touch
/// the pool directly, otherwise they would run outside the caller's transaction.
#[async_trait]
pub trait LifecycleRules: Send + Sync {
    /// Runs once, right after a user row is first inserted. Never on updates.
    async fn on_user_created(&self, conn: &mut SqliteConnection, user: &mut User) -> AppResult<()>;

    /// Runs once, right after an entry row is first inserted.
    async fn on_entry_created(&self, conn: &mut SqliteConnection, entry: &mut Entry) -> AppResult<()>;

    /// Runs after a single entry row is deleted. Bulk removals use `on_entries_purged`.
    async fn on_entry_deleted(&self, conn: &mut SqliteConnection, entry: &Entry) -> AppResult<()>;

    /// Runs after `entry.belong` was changed away from `previous_favorite`.
    async fn on_entry_moved(
        &self,
        conn: &mut SqliteConnection,
        entry: &Entry,
        previous_favorite: i64,
    ) -> AppResult<()>;

    /// Runs after `removed` entries of one favorite were deleted by a single statement.
    async fn on_entries_purged(
        &self,
        conn: &mut SqliteConnection,
        favorite_id: i64,
        removed: u64,
    ) -> AppResult<()>;
}

/// The rules of the bookmark service.
#[derive(Debug, Clone, Default)]
pub struct BookmarkRules {
    provisioning: ProvisioningConfig,
}

impl BookmarkRules {
    pub fn new(provisioning: ProvisioningConfig) -> Self {
        Self { provisioning }
    }
}

#[async_trait]
impl LifecycleRules for BookmarkRules {
    async fn on_user_created(&self, conn: &mut SqliteConnection, user: &mut User) -> AppResult<()> {
        provisioning::provision_user(conn, &self.provisioning, user).await
    }

    async fn on_entry_created(&self, conn: &mut SqliteConnection, entry: &mut Entry) -> AppResult<()> {
        consistency::entry_created(conn, entry).await
    }

    async fn on_entry_deleted(&self, conn: &mut SqliteConnection, entry: &Entry) -> AppResult<()> {
        consistency::entry_deleted(conn, entry).await
    }

    async fn on_entry_moved(
        &self,
        conn: &mut SqliteConnection,
        entry: &Entry,
        previous_favorite: i64,
    ) -> AppResult<()> {
        consistency::entry_moved(conn, entry, previous_favorite).await
    }

    async fn on_entries_purged(
        &self,
        conn: &mut SqliteConnection,
        favorite_id: i64,
        removed: u64,
    ) -> AppResult<()> {
        consistency::entries_purged(conn, favorite_id, removed).await
    }
}
