use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use super::{page_bounds, users, EntityStore};
use crate::error::{
    validation::{validate_required_text, MAX_FAVORITE_NAME_LEN},
    AppError, AppResult,
};
use crate::types::{CountAdjustment, CreateFavoriteRequest, Favorite, FavoriteFilter, UpdateFavoriteRequest};

/// Name used when a favorite is created without one, and for provisioned defaults.
pub const DEFAULT_FAVORITE_NAME: &str = "Default";

const FAVORITE_COLUMNS: &str = "id, name, is_public, entries_num, created_by, created_at, updated_at";

fn favorite_from_row(r: &SqliteRow) -> Favorite {
    Favorite {
        id: r.get("id"),
        name: r.get("name"),
        is_public: r.get("is_public"),
        entries_num: r.get("entries_num"),
        created_by: r.get("created_by"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

pub async fn insert_favorite(
    conn: &mut SqliteConnection,
    name: &str,
    is_public: bool,
    created_by: i64,
) -> AppResult<Favorite> {
    let id = sqlx::query("INSERT INTO favorites (name, is_public, entries_num, created_by) VALUES (?1, ?2, 0, ?3)")
        .bind(name)
        .bind(is_public)
        .bind(created_by)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();
    fetch_favorite(conn, id).await?.ok_or_else(|| AppError::NotFound(format!("favorite {} not found", id)))
}

pub async fn fetch_favorite(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Favorite>> {
    let row = sqlx::query(&format!("SELECT {} FROM favorites WHERE id = ?1", FAVORITE_COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.as_ref().map(favorite_from_row))
}

/// Shifts `entries_num` by `delta` in a single statement. Returns the number of favorites
/// touched: 0 means the favorite does not exist (any more).
pub async fn adjust_entries_num(conn: &mut SqliteConnection, id: i64, delta: i64) -> AppResult<u64> {
    let res = sqlx::query(
        r#"UPDATE favorites
           SET entries_num = entries_num + ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now')
           WHERE id = ?2"#,
    )
    .bind(delta)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(res.rows_affected())
}

impl EntityStore {
    pub async fn create_favorite(&self, req: &CreateFavoriteRequest) -> AppResult<Favorite> {
        let name = req.name.as_deref().map(str::trim).unwrap_or(DEFAULT_FAVORITE_NAME);
        validate_required_text(name, "name", MAX_FAVORITE_NAME_LEN)?;

        let mut tx = self.begin_write().await?;
        if users::fetch_user(&mut tx, req.created_by).await?.is_none() {
            return Err(AppError::NotFound(format!("user {} not found", req.created_by)));
        }
        let favorite = insert_favorite(&mut tx, name, req.is_public.unwrap_or(false), req.created_by).await?;
        tx.commit().await?;
        Ok(favorite)
    }

    pub async fn get_favorite(&self, id: i64) -> AppResult<Favorite> {
        let mut conn = self.db.acquire().await?;
        fetch_favorite(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("favorite {} not found", id)))
    }

    pub async fn list_favorites(&self, filter: &FavoriteFilter) -> AppResult<Vec<Favorite>> {
        let (limit, offset) = page_bounds(filter.limit, filter.offset);
        let rows = sqlx::query(&format!(
            "SELECT {} FROM favorites WHERE (?1 IS NULL OR created_by = ?1) ORDER BY id LIMIT ?2 OFFSET ?3",
            FAVORITE_COLUMNS
        ))
        .bind(filter.created_by)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.iter().map(favorite_from_row).collect())
    }

    /// Renames or changes visibility. Entries keep the visibility they were created with.
    pub async fn update_favorite(&self, id: i64, req: &UpdateFavoriteRequest) -> AppResult<Favorite> {
        if let Some(name) = req.name.as_deref() {
            validate_required_text(name.trim(), "name", MAX_FAVORITE_NAME_LEN)?;
        }
        let mut tx = self.begin_write().await?;
        let res = sqlx::query(
            r#"UPDATE favorites
               SET name = COALESCE(?1, name), is_public = COALESCE(?2, is_public),
                   updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now')
               WHERE id = ?3"#,
        )
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.is_public)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("favorite {} not found", id)));
        }
        let favorite = fetch_favorite(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("favorite {} not found", id)))?;
        tx.commit().await?;
        Ok(favorite)
    }

    /// Deletes a favorite and its entries. A user pointing at it as default loses the link.
    pub async fn delete_favorite(&self, id: i64) -> AppResult<()> {
        let mut tx = self.begin_write().await?;
        if fetch_favorite(&mut tx, id).await?.is_none() {
            return Err(AppError::NotFound(format!("favorite {} not found", id)));
        }
        self.remove_favorite_in(&mut tx, id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Removes every entry of the favorite, adjusting its count by the number removed.
    pub async fn purge_entries(&self, id: i64) -> AppResult<CountAdjustment> {
        let mut tx = self.begin_write().await?;
        if fetch_favorite(&mut tx, id).await?.is_none() {
            return Err(AppError::NotFound(format!("favorite {} not found", id)));
        }
        let removed = self.purge_entries_in(&mut tx, id).await?;
        let favorite = fetch_favorite(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("favorite {} not found", id)))?;
        tx.commit().await?;
        Ok(CountAdjustment { favorite_id: id, entries_num: favorite.entries_num, changed_by: -(removed as i64) })
    }

    /// Recomputes `entries_num` from the live rows of one favorite.
    pub async fn recount_entries(&self, id: i64) -> AppResult<CountAdjustment> {
        let mut tx = self.begin_write().await?;
        let before = fetch_favorite(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("favorite {} not found", id)))?;
        let live: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE belong = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if live != before.entries_num {
            tracing::warn!("Favorite {} entries_num drifted: stored {}, live {}", id, before.entries_num, live);
            sqlx::query("UPDATE favorites SET entries_num = ?1 WHERE id = ?2")
                .bind(live)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(CountAdjustment { favorite_id: id, entries_num: live, changed_by: live - before.entries_num })
    }

    pub(crate) async fn purge_entries_in(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<u64> {
        let removed = sqlx::query("DELETE FROM entries WHERE belong = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        self.rules.on_entries_purged(&mut *conn, id, removed).await?;
        Ok(removed)
    }

    pub(crate) async fn remove_favorite_in(&self, conn: &mut SqliteConnection, id: i64) -> AppResult<()> {
        let removed = self.purge_entries_in(&mut *conn, id).await?;
        sqlx::query("DELETE FROM favorites WHERE id = ?1").bind(id).execute(&mut *conn).await?;
        tracing::debug!("Deleted favorite {} with {} entries", id, removed);
        Ok(())
    }
}
