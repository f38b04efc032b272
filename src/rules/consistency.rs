use sqlx::SqliteConnection;

use crate::error::{AppError, AppResult};
use crate::store::{entries, favorites};
use crate::types::Entry;

/// Copies owner and visibility from the parent favorite, then counts the entry.
///
/// The copy is a snapshot: later changes to the favorite are not propagated.
pub async fn entry_created(conn: &mut SqliteConnection, entry: &mut Entry) -> AppResult<()> {
    let parent = favorites::fetch_favorite(&mut *conn, entry.belong)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("favorite {} not found", entry.belong)))?;

    entries::set_inherited_fields(&mut *conn, entry.id, parent.created_by, parent.is_public).await?;
    entry.created_by = Some(parent.created_by);
    entry.is_public = parent.is_public;

    favorites::adjust_entries_num(&mut *conn, parent.id, 1).await?;
    tracing::debug!("Entry {} counted in favorite {}", entry.id, parent.id);
    Ok(())
}

/// Uncounts a deleted entry. A parent that is already gone is not an error.
pub async fn entry_deleted(conn: &mut SqliteConnection, entry: &Entry) -> AppResult<()> {
    let touched = favorites::adjust_entries_num(&mut *conn, entry.belong, -1).await?;
    if touched == 0 {
        tracing::debug!("Favorite {} of deleted entry {} no longer exists", entry.belong, entry.id);
    }
    Ok(())
}

pub async fn entry_moved(conn: &mut SqliteConnection, entry: &Entry, previous_favorite: i64) -> AppResult<()> {
    if previous_favorite == entry.belong {
        return Ok(());
    }
    favorites::adjust_entries_num(&mut *conn, previous_favorite, -1).await?;
    let touched = favorites::adjust_entries_num(&mut *conn, entry.belong, 1).await?;
    if touched == 0 {
        return Err(AppError::NotFound(format!("favorite {} not found", entry.belong)));
    }
    tracing::debug!("Entry {} moved from favorite {} to {}", entry.id, previous_favorite, entry.belong);
    Ok(())
}

pub async fn entries_purged(conn: &mut SqliteConnection, favorite_id: i64, removed: u64) -> AppResult<()> {
    if removed == 0 {
        return Ok(());
    }
    let delta = i64::try_from(removed)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("purge count {} out of range", removed)))?;
    let touched = favorites::adjust_entries_num(&mut *conn, favorite_id, -delta).await?;
    if touched == 0 {
        tracing::debug!("Favorite {} of {} purged entries no longer exists", favorite_id, removed);
    }
    Ok(())
}
