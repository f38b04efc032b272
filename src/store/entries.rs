use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use super::{favorites, page_bounds, tags, EntityStore};
use crate::error::{
    validation::{validate_max_len, validate_url, MAX_REMARK_LEN, MAX_TITLE_LEN},
    AppError, AppResult,
};
use crate::naming::{self, StorageOwner};
use crate::types::{CreateEntryRequest, Entry, EntryFilter, Priority, UpdateEntryRequest};

pub const DEFAULT_TITLE: &str = "Untitled";

const ENTRY_SELECT: &str = r#"SELECT e.id, e.title, e.url, e.thumbnail, e.priority, e.remark, e.is_public,
        e.views, e.belong, e.created_by, e.created_at, e.updated_at,
        (SELECT group_concat(t.tag_id) FROM entry_tags t WHERE t.entry_id = e.id) AS tag_ids
    FROM entries e"#;

fn entry_from_row(r: &SqliteRow) -> Entry {
    let tag_ids: Option<String> = r.get("tag_ids");
    let mut tags: Vec<i64> = tag_ids
        .as_deref()
        .unwrap_or("")
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    tags.sort_unstable();
    Entry {
        id: r.get("id"),
        title: r.get("title"),
        url: r.get("url"),
        thumbnail: r.get("thumbnail"),
        priority: Priority::from_i64(r.get("priority")),
        remark: r.get("remark"),
        is_public: r.get("is_public"),
        views: r.get("views"),
        belong: r.get("belong"),
        created_by: r.get("created_by"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
        tags,
    }
}

/// Column values of an entry row before the lifecycle rules fill in the inherited fields.
#[derive(Debug, Clone)]
pub struct NewEntry<'a> {
    pub belong: i64,
    pub title: &'a str,
    pub url: &'a str,
    pub priority: Priority,
    pub remark: &'a str,
}

pub async fn insert_entry(conn: &mut SqliteConnection, new: &NewEntry<'_>) -> AppResult<Entry> {
    let id = sqlx::query(
        "INSERT INTO entries (title, url, priority, remark, belong) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(new.title)
    .bind(new.url)
    .bind(new.priority.as_i64())
    .bind(new.remark)
    .bind(new.belong)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    fetch_entry(conn, id).await?.ok_or_else(|| AppError::NotFound(format!("entry {} not found", id)))
}

pub async fn fetch_entry(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Entry>> {
    let row = sqlx::query(&format!("{} WHERE e.id = ?1", ENTRY_SELECT))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.as_ref().map(entry_from_row))
}

pub async fn set_inherited_fields(
    conn: &mut SqliteConnection,
    id: i64,
    created_by: i64,
    is_public: bool,
) -> AppResult<()> {
    sqlx::query("UPDATE entries SET created_by = ?1, is_public = ?2 WHERE id = ?3")
        .bind(created_by)
        .bind(is_public)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn require_entry(entry: Option<Entry>, id: i64) -> AppResult<Entry> {
    entry.ok_or_else(|| AppError::NotFound(format!("entry {} not found", id)))
}

impl EntityStore {
    /// Inserts an entry; the rules copy owner/visibility from the favorite and count it.
    pub async fn create_entry(&self, req: &CreateEntryRequest) -> AppResult<Entry> {
        let url = req.url.trim();
        validate_url(url)?;
        let title = match req.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => DEFAULT_TITLE,
        };
        validate_max_len(title, "title", MAX_TITLE_LEN)?;
        let remark = req.remark.as_deref().unwrap_or("");
        validate_max_len(remark, "remark", MAX_REMARK_LEN)?;

        let mut tx = self.begin_write().await?;
        if favorites::fetch_favorite(&mut tx, req.belong).await?.is_none() {
            return Err(AppError::NotFound(format!("favorite {} not found", req.belong)));
        }
        let new = NewEntry {
            belong: req.belong,
            title,
            url,
            priority: req.priority.unwrap_or_default(),
            remark,
        };
        let mut entry = insert_entry(&mut tx, &new).await?;
        self.rules.on_entry_created(&mut tx, &mut entry).await?;
        if let Some(tag_ids) = req.tags.as_deref() {
            tags::replace_entry_tags(&mut tx, entry.id, tag_ids).await?;
        }
        let entry = require_entry(fetch_entry(&mut tx, entry.id).await?, entry.id)?;
        tx.commit().await?;
        Ok(entry)
    }

    pub async fn get_entry(&self, id: i64) -> AppResult<Entry> {
        let mut conn = self.db.acquire().await?;
        require_entry(fetch_entry(&mut conn, id).await?, id)
    }

    pub async fn list_entries(&self, filter: &EntryFilter) -> AppResult<Vec<Entry>> {
        let (limit, offset) = page_bounds(filter.limit, filter.offset);
        let rows = sqlx::query(&format!(
            r#"{} WHERE (?1 IS NULL OR e.belong = ?1)
                 AND (?2 IS NULL OR e.created_by = ?2)
                 AND (?3 IS NULL OR EXISTS (SELECT 1 FROM entry_tags t WHERE t.entry_id = e.id AND t.tag_id = ?3))
               ORDER BY e.priority DESC, e.id LIMIT ?4 OFFSET ?5"#,
            ENTRY_SELECT
        ))
        .bind(filter.belong)
        .bind(filter.created_by)
        .bind(filter.tag)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.iter().map(entry_from_row).collect())
    }

    /// Field update. Moving to another favorite shifts both counts; owner and visibility
    /// keep their creation-time snapshot unless `is_public` is set explicitly.
    pub async fn update_entry(&self, id: i64, req: &UpdateEntryRequest) -> AppResult<Entry> {
        let mut tx = self.begin_write().await?;
        let mut entry = require_entry(fetch_entry(&mut tx, id).await?, id)?;
        let previous_favorite = entry.belong;

        if let Some(url) = req.url.as_deref() {
            let url = url.trim();
            validate_url(url)?;
            entry.url = url.to_string();
        }
        if let Some(title) = req.title.as_deref() {
            let title = title.trim();
            validate_max_len(title, "title", MAX_TITLE_LEN)?;
            entry.title = if title.is_empty() { DEFAULT_TITLE.to_string() } else { title.to_string() };
        }
        if let Some(remark) = req.remark.as_deref() {
            validate_max_len(remark, "remark", MAX_REMARK_LEN)?;
            entry.remark = remark.to_string();
        }
        if let Some(priority) = req.priority {
            entry.priority = priority;
        }
        if let Some(is_public) = req.is_public {
            entry.is_public = is_public;
        }
        if let Some(belong) = req.belong {
            if favorites::fetch_favorite(&mut tx, belong).await?.is_none() {
                return Err(AppError::BadRequest(format!("favorite {} does not exist", belong)));
            }
            entry.belong = belong;
        }

        sqlx::query(
            r#"UPDATE entries
               SET title = ?1, url = ?2, priority = ?3, remark = ?4, is_public = ?5, belong = ?6,
                   updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now')
               WHERE id = ?7"#,
        )
        .bind(entry.title.as_str())
        .bind(entry.url.as_str())
        .bind(entry.priority.as_i64())
        .bind(entry.remark.as_str())
        .bind(entry.is_public)
        .bind(entry.belong)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if entry.belong != previous_favorite {
            self.rules.on_entry_moved(&mut tx, &entry, previous_favorite).await?;
        }
        if let Some(tag_ids) = req.tags.as_deref() {
            tags::replace_entry_tags(&mut tx, id, tag_ids).await?;
        }

        let entry = require_entry(fetch_entry(&mut tx, id).await?, id)?;
        tx.commit().await?;
        Ok(entry)
    }

    pub async fn delete_entry(&self, id: i64) -> AppResult<()> {
        let mut tx = self.begin_write().await?;
        let entry = require_entry(fetch_entry(&mut tx, id).await?, id)?;
        sqlx::query("DELETE FROM entries WHERE id = ?1").bind(id).execute(&mut *tx).await?;
        self.rules.on_entry_deleted(&mut tx, &entry).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Counts one visit with an atomic increment.
    pub async fn record_visit(&self, id: i64) -> AppResult<Entry> {
        let mut tx = self.begin_write().await?;
        let res = sqlx::query("UPDATE entries SET views = views + 1 WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("entry {} not found", id)));
        }
        let entry = require_entry(fetch_entry(&mut tx, id).await?, id)?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Reserves a storage path for a new thumbnail and records it on the entry.
    pub async fn assign_thumbnail(&self, id: i64, thumbnail_dir: &str, filename: &str) -> AppResult<String> {
        let mut tx = self.begin_write().await?;
        let entry = require_entry(fetch_entry(&mut tx, id).await?, id)?;
        let path = naming::build_storage_path(thumbnail_dir, StorageOwner::from(&entry), filename)?;
        sqlx::query("UPDATE entries SET thumbnail = ?1 WHERE id = ?2")
            .bind(path.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(path)
    }
}
