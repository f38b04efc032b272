use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use super::{entries, page_bounds, EntityStore};
use crate::error::{
    validation::{validate_required_text, MAX_TAG_NAME_LEN},
    AppError, AppResult, OptionExt,
};
use crate::types::{Paging, Tag, TagRelation};

fn tag_from_row(r: &SqliteRow) -> Tag {
    Tag { id: r.get("id"), name: r.get("name") }
}

async fn fetch_tag(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Tag>> {
    let row = sqlx::query("SELECT id, name FROM tags WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.as_ref().map(tag_from_row))
}

/// Makes `tag_ids` the exact tag set of the entry. Unknown tag ids are rejected.
pub async fn replace_entry_tags(conn: &mut SqliteConnection, entry_id: i64, tag_ids: &[i64]) -> AppResult<()> {
    sqlx::query("DELETE FROM entry_tags WHERE entry_id = ?1")
        .bind(entry_id)
        .execute(&mut *conn)
        .await?;
    for &tag_id in tag_ids {
        if fetch_tag(&mut *conn, tag_id).await?.is_none() {
            return Err(AppError::BadRequest(format!("tag {} does not exist", tag_id)));
        }
        sqlx::query("INSERT OR IGNORE INTO entry_tags (entry_id, tag_id) VALUES (?1, ?2)")
            .bind(entry_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

impl EntityStore {
    pub async fn create_tag(&self, name: &str) -> AppResult<Tag> {
        let name = name.trim();
        validate_required_text(name, "name", MAX_TAG_NAME_LEN)?;
        let id = sqlx::query("INSERT INTO tags (name) VALUES (?1)")
            .bind(name)
            .execute(&self.db)
            .await?
            .last_insert_rowid();
        Ok(Tag { id, name: name.to_string() })
    }

    pub async fn get_tag(&self, id: i64) -> AppResult<Tag> {
        let mut conn = self.db.acquire().await?;
        fetch_tag(&mut conn, id).await?.ok_or_not_found(&format!("tag {}", id))
    }

    pub async fn list_tags(&self, paging: &Paging) -> AppResult<Vec<Tag>> {
        let (limit, offset) = page_bounds(paging.limit, paging.offset);
        let rows = sqlx::query("SELECT id, name FROM tags ORDER BY name, id LIMIT ?1 OFFSET ?2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.iter().map(tag_from_row).collect())
    }

    pub async fn rename_tag(&self, id: i64, name: &str) -> AppResult<Tag> {
        let name = name.trim();
        validate_required_text(name, "name", MAX_TAG_NAME_LEN)?;
        let res = sqlx::query("UPDATE tags SET name = ?1 WHERE id = ?2")
            .bind(name)
            .bind(id)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("tag {} not found", id)));
        }
        Ok(Tag { id, name: name.to_string() })
    }

    /// Deleting a tag only detaches it from entries; no counters are involved.
    pub async fn delete_tag(&self, id: i64) -> AppResult<()> {
        let res = sqlx::query("DELETE FROM tags WHERE id = ?1").bind(id).execute(&self.db).await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("tag {} not found", id)));
        }
        Ok(())
    }

    pub async fn attach_tag(&self, relation: &TagRelation) -> AppResult<TagRelation> {
        let mut tx = self.begin_write().await?;
        if entries::fetch_entry(&mut tx, relation.entry_id).await?.is_none() {
            return Err(AppError::NotFound(format!("entry {} not found", relation.entry_id)));
        }
        if fetch_tag(&mut tx, relation.tag_id).await?.is_none() {
            return Err(AppError::NotFound(format!("tag {} not found", relation.tag_id)));
        }
        let res = sqlx::query("INSERT OR IGNORE INTO entry_tags (entry_id, tag_id) VALUES (?1, ?2)")
            .bind(relation.entry_id)
            .bind(relation.tag_id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "entry {} already has tag {}",
                relation.entry_id, relation.tag_id
            )));
        }
        tx.commit().await?;
        Ok(relation.clone())
    }

    pub async fn detach_tag(&self, entry_id: i64, tag_id: i64) -> AppResult<()> {
        let res = sqlx::query("DELETE FROM entry_tags WHERE entry_id = ?1 AND tag_id = ?2")
            .bind(entry_id)
            .bind(tag_id)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("entry {} has no tag {}", entry_id, tag_id)));
        }
        Ok(())
    }

    pub async fn list_tag_relations(&self, paging: &Paging) -> AppResult<Vec<TagRelation>> {
        let (limit, offset) = page_bounds(paging.limit, paging.offset);
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT entry_id, tag_id FROM entry_tags ORDER BY entry_id, tag_id LIMIT ?1 OFFSET ?2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(|(entry_id, tag_id)| TagRelation { entry_id, tag_id }).collect())
    }
}
