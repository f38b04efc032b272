use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use super::{page_bounds, EntityStore};
use crate::error::{AppError, AppResult, OptionExt};
use crate::types::{DisplayStyle, LayoutStyle, Paging, Setting, UpdateSettingRequest};

const SETTING_COLUMNS: &str = "id, owner, display_style, layout_style, quick_mode";

// Unknown stored values fall back to the defaults instead of failing the whole read.
fn setting_from_row(r: &SqliteRow) -> Setting {
    let display: String = r.get("display_style");
    let layout: String = r.get("layout_style");
    Setting {
        id: r.get("id"),
        owner: r.get("owner"),
        display_style: DisplayStyle::parse(&display).unwrap_or_default(),
        layout_style: LayoutStyle::parse(&layout).unwrap_or_default(),
        quick_mode: r.get("quick_mode"),
    }
}

pub async fn insert_default_setting(conn: &mut SqliteConnection, owner: i64) -> AppResult<Setting> {
    let id = sqlx::query("INSERT INTO settings (owner, display_style, layout_style, quick_mode) VALUES (?1, ?2, ?3, 0)")
        .bind(owner)
        .bind(DisplayStyle::default().as_str())
        .bind(LayoutStyle::default().as_str())
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();
    Ok(Setting {
        id,
        owner,
        display_style: DisplayStyle::default(),
        layout_style: LayoutStyle::default(),
        quick_mode: false,
    })
}

async fn fetch_setting_where(conn: &mut SqliteConnection, column: &str, value: i64) -> AppResult<Option<Setting>> {
    let row = sqlx::query(&format!("SELECT {} FROM settings WHERE {} = ?1", SETTING_COLUMNS, column))
        .bind(value)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.as_ref().map(setting_from_row))
}

impl EntityStore {
    pub async fn get_setting(&self, id: i64) -> AppResult<Setting> {
        let mut conn = self.db.acquire().await?;
        fetch_setting_where(&mut conn, "id", id).await?.ok_or_not_found(&format!("setting {}", id))
    }

    pub async fn get_user_setting(&self, user_id: i64) -> AppResult<Setting> {
        let mut conn = self.db.acquire().await?;
        fetch_setting_where(&mut conn, "owner", user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("setting of user {} not found", user_id)))
    }

    pub async fn list_settings(&self, paging: &Paging) -> AppResult<Vec<Setting>> {
        let (limit, offset) = page_bounds(paging.limit, paging.offset);
        let rows = sqlx::query(&format!("SELECT {} FROM settings ORDER BY id LIMIT ?1 OFFSET ?2", SETTING_COLUMNS))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.iter().map(setting_from_row).collect())
    }

    pub async fn update_setting(&self, id: i64, req: &UpdateSettingRequest) -> AppResult<Setting> {
        let mut tx = self.begin_write().await?;
        let res = sqlx::query(
            r#"UPDATE settings
               SET display_style = COALESCE(?1, display_style),
                   layout_style = COALESCE(?2, layout_style),
                   quick_mode = COALESCE(?3, quick_mode)
               WHERE id = ?4"#,
        )
        .bind(req.display_style.map(DisplayStyle::as_str))
        .bind(req.layout_style.map(LayoutStyle::as_str))
        .bind(req.quick_mode)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("setting {} not found", id)));
        }
        let setting = fetch_setting_where(&mut tx, "id", id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("setting {} not found", id)))?;
        tx.commit().await?;
        Ok(setting)
    }
}
