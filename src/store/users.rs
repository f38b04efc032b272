use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use super::{favorites, page_bounds, EntityStore};
use crate::error::{
    validation::{validate_max_len, validate_username},
    AppError, AppResult,
};
use crate::naming::{self, StorageOwner};
use crate::types::{CreateUserRequest, Paging, UpdateUserRequest, User};

const USER_COLUMNS: &str = "id, username, email, avatar, default_favor, date_joined";

fn user_from_row(r: &SqliteRow) -> User {
    User {
        id: r.get("id"),
        username: r.get("username"),
        email: r.get("email"),
        avatar: r.get("avatar"),
        default_favor: r.get("default_favor"),
        date_joined: r.get("date_joined"),
    }
}

fn validate_email(email: &str) -> AppResult<()> {
    validate_max_len(email, "email", 254)?;
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
        .unwrap_or(false);
    if !valid {
        return Err(AppError::ValidationError {
            field: "email".to_string(),
            message: format!("Invalid email address: {}", email),
        });
    }
    Ok(())
}

pub async fn insert_user(conn: &mut SqliteConnection, username: &str, email: Option<&str>) -> AppResult<User> {
    let id = sqlx::query("INSERT INTO users (username, email) VALUES (?1, ?2)")
        .bind(username)
        .bind(email)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();
    fetch_user(conn, id).await?.ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))
}

pub async fn fetch_user(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.as_ref().map(user_from_row))
}

pub async fn set_default_favor(conn: &mut SqliteConnection, user_id: i64, favorite_id: Option<i64>) -> AppResult<()> {
    sqlx::query("UPDATE users SET default_favor = ?1 WHERE id = ?2")
        .bind(favorite_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

impl EntityStore {
    /// Inserts the user and provisions its default resources in one transaction.
    pub async fn create_user(&self, req: &CreateUserRequest) -> AppResult<User> {
        let username = req.username.trim();
        validate_username(username)?;
        if let Some(email) = req.email.as_deref() {
            validate_email(email)?;
        }

        let mut tx = self.begin_write().await?;
        let mut user = insert_user(&mut tx, username, req.email.as_deref()).await?;
        self.rules.on_user_created(&mut tx, &mut user).await?;
        tx.commit().await?;

        tracing::info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> AppResult<User> {
        let mut conn = self.db.acquire().await?;
        fetch_user(&mut conn, id).await?.ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))
    }

    pub async fn list_users(&self, paging: &Paging) -> AppResult<Vec<User>> {
        let (limit, offset) = page_bounds(paging.limit, paging.offset);
        let rows = sqlx::query(&format!("SELECT {} FROM users ORDER BY id LIMIT ?1 OFFSET ?2", USER_COLUMNS))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    /// Plain field update. Never provisions anything.
    pub async fn update_user(&self, id: i64, req: &UpdateUserRequest) -> AppResult<User> {
        let mut tx = self.begin_write().await?;
        let mut user = fetch_user(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;

        if let Some(username) = req.username.as_deref() {
            let username = username.trim();
            validate_username(username)?;
            user.username = username.to_string();
        }
        if let Some(email) = req.email.as_deref() {
            validate_email(email)?;
            user.email = Some(email.to_string());
        }
        if let Some(favorite_id) = req.default_favor {
            let favorite = favorites::fetch_favorite(&mut tx, favorite_id)
                .await?
                .ok_or_else(|| AppError::BadRequest(format!("favorite {} does not exist", favorite_id)))?;
            if favorite.created_by != id {
                return Err(AppError::BadRequest(format!(
                    "favorite {} is not owned by user {}",
                    favorite_id, id
                )));
            }
            user.default_favor = Some(favorite_id);
        }

        sqlx::query("UPDATE users SET username = ?1, email = ?2, default_favor = ?3 WHERE id = ?4")
            .bind(user.username.as_str())
            .bind(user.email.as_deref())
            .bind(user.default_favor)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(user)
    }

    /// Deletes the user together with its favorites, their entries and its setting.
    ///
    /// Entries of other users' favorites that this user created survive with
    /// `created_by = NULL`, so no foreign count changes.
    pub async fn delete_user(&self, id: i64) -> AppResult<()> {
        let mut tx = self.begin_write().await?;
        if fetch_user(&mut tx, id).await?.is_none() {
            return Err(AppError::NotFound(format!("user {} not found", id)));
        }

        let favorite_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM favorites WHERE created_by = ?1")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
        for favorite_id in favorite_ids {
            self.remove_favorite_in(&mut tx, favorite_id).await?;
        }

        sqlx::query("DELETE FROM users WHERE id = ?1").bind(id).execute(&mut *tx).await?;
        tx.commit().await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Reserves a storage path for a new avatar and records it on the user.
    pub async fn assign_avatar(&self, id: i64, avatar_dir: &str, filename: &str) -> AppResult<String> {
        let mut tx = self.begin_write().await?;
        let user = fetch_user(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;
        let path = naming::build_storage_path(avatar_dir, StorageOwner::from(&user), filename)?;
        sqlx::query("UPDATE users SET avatar = ?1 WHERE id = ?2")
            .bind(path.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(path)
    }
}
