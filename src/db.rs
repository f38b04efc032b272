use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// Opens the pool with per-connection pragmas. Foreign keys are per connection in SQLite,
/// so they must be enabled in `after_connect` rather than once at startup.
pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys=ON;").execute(&mut *conn).await?;
                let _ = sqlx::query("PRAGMA busy_timeout=10000;").execute(&mut *conn).await;
                let _ = sqlx::query("PRAGMA temp_store=MEMORY;").execute(&mut *conn).await;
                Ok(())
            })
        })
        .connect(url)
        .await?;
    Ok(pool)
}

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    // Pragmas for better durability/performance
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA synchronous=NORMAL;").execute(pool).await {
        tracing::warn!("Failed to set synchronous mode: {}", e);
    }
    // Foreign keys are critical - cascades and SET NULL depend on them
    sqlx::query("PRAGMA foreign_keys=ON;").execute(pool).await?;

    // users.default_favor and favorites.created_by reference each other; SQLite resolves
    // foreign keys lazily so the creation order below is fine.
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NULL,
            avatar TEXT NULL,
            default_favor INTEGER NULL UNIQUE,
            date_joined TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
            FOREIGN KEY(default_favor) REFERENCES favorites(id) ON DELETE SET NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS favorites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            is_public INTEGER NOT NULL DEFAULT 0,
            entries_num INTEGER NOT NULL DEFAULT 0,
            created_by INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
            FOREIGN KEY(created_by) REFERENCES users(id) ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            thumbnail TEXT NULL,
            priority INTEGER NOT NULL DEFAULT 0,
            remark TEXT NOT NULL DEFAULT '',
            is_public INTEGER NOT NULL DEFAULT 0,
            views INTEGER NOT NULL DEFAULT 0,
            belong INTEGER NOT NULL,
            created_by INTEGER NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
            FOREIGN KEY(belong) REFERENCES favorites(id) ON DELETE CASCADE,
            FOREIGN KEY(created_by) REFERENCES users(id) ON DELETE SET NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS entry_tags (
            entry_id INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            PRIMARY KEY(entry_id, tag_id),
            FOREIGN KEY(entry_id) REFERENCES entries(id) ON DELETE CASCADE,
            FOREIGN KEY(tag_id) REFERENCES tags(id) ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS settings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner INTEGER NOT NULL UNIQUE,
            display_style TEXT NOT NULL DEFAULT 'Medium',
            layout_style TEXT NOT NULL DEFAULT 'Medium',
            quick_mode INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(owner) REFERENCES users(id) ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        ("idx_favorites_created_by", "CREATE INDEX IF NOT EXISTS idx_favorites_created_by ON favorites(created_by)"),
        ("idx_entries_belong", "CREATE INDEX IF NOT EXISTS idx_entries_belong ON entries(belong)"),
        ("idx_entries_created_by", "CREATE INDEX IF NOT EXISTS idx_entries_created_by ON entries(created_by)"),
        ("idx_entry_tags_tag", "CREATE INDEX IF NOT EXISTS idx_entry_tags_tag ON entry_tags(tag_id)"),
    ];

    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            match &e {
                sqlx::Error::Database(db_err) => {
                    let msg = db_err.message().to_lowercase();
                    if msg.contains("already exists") || msg.contains("duplicate") {
                        tracing::debug!("Index {} already exists, skipping", name);
                    } else {
                        tracing::warn!("Failed to create index {}: {}", name, e);
                    }
                }
                _ => {
                    tracing::warn!("Failed to create index {}: {}", name, e);
                }
            }
        }
    }

    Ok(())
}

/// Rewrites every `entries_num` that disagrees with the live entry count.
///
/// Writes that bypassed the store (manual SQL, restores from old backups) are the only way
/// the counter can drift. Returns the number of favorites that were repaired.
pub async fn reconcile_entry_counts(pool: &SqlitePool) -> anyhow::Result<u64> {
    let drifted: Vec<(i64, i64, i64)> = sqlx::query_as(
        r#"SELECT f.id, f.entries_num, (SELECT COUNT(*) FROM entries e WHERE e.belong = f.id) AS live
           FROM favorites f
           WHERE f.entries_num != (SELECT COUNT(*) FROM entries e WHERE e.belong = f.id)"#,
    )
    .fetch_all(pool)
    .await?;

    for (id, stored, live) in &drifted {
        tracing::warn!("Favorite {} entries_num drifted: stored {}, live {}", id, stored, live);
    }

    let res = sqlx::query(
        r#"UPDATE favorites
           SET entries_num = (SELECT COUNT(*) FROM entries e WHERE e.belong = favorites.id)
           WHERE entries_num != (SELECT COUNT(*) FROM entries e WHERE e.belong = favorites.id)"#,
    )
    .execute(pool)
    .await?;

    Ok(res.rows_affected())
}
