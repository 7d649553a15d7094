use crate::bookmarks::BookmarkStore;
use crate::config::Config;
use crate::model::{Bookmark, BookmarkDraft, UpdatePatch};
use anyhow::Result;
use async_trait::async_trait;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const IN_MEMORY: &str = ":memory:";

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[("001_bookmarks.sql", include_str!("migrations/001_bookmarks.sql"))];

const BOOKMARK_COLUMNS: &str = "id, title, url, description, rating";

pub struct Database {
    _db: LibsqlDatabase,
    conn: Connection,
}

/// Turso credentials for running as an embedded replica.
#[derive(Debug, Clone)]
pub struct Replica {
    pub url: String,
    pub auth_token: String,
    pub sync_interval: Duration,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    /// Opens the database named in the config. Relative paths resolve against `data_dir`.
    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let name = cfg.app.get_db();
        let path = if name == IN_MEMORY {
            PathBuf::from(IN_MEMORY)
        } else {
            data_dir.join(name)
        };

        let replica = match (&cfg.app.turso_url, &cfg.app.turso_auth_token) {
            (Some(url), Some(token)) => Some(Replica {
                url: url.clone(),
                auth_token: token.clone(),
                sync_interval: Duration::from_secs(cfg.app.sync_interval_seconds),
            }),
            _ => None,
        };

        Self::open(&path, replica).await
    }

    pub async fn open(path: &Path, replica: Option<Replica>) -> Result<Self> {
        let db = match replica {
            Some(replica) => {
                tracing::info!("[db] running in synced database mode (offline writes)");
                Builder::new_synced_database(path, replica.url, replica.auth_token)
                    .sync_interval(replica.sync_interval)
                    .build()
                    .await?
            }
            None => {
                tracing::info!(path = ?path, "[db] running in local mode");
                Builder::new_local(path).build().await?
            }
        };

        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database { _db: db, conn })
    }

    pub async fn open_in_memory() -> Result<Self> {
        Self::open(Path::new(IN_MEMORY), None).await
    }

    fn row_to_bookmark(row: &libsql::Row) -> Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            description: row.get::<Option<String>>(3)?,
            rating: row.get(4)?,
        })
    }
}

#[async_trait]
impl BookmarkStore for Database {
    async fn list_all(&self) -> Result<Vec<Bookmark>> {
        let query = format!("SELECT {BOOKMARK_COLUMNS} FROM bookmarks ORDER BY id");
        let mut rows = self.conn.query(&query, ()).await?;

        let mut bookmarks = Vec::new();
        while let Some(row) = rows.next().await? {
            bookmarks.push(Self::row_to_bookmark(&row)?);
        }
        Ok(bookmarks)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Bookmark>> {
        let query = format!("SELECT {BOOKMARK_COLUMNS} FROM bookmarks WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_bookmark(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn insert(&self, draft: BookmarkDraft) -> Result<Bookmark> {
        let query = format!(
            "INSERT INTO bookmarks (title, url, description, rating) VALUES (?, ?, ?, ?) RETURNING {BOOKMARK_COLUMNS}"
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![draft.title, draft.url, draft.description, draft.rating],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Self::row_to_bookmark(&row)
        } else {
            anyhow::bail!("Failed to create bookmark")
        }
    }

    async fn patch(&self, id: i64, patch: &UpdatePatch) -> Result<u64> {
        let mut updates = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(title) = &patch.title {
            updates.push("title = ?");
            params.push(title.clone().into());
        }
        if let Some(url) = &patch.url {
            updates.push("url = ?");
            params.push(url.clone().into());
        }
        if let Some(description) = &patch.description {
            updates.push("description = ?");
            params.push(description.clone().into());
        }
        if let Some(rating) = patch.rating {
            updates.push("rating = ?");
            params.push(rating.into());
        }

        if updates.is_empty() {
            return Ok(0);
        }

        params.push(id.into());
        let query = format!("UPDATE bookmarks SET {} WHERE id = ?", updates.join(", "));

        Ok(self.conn.execute(&query, params).await?)
    }

    async fn delete(&self, id: i64) -> Result<u64> {
        let affected = self
            .conn
            .execute("DELETE FROM bookmarks WHERE id = ?", libsql::params![id])
            .await?;
        Ok(affected)
    }
}
