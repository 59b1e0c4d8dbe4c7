use async_trait::async_trait;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::models::{AccountId, CacheLink, SeenRecord};
use crate::storage::Storage;

/// SQLite-backed seen-set. A single connection behind a mutex serializes
/// every read and write, which is enough for one pipeline per location.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open SQLite database {}", db_path.display()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("SQLite connection lock poisoned"))
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn migrate(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                userid VARCHAR(36),
                url VARCHAR(256),
                title VARCHAR(256)
            )",
            [],
        )?;

        // Lookups are always by (userid, url); not unique on purpose.
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_notifications_user_url ON notifications(userid, url)",
            [],
        )?;

        info!("Database migration completed");
        Ok(())
    }

    async fn has_seen(&self, account: &AccountId, link: &CacheLink) -> Result<bool> {
        let conn = self.conn()?;

        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM notifications WHERE userid = ?1 AND url = ?2 LIMIT 1",
                params![&account.0, link.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(id.is_some())
    }

    async fn record_seen(&self, record: &SeenRecord) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO notifications (url, title, userid) VALUES (?1, ?2, ?3)",
            params![record.link.as_str(), &record.title, &record.account_id.0],
        )?;

        debug!("Recorded {} for account {}", record.link, record.account_id);
        Ok(())
    }

    async fn seen_records(&self, account: &AccountId) -> Result<Vec<SeenRecord>> {
        let conn = self.conn()?;

        let mut stmt =
            conn.prepare("SELECT userid, url, title FROM notifications WHERE userid = ?1 ORDER BY id")?;
        let records = stmt
            .query_map(params![&account.0], |row| {
                Ok(SeenRecord {
                    account_id: AccountId(row.get(0)?),
                    link: CacheLink(row.get(1)?),
                    title: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }
}
