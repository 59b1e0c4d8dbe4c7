use async_trait::async_trait;
use anyhow::Result;
use crate::models::{AccountId, CacheLink, SeenRecord};

mod sqlite;
pub use sqlite::SqliteStorage;

/// The seen-set: which caches each account was already notified about.
///
/// Records are append-only. Nothing here enforces uniqueness; callers check
/// `has_seen` before recording.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn migrate(&self) -> Result<()>;
    async fn has_seen(&self, account: &AccountId, link: &CacheLink) -> Result<bool>;
    async fn record_seen(&self, record: &SeenRecord) -> Result<()>;
    async fn seen_records(&self, account: &AccountId) -> Result<Vec<SeenRecord>>;
}
