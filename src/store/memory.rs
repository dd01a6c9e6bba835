//! Memory Store Module
//!
//! HashMap-backed store with lazy TTL expiration.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::store::{ttl_ms, RemoteStore};

// == Stored Record ==
#[derive(Debug, Clone)]
struct StoredRecord {
    value: String,
    /// Expiration timestamp (Unix milliseconds)
    expires_at: u64,
}

impl StoredRecord {
    /// Expired once the current time reaches the expiration time.
    fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

// == Memory Store ==
/// In-process store honoring TTLs the way Redis does: expired records are
/// invisible and removed when next touched.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a raw string without going through the envelope codec.
    pub async fn insert_raw(&self, key: &str, value: &str, ttl: Duration) {
        let record = StoredRecord {
            value: value.to_string(),
            expires_at: current_timestamp_ms().saturating_add(ttl_ms(ttl)),
        };
        self.records.write().await.insert(key.to_string(), record);
    }

    /// Remaining TTL of a live record, or None if absent or expired.
    pub async fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = current_timestamp_ms();
        let records = self.records.read().await;
        records
            .get(key)
            .filter(|record| !record.is_expired(now))
            .map(|record| Duration::from_millis(record.expires_at - now))
    }

    /// Number of live records.
    pub async fn len(&self) -> usize {
        let now = current_timestamp_ms();
        self.records
            .read()
            .await
            .values()
            .filter(|record| !record.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let now = current_timestamp_ms();
        let mut records = self.records.write().await;

        let expired = match records.get(key) {
            Some(record) if !record.is_expired(now) => return Ok(Some(record.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            records.remove(key);
        }
        Ok(None)
    }

    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.insert_raw(key, value, ttl).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = current_timestamp_ms();
        let removed = self.records.write().await.remove(key);
        Ok(removed.is_some_and(|record| !record.is_expired(now)))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
