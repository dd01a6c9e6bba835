//! Store Module
//!
//! The remote key-value surface the provider writes envelopes to.
//!
//! # Backends
//! - `RedisStore`: Redis over a lazily established multiplexed connection
//! - `MemoryStore`: in-process map with TTL expiry, for tests and local runs

mod memory;
mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

// == Remote Store ==
/// String key/value store with server-side TTL.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Returns the string stored at `key`, or `None` when absent.
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` at `key`, replacing any existing record, expiring after `ttl`.
    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Deletes `key`. Returns whether a record was removed.
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// TTL in whole milliseconds, rounding sub-millisecond remainders up.
pub(crate) fn ttl_ms(ttl: Duration) -> u64 {
    let ms = ttl.as_millis();
    let ms = if ttl.subsec_nanos() % 1_000_000 != 0 { ms + 1 } else { ms };
    u64::try_from(ms).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_ms_rounds_up() {
        assert_eq!(ttl_ms(Duration::from_secs(2)), 2000);
        assert_eq!(ttl_ms(Duration::from_micros(1500)), 2);
        assert_eq!(ttl_ms(Duration::from_nanos(1)), 1);
    }
}
