//! Cache Entry Module
//!
//! The entry descriptor handed to get-or-create factories.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::ExpirationPolicy;

// == Priority ==
/// Eviction priority a factory may declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePriority {
    Low,
    #[default]
    Normal,
    High,
    NeverRemove,
}

// == Cache Entry ==
/// Describes the entry a factory is about to populate.
///
/// The provider fills in the key and the default expiration before calling
/// the factory. Changes the factory makes are not read back: Redis entries
/// created through get-or-create always use the default policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub absolute_expiration: Option<DateTime<Utc>>,
    pub absolute_expiration_relative_to_now: Option<Duration>,
    pub sliding_expiration: Option<Duration>,
    pub priority: CachePriority,
    pub size: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry for `key` carrying the expiration of `policy`.
    pub fn new(key: impl Into<String>, policy: &ExpirationPolicy) -> Self {
        Self {
            key: key.into(),
            absolute_expiration: policy.absolute_expiration,
            absolute_expiration_relative_to_now: policy.absolute_expiration_relative_to_now,
            sliding_expiration: policy.sliding_expiration,
            ..Self::default()
        }
    }

    pub fn set_absolute_expiration(&mut self, at: DateTime<Utc>) -> &mut Self {
        self.absolute_expiration = Some(at);
        self
    }

    pub fn set_absolute_expiration_relative_to_now(&mut self, ttl: Duration) -> &mut Self {
        self.absolute_expiration_relative_to_now = Some(ttl);
        self
    }

    pub fn set_sliding_expiration(&mut self, ttl: Duration) -> &mut Self {
        self.sliding_expiration = Some(ttl);
        self
    }

    pub fn set_priority(&mut self, priority: CachePriority) -> &mut Self {
        self.priority = priority;
        self
    }

    pub fn set_size(&mut self, size: u64) -> &mut Self {
        self.size = Some(size);
        self
    }
}

impl fmt::Display for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_from_policy() {
        let policy = ExpirationPolicy::relative(Duration::from_secs(120));
        let entry = CacheEntry::new("user:1", &policy);

        assert_eq!(entry.key, "user:1");
        assert_eq!(
            entry.absolute_expiration_relative_to_now,
            Some(Duration::from_secs(120))
        );
        assert!(entry.absolute_expiration.is_none());
        assert!(entry.sliding_expiration.is_none());
        assert_eq!(entry.priority, CachePriority::Normal);
    }

    #[test]
    fn test_entry_setters_chain() {
        let mut entry = CacheEntry::new("k", &ExpirationPolicy::new());
        entry
            .set_sliding_expiration(Duration::from_secs(5))
            .set_priority(CachePriority::High)
            .set_size(3);

        assert_eq!(entry.sliding_expiration, Some(Duration::from_secs(5)));
        assert_eq!(entry.priority, CachePriority::High);
        assert_eq!(entry.size, Some(3));
    }

    #[test]
    fn test_entry_display_is_key() {
        let entry = CacheEntry::new("session:abc", &ExpirationPolicy::new());
        assert_eq!(entry.to_string(), "session:abc");
    }
}
