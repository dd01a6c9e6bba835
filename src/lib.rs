//! Redis Cache Provider - cache storage backed by Redis
//!
//! Stores values as typed JSON envelopes and turns cache expiration
//! policies into Redis TTLs.

pub mod cache;
pub mod config;
pub mod error;
pub mod provider;
pub mod store;

pub use cache::{CacheEntry, CacheValue, DataEntry, ExpirationPolicy};
pub use config::{Config, RedisConfiguration};
pub use error::{CacheError, Result};
pub use provider::RedisCacheProvider;
pub use store::{MemoryStore, RedisStore, RemoteStore};
