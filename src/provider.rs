//! Cache Provider Module
//!
//! Composes the envelope codec, the policy translation and a remote store
//! into the get/set/get-or-create surface of a cache storage provider.
//!
//! There is no per-key locking. Concurrent get-or-create calls on a missing
//! key may each run their factory, and the last write wins.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::cache::{
    AbsoluteExpirationMode, AnyValue, CacheEntry, CacheValue, DataEntry, ExpirationPolicy,
    TypeRegistry,
};
use crate::config::Config;
use crate::error::Result;
use crate::store::{RedisStore, RemoteStore};

// == Redis Cache Provider ==
/// Cache storage provider writing typed envelopes to a remote store.
pub struct RedisCacheProvider<S: RemoteStore = RedisStore> {
    store: S,
    registry: TypeRegistry,
    default_ttl: Duration,
    absolute_expiration_mode: AbsoluteExpirationMode,
}

impl RedisCacheProvider<RedisStore> {
    // == Constructor ==
    /// Creates a provider for the configured Redis server.
    ///
    /// The connection is opened lazily by the first operation.
    pub fn new(config: Config) -> Result<Self> {
        let store = RedisStore::new(&config)?;
        Self::with_store(store, &config)
    }
}

impl<S: RemoteStore> RedisCacheProvider<S> {
    /// Creates a provider over an arbitrary store.
    ///
    /// Fails with `InvalidConfiguration` if `config` does not validate.
    pub fn with_store(store: S, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            registry: TypeRegistry::new(),
            default_ttl: config.default_ttl,
            absolute_expiration_mode: config.absolute_expiration_mode,
        })
    }

    /// Makes `T` decodable by the untyped [`get`](Self::get).
    pub fn register<T: CacheValue>(&mut self) -> &mut Self {
        self.registry.register::<T>();
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_type<T: CacheValue>(mut self) -> Self {
        self.register::<T>();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Policy applied to entries created through get-or-create.
    pub fn default_policy(&self) -> ExpirationPolicy {
        ExpirationPolicy::relative(self.default_ttl)
    }

    // == Get ==
    /// Reads `key` and rebuilds the value from its recorded type.
    ///
    /// The recorded type must have been registered with this provider.
    pub async fn get(&self, key: &str) -> Result<Option<AnyValue>> {
        match self.read_entry(key).await? {
            Some(entry) => Ok(Some(entry.decode(&self.registry)?)),
            None => Ok(None),
        }
    }

    /// Reads `key` as `T`, ignoring the recorded type.
    pub async fn get_as<T: CacheValue>(&self, key: &str) -> Result<Option<T>> {
        match self.read_entry(key).await? {
            Some(entry) => Ok(Some(entry.decode_as::<T>()?)),
            None => Ok(None),
        }
    }

    // == Set ==
    /// Stores `value` at `key`, replacing any existing record.
    ///
    /// An absent value (one that serializes to `null`) is a no-op.
    pub async fn set<T: CacheValue>(
        &self,
        key: &str,
        value: &T,
        policy: &ExpirationPolicy,
    ) -> Result<()> {
        self.write_entry(key, value, policy).await
    }

    // == Get Or Create ==
    /// Returns the value at `key`, or stores and returns the factory's value.
    ///
    /// The factory receives an entry descriptor carrying the default
    /// expiration. Whatever it sets there is ignored; the default policy is
    /// always used for the write.
    pub async fn get_or_create<T, F>(&self, key: &str, factory: F) -> Result<T>
    where
        T: CacheValue,
        F: FnOnce(&mut CacheEntry) -> T,
    {
        if let Some(entry) = self.read_entry(key).await? {
            return entry.decode_as::<T>();
        }

        let policy = self.default_policy();
        let mut descriptor = CacheEntry::new(key, &policy);
        let value = factory(&mut descriptor);

        self.write_entry(key, &value, &policy).await?;
        debug!("Populated {} from factory", key);
        Ok(value)
    }

    /// [`get_or_create`](Self::get_or_create) with an asynchronous factory.
    pub async fn get_or_create_async<T, F, Fut>(&self, key: &str, factory: F) -> Result<T>
    where
        T: CacheValue,
        F: FnOnce(&mut CacheEntry) -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(entry) = self.read_entry(key).await? {
            return entry.decode_as::<T>();
        }

        let policy = self.default_policy();
        let mut descriptor = CacheEntry::new(key, &policy);
        let value = factory(&mut descriptor).await;

        self.write_entry(key, &value, &policy).await?;
        debug!("Populated {} from async factory", key);
        Ok(value)
    }

    // == Remove ==
    /// Deletes `key`. A missing key is not an error.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let removed = self.store.delete(key).await?;
        debug!("Remove {}: existed={}", key, removed);
        Ok(())
    }

    // == Internals ==
    async fn read_entry(&self, key: &str) -> Result<Option<DataEntry>> {
        match self.store.get_string(key).await? {
            Some(text) if !text.is_empty() => Ok(Some(DataEntry::from_text(&text)?)),
            _ => {
                debug!("Cache miss for {}", key);
                Ok(None)
            }
        }
    }

    /// Encodes and writes `value`. An absent value writes nothing.
    async fn write_entry<T: CacheValue>(
        &self,
        key: &str,
        value: &T,
        policy: &ExpirationPolicy,
    ) -> Result<()> {
        let Some(entry) = DataEntry::try_encode(value)? else {
            debug!("Skipping write of absent {} value to {}", T::type_tag(), key);
            return Ok(());
        };
        let text = entry.to_text()?;

        let ttl = policy.ttl(Utc::now(), self.default_ttl, self.absolute_expiration_mode);
        match ttl.to_std() {
            Ok(ttl) if !ttl.is_zero() => {
                self.store.set_string(key, &text, ttl).await?;
                debug!("Stored {} as {} with ttl {:?}", key, entry.type_tag(), ttl);
            }
            _ => {
                // Redis rejects non-positive expirations; an entry that is
                // already expired is the same as no entry.
                self.store.delete(key).await?;
                debug!("Entry {} expired on write (ttl {})", key, ttl);
            }
        }

        Ok(())
    }
}
