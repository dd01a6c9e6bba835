//! Redis Store Module
//!
//! Redis-backed store. The multiplexed connection is opened on first use and
//! shared by every operation of the owning store.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, ErrorKind, RedisResult};
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::store::{ttl_ms, RemoteStore};

// == Redis Store ==
pub struct RedisStore {
    client: Client,
    connection: OnceCell<MultiplexedConnection>,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl RedisStore {
    // == Constructor ==
    /// Creates a store for the configured server and database.
    ///
    /// No connection is attempted here; the first operation connects.
    pub fn new(config: &Config) -> Result<Self> {
        let url = config.redis.connection_url(config.database)?;
        let client = Client::open(url.as_str())?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            connect_timeout: config.redis.connect_timeout(),
            response_timeout: config.redis.response_timeout(),
        })
    }

    /// Whether the connection has been established yet.
    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    // == Connection ==
    async fn connection(&self) -> Result<MultiplexedConnection> {
        let connection = self
            .connection
            .get_or_try_init(|| async {
                debug!("Connecting to Redis");
                let connection =
                    timeout(self.connect_timeout, self.client.get_multiplexed_async_connection())
                        .await
                        .map_err(|_| {
                            CacheError::Connection(format!(
                                "connect timed out after {} ms",
                                self.connect_timeout.as_millis()
                            ))
                        })??;
                info!("Redis connection established");
                Ok::<_, CacheError>(connection)
            })
            .await?;

        Ok(connection.clone())
    }

    async fn run<T>(&self, command: &str, op: impl Future<Output = RedisResult<T>>) -> Result<T> {
        match timeout(self.response_timeout, op).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CacheError::Connection(format!(
                "{} timed out after {} ms",
                command,
                self.response_timeout.as_millis()
            ))),
        }
    }

    // == Ping ==
    /// Round-trips a PING, connecting first if needed.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        self.run("PING", redis::cmd("PING").query_async::<()>(&mut conn))
            .await
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = self
            .run("GET", conn.get(key))
            .await
            .map_err(corrupt_on_type_error)?;
        Ok(value)
    }

    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = self
            .run("SET", conn.pset_ex(key, value, ttl_ms(ttl)))
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let removed: i64 = self.run("DEL", conn.del(key)).await?;
        Ok(removed > 0)
    }
}

/// A stored value that is not valid UTF-8 fails conversion with a type
/// error; that is unreadable stored data rather than a store failure.
fn corrupt_on_type_error(err: CacheError) -> CacheError {
    match err {
        CacheError::Store(e) if e.kind() == ErrorKind::TypeError => {
            CacheError::CorruptData(e.to_string())
        }
        other => other,
    }
}
