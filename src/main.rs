//! Cache Check - exercises a Redis cache provider end to end
//!
//! Writes a heartbeat value through the provider, reads it back in both typed
//! and untyped form, then removes it.

use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redis_cache_provider::{CacheValue, Config, ExpirationPolicy, RedisCacheProvider};

const HEARTBEAT_KEY: &str = "cache_check:heartbeat";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Heartbeat {
    host: String,
    written_at: chrono::DateTime<chrono::Utc>,
}

impl CacheValue for Heartbeat {}

/// Main entry point for the cache check.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the provider (the connection opens on first use)
/// 4. Set, get and remove a heartbeat value
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redis_cache_provider=info,cache_check=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("loading configuration")?;
    info!(
        "Configuration loaded: endpoint={}, database={}, default_ttl={}s, absolute_mode={:?}",
        config.redis.host,
        config.database,
        config.default_ttl.as_secs(),
        config.absolute_expiration_mode
    );

    let provider = RedisCacheProvider::new(config)
        .context("creating provider")?
        .with_type::<Heartbeat>();
    provider.store().ping().await.context("pinging Redis")?;

    let heartbeat = Heartbeat {
        host: std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string()),
        written_at: chrono::Utc::now(),
    };
    provider
        .set(
            HEARTBEAT_KEY,
            &heartbeat,
            &ExpirationPolicy::relative(Duration::from_secs(30)),
        )
        .await
        .context("writing heartbeat value")?;

    let typed = provider
        .get_as::<Heartbeat>(HEARTBEAT_KEY)
        .await
        .context("reading heartbeat value")?;
    if typed.as_ref() != Some(&heartbeat) {
        bail!("heartbeat value did not round-trip: {:?}", typed);
    }

    match provider.get(HEARTBEAT_KEY).await? {
        Some(value) if value.downcast_ref::<Heartbeat>().is_some() => {
            info!("Untyped read rebuilt {}", Heartbeat::type_tag())
        }
        other => warn!("Untyped read returned {:?}", other.map(|_| "another type")),
    }

    provider.remove(HEARTBEAT_KEY).await.context("removing heartbeat value")?;
    info!("Cache check complete");
    Ok(())
}
