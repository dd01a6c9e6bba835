//! Expiration Policy Module
//!
//! Reduces a cache-entry expiration policy to the single TTL Redis accepts.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::CacheError;

// == Absolute Expiration Mode ==
/// How an absolute expiration instant becomes a TTL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AbsoluteExpirationMode {
    /// `target - now`: the time left until the instant
    #[default]
    Remaining,
    /// `now - target`: the historical computation, kept for deployments that
    /// depend on it. Future instants yield a negative TTL and expire at once.
    Legacy,
}

impl FromStr for AbsoluteExpirationMode {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remaining" => Ok(Self::Remaining),
            "legacy" => Ok(Self::Legacy),
            other => Err(CacheError::InvalidConfiguration(format!(
                "unknown absolute expiration mode '{}'",
                other
            ))),
        }
    }
}

// == Expiration Policy ==
/// Caller-supplied expiration settings for a write.
///
/// Sliding expiration is accepted but never re-armed on reads; it acts as a
/// one-shot TTL, the same as a relative expiration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpirationPolicy {
    pub absolute_expiration: Option<DateTime<Utc>>,
    pub absolute_expiration_relative_to_now: Option<Duration>,
    pub sliding_expiration: Option<Duration>,
}

impl ExpirationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expires at a fixed instant.
    pub fn absolute(at: DateTime<Utc>) -> Self {
        Self::new().with_absolute_expiration(at)
    }

    /// Expires after `ttl` from the write.
    pub fn relative(ttl: Duration) -> Self {
        Self::new().with_absolute_expiration_relative_to_now(ttl)
    }

    /// Expires after `ttl` from the write (not re-armed on access).
    pub fn sliding(ttl: Duration) -> Self {
        Self::new().with_sliding_expiration(ttl)
    }

    pub fn with_absolute_expiration(mut self, at: DateTime<Utc>) -> Self {
        self.absolute_expiration = Some(at);
        self
    }

    pub fn with_absolute_expiration_relative_to_now(mut self, ttl: Duration) -> Self {
        self.absolute_expiration_relative_to_now = Some(ttl);
        self
    }

    pub fn with_sliding_expiration(mut self, ttl: Duration) -> Self {
        self.sliding_expiration = Some(ttl);
        self
    }

    /// True when no field is set and the default TTL applies.
    pub fn is_empty(&self) -> bool {
        self.absolute_expiration.is_none()
            && self.absolute_expiration_relative_to_now.is_none()
            && self.sliding_expiration.is_none()
    }

    // == TTL ==
    /// Computes the TTL for a write happening at `now`.
    ///
    /// Fields are applied in order and the last one set wins: default,
    /// absolute, relative, sliding. The result may be zero or negative when
    /// an absolute instant has already passed.
    pub fn ttl(
        &self,
        now: DateTime<Utc>,
        default_ttl: Duration,
        mode: AbsoluteExpirationMode,
    ) -> TimeDelta {
        let mut ttl = to_delta(default_ttl);

        if let Some(at) = self.absolute_expiration {
            ttl = match mode {
                AbsoluteExpirationMode::Remaining => at - now,
                AbsoluteExpirationMode::Legacy => now - at,
            };
        }
        if let Some(relative) = self.absolute_expiration_relative_to_now {
            ttl = to_delta(relative);
        }
        if let Some(sliding) = self.sliding_expiration {
            ttl = to_delta(sliding);
        }

        ttl
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_TTL: Duration = Duration::from_secs(120);

    fn ttl_of(policy: &ExpirationPolicy) -> TimeDelta {
        policy.ttl(Utc::now(), DEFAULT_TTL, AbsoluteExpirationMode::Remaining)
    }

    #[test]
    fn test_empty_policy_uses_default() {
        let policy = ExpirationPolicy::new();
        assert!(policy.is_empty());
        assert_eq!(ttl_of(&policy), TimeDelta::seconds(120));
    }

    #[test]
    fn test_relative_expiration() {
        let policy = ExpirationPolicy::relative(Duration::from_secs(30));
        assert_eq!(ttl_of(&policy), TimeDelta::seconds(30));
    }

    #[test]
    fn test_sliding_expiration_is_one_shot() {
        let policy = ExpirationPolicy::sliding(Duration::from_secs(10));
        assert_eq!(ttl_of(&policy), TimeDelta::seconds(10));
    }

    #[test]
    fn test_absolute_expiration_remaining() {
        let now = Utc::now();
        let policy = ExpirationPolicy::absolute(now + TimeDelta::seconds(5));

        let ttl = policy.ttl(now, DEFAULT_TTL, AbsoluteExpirationMode::Remaining);
        assert_eq!(ttl, TimeDelta::seconds(5));
    }

    #[test]
    fn test_absolute_expiration_legacy() {
        let now = Utc::now();
        let policy = ExpirationPolicy::absolute(now + TimeDelta::seconds(5));

        let ttl = policy.ttl(now, DEFAULT_TTL, AbsoluteExpirationMode::Legacy);
        assert_eq!(ttl, TimeDelta::seconds(-5));
    }

    #[test]
    fn test_absolute_expiration_in_past() {
        let now = Utc::now();
        let policy = ExpirationPolicy::absolute(now - TimeDelta::seconds(1));

        let ttl = policy.ttl(now, DEFAULT_TTL, AbsoluteExpirationMode::Remaining);
        assert!(ttl < TimeDelta::zero());
    }

    #[test]
    fn test_last_set_field_wins() {
        let now = Utc::now();
        let policy = ExpirationPolicy::absolute(now + TimeDelta::seconds(500))
            .with_absolute_expiration_relative_to_now(Duration::from_secs(30))
            .with_sliding_expiration(Duration::from_secs(10));
        assert_eq!(
            policy.ttl(now, DEFAULT_TTL, AbsoluteExpirationMode::Remaining),
            TimeDelta::seconds(10)
        );

        let policy = ExpirationPolicy::absolute(now + TimeDelta::seconds(500))
            .with_absolute_expiration_relative_to_now(Duration::from_secs(30));
        assert_eq!(
            policy.ttl(now, DEFAULT_TTL, AbsoluteExpirationMode::Remaining),
            TimeDelta::seconds(30)
        );
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(
            "Legacy".parse::<AbsoluteExpirationMode>().unwrap(),
            AbsoluteExpirationMode::Legacy
        );
        assert_eq!(
            "remaining".parse::<AbsoluteExpirationMode>().unwrap(),
            AbsoluteExpirationMode::Remaining
        );
        assert!("sideways".parse::<AbsoluteExpirationMode>().is_err());
    }
}
