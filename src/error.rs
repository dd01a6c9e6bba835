//! Error types for the cache provider
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache provider.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A value was required but absent (serializes to null)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Stored text is not a well-formed envelope
    #[error("Corrupt data: {0}")]
    CorruptData(String),

    /// The recorded or requested type cannot parse the payload
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Configuration string or environment value could not be understood
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Connection could not be established or an operation timed out
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error reported by the Redis client
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),
}

// == Result Type Alias ==
/// Convenience Result type for the cache provider.
pub type Result<T> = std::result::Result<T, CacheError>;
