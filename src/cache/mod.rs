//! Cache Module
//!
//! Envelope codec, expiration policy translation and the entry descriptor
//! shared by the provider and its stores.

mod entry;
mod envelope;
mod policy;
mod registry;
mod value;


// Re-export public types
pub use entry::{CacheEntry, CachePriority};
pub use envelope::DataEntry;
pub use policy::{AbsoluteExpirationMode, ExpirationPolicy};
pub use registry::{AnyValue, TypeRegistry};
pub use value::{short_type_name, CacheValue};
