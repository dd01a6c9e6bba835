//! Type Registry Module
//!
//! Maps envelope type tags back to concrete types for untyped reads.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::cache::CacheValue;
use crate::error::{CacheError, Result};

/// A decoded value whose concrete type is known only at runtime.
pub type AnyValue = Box<dyn Any + Send + Sync>;

type DecodeFn = fn(&str) -> Result<AnyValue>;

// == Type Registry ==
/// Known value types keyed by their type tag.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl TypeRegistry {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Registers `T` under its type tag. A later registration for the same
    /// tag replaces the earlier one.
    pub fn register<T: CacheValue>(&mut self) -> &mut Self {
        self.decoders.insert(T::type_tag().into_owned(), decode_into::<T>);
        self
    }

    /// Builder form of [`TypeRegistry::register`].
    pub fn with<T: CacheValue>(mut self) -> Self {
        self.register::<T>();
        self
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.decoders.contains_key(type_tag)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    // == Decode ==
    /// Deserializes `data` with the type registered for `type_tag`.
    pub fn decode(&self, type_tag: &str, data: &str) -> Result<AnyValue> {
        let decode = self.decoders.get(type_tag).ok_or_else(|| {
            CacheError::TypeMismatch(format!("no type registered for tag {}", type_tag))
        })?;
        decode(data)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.decoders.keys()).finish()
    }
}

fn decode_into<T: CacheValue>(data: &str) -> Result<AnyValue> {
    let value: T = serde_json::from_str(data).map_err(|e| {
        CacheError::TypeMismatch(format!(
            "payload does not parse as {}: {}",
            T::type_tag(),
            e
        ))
    })?;
    Ok(Box::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_decodes_registered_type() {
        let registry = TypeRegistry::new().with::<u64>().with::<String>();

        let value = registry.decode("u64", "17").unwrap();
        assert_eq!(value.downcast_ref::<u64>(), Some(&17));

        let value = registry.decode("String", "\"hi\"").unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("hi"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registry_unknown_tag() {
        let registry = TypeRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.decode("Missing", "1"),
            Err(CacheError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_registry_unparseable_payload() {
        let registry = TypeRegistry::new().with::<u64>();
        assert!(registry.contains("u64"));
        assert!(matches!(
            registry.decode("u64", "\"text\""),
            Err(CacheError::TypeMismatch(_))
        ));
    }
}
