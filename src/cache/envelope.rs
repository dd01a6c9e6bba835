//! Data Entry Module
//!
//! Redis only stores strings, so every value is wrapped in an envelope that
//! records the type it was serialized from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cache::{AnyValue, CacheValue, TypeRegistry};
use crate::error::{CacheError, Result};

// == Data Entry ==
/// A serialized value paired with the tag of its original type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEntry {
    /// Tag of the type `data` was serialized from
    #[serde(rename = "type")]
    type_tag: String,
    /// JSON text of the value
    data: String,
}

impl DataEntry {
    // == Encode ==
    /// Serializes `value` and records its type tag.
    ///
    /// Values that serialize to JSON `null` (such as `None`) are rejected
    /// with `InvalidArgument`.
    pub fn encode<T: CacheValue>(value: &T) -> Result<Self> {
        Self::try_encode(value)?.ok_or_else(|| {
            CacheError::InvalidArgument(format!("value of type {} is absent", T::type_tag()))
        })
    }

    /// Like [`DataEntry::encode`], but an absent value yields `Ok(None)`.
    pub fn try_encode<T: CacheValue>(value: &T) -> Result<Option<Self>> {
        let json = serde_json::to_value(value).map_err(|e| {
            CacheError::InvalidArgument(format!("cannot serialize {}: {}", T::type_tag(), e))
        })?;

        if json.is_null() {
            return Ok(None);
        }

        Ok(Some(Self {
            type_tag: T::type_tag().into_owned(),
            data: json.to_string(),
        }))
    }

    /// Wraps already-serialized JSON text under the given tag.
    pub fn from_parts(data: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            data: data.into(),
        }
    }

    // == Accessors ==
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    // == Envelope Text ==
    /// Serializes the envelope itself for storage.
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| CacheError::CorruptData(format!("cannot encode envelope: {}", e)))
    }

    /// Parses envelope text read from the store.
    pub fn from_text(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| CacheError::CorruptData(format!("malformed envelope: {}", e)))
    }

    // == Decode ==
    /// Deserializes the payload as `T`, regardless of the recorded tag.
    pub fn decode_as<T: CacheValue>(&self) -> Result<T> {
        let requested = T::type_tag();
        if requested.as_ref() != self.type_tag.as_str() {
            tracing::debug!("Decoding {} entry as {}", self.type_tag, requested);
        }

        serde_json::from_str(&self.data).map_err(|e| {
            CacheError::TypeMismatch(format!(
                "payload recorded as {} does not parse as {}: {}",
                self.type_tag, requested, e
            ))
        })
    }

    /// Deserializes the payload using the type registered for the recorded tag.
    pub fn decode(&self, registry: &TypeRegistry) -> Result<AnyValue> {
        registry.decode(&self.type_tag, &self.data)
    }
}

impl fmt::Display for DataEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.type_tag, self.data)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestModel {
        id: u32,
        name: String,
        description: String,
    }

    impl CacheValue for TestModel {}

    fn test_model() -> TestModel {
        TestModel {
            id: 1,
            name: "Test".to_string(),
            description: "Test Description".to_string(),
        }
    }

    #[test]
    fn test_encode_records_type() {
        let entry = DataEntry::encode(&test_model()).unwrap();

        assert_eq!(entry.type_tag(), "TestModel");
        assert!(!entry.data().is_empty());
        assert!(entry.data().contains("\"name\":\"Test\""));
    }

    #[test]
    fn test_pre_serialized_entry() {
        let json = serde_json::to_string(&test_model()).unwrap();
        let entry = DataEntry::from_parts(json.clone(), "TestModel");

        assert_eq!(entry.type_tag(), "TestModel");
        assert_eq!(entry.data(), json);
        assert_eq!(entry.decode_as::<TestModel>().unwrap(), test_model());
    }

    #[test]
    fn test_encode_absent_value() {
        let result = DataEntry::encode(&None::<TestModel>);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
        assert!(DataEntry::try_encode(&None::<TestModel>).unwrap().is_none());
    }

    #[test]
    fn test_envelope_text_format() {
        let entry = DataEntry::from_parts("42", "i32");
        assert_eq!(entry.to_text().unwrap(), r#"{"type":"i32","data":"42"}"#);
    }

    #[test]
    fn test_envelope_text_roundtrip() {
        let entry = DataEntry::encode(&test_model()).unwrap();
        let text = entry.to_text().unwrap();

        assert_eq!(DataEntry::from_text(&text).unwrap(), entry);
    }

    #[test]
    fn test_malformed_envelope() {
        for text in ["not json", "{}", r#"{"type":"i32"}"#, r#"{"type":1,"data":"1"}"#] {
            assert!(
                matches!(DataEntry::from_text(text), Err(CacheError::CorruptData(_))),
                "{} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_decode_as_mismatch() {
        let entry = DataEntry::encode(&"hello".to_string()).unwrap();
        let result = entry.decode_as::<TestModel>();
        assert!(matches!(result, Err(CacheError::TypeMismatch(_))));
    }

    #[test]
    fn test_decode_with_registry() {
        let mut registry = TypeRegistry::new();
        registry.register::<TestModel>();

        let entry = DataEntry::encode(&test_model()).unwrap();
        let value = entry.decode(&registry).unwrap();

        assert_eq!(value.downcast_ref::<TestModel>(), Some(&test_model()));
    }

    #[test]
    fn test_display() {
        let entry = DataEntry::from_parts("true", "bool");
        assert_eq!(entry.to_string(), "bool => true");
    }
}
