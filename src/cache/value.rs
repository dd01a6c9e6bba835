//! Cacheable Value Module
//!
//! Values stored through the provider carry a type tag so that they can be
//! rebuilt without the caller naming the type on read.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde::{de::DeserializeOwned, Serialize};

// == Cache Value ==
/// A value that can be stored in the remote cache.
///
/// `type_tag` defaults to the unqualified Rust type name (`TestModel`,
/// `Vec<String>`). Override it to pin a stable, versioned identifier that
/// survives renames and module moves:
///
/// ```ignore
/// impl CacheValue for Order {
///     fn type_tag() -> Cow<'static, str> {
///         Cow::Borrowed("order.v2")
///     }
/// }
/// ```
pub trait CacheValue: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identifier recorded in the envelope alongside the payload.
    fn type_tag() -> Cow<'static, str> {
        Cow::Owned(short_type_name(std::any::type_name::<Self>()))
    }
}

macro_rules! impl_cache_value {
    ($($ty:ty),* $(,)?) => {
        $(impl CacheValue for $ty {})*
    };
}

impl_cache_value!(
    String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32,
    f64, serde_json::Value,
);

impl<T: CacheValue> CacheValue for Vec<T> {}

/// `None` is the absent value and is never stored, so `Some(v)` is recorded
/// under the tag of `v` itself.
impl<T: CacheValue> CacheValue for Option<T> {
    fn type_tag() -> Cow<'static, str> {
        T::type_tag()
    }
}

impl<V: CacheValue> CacheValue for HashMap<String, V> {}
impl<V: CacheValue> CacheValue for BTreeMap<String, V> {}

// == Type Names ==
/// Strips module paths from every path segment of a Rust type name.
///
/// `alloc::vec::Vec<my_app::models::User>` becomes `Vec<User>`.
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();

    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            segment.push(c);
        } else {
            out.push_str(last_path_segment(&segment));
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(last_path_segment(&segment));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
