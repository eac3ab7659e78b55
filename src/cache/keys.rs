//! Cache Key Utilities
//!
//! Helpers callers use to build stable keys from business identifiers.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Separator placed between key parts.
pub const KEY_SEPARATOR: &str = ":";

// == Generate Cache Key ==
/// Joins parts with `:`, lower-cases, and replaces anything outside
/// `[a-z0-9:_-]` with `_`.
///
/// ```
/// use estate_cache::cache::generate_cache_key;
///
/// assert_eq!(generate_cache_key(["US-CA", "Simple Will"]), "us-ca:simple_will");
/// ```
pub fn generate_cache_key<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|part| part.as_ref().trim().to_lowercase())
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// == Hash Validation Data ==
/// Short SHA-256 digest of structured input, independent of object key order.
///
/// Returns the first 8 bytes of the digest, hex-encoded (16 characters).
pub fn hash_validation_data(data: &Value) -> String {
    let canonical = canonicalize(data).to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(&digest[..8])
}

/// Same as [`hash_validation_data`] for any serializable input.
pub fn hash_serializable<T: Serialize>(data: &T) -> Result<String> {
    Ok(hash_validation_data(&serde_json::to_value(data)?))
}

/// Rebuilds `value` with every object's keys in sorted order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
