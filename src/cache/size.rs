//! Size Estimation Module
//!
//! Approximates how many bytes a cached value occupies.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;

/// Injectable value → byte size function. One per namespace.
pub type SizeEstimator = Arc<dyn Fn(&Value) -> Result<u64> + Send + Sync>;

// == JSON Size ==
/// Serializes the value to JSON and counts two bytes per UTF-16 code unit.
pub fn estimate_json_size(value: &Value) -> Result<u64> {
    let serialized = serde_json::to_string(value)?;
    Ok(serialized.encode_utf16().count() as u64 * 2)
}

/// Default estimator used when a namespace does not supply one.
pub fn json_size_estimator() -> SizeEstimator {
    Arc::new(estimate_json_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_size() {
        // "abc" serializes to 5 code units including quotes
        assert_eq!(estimate_json_size(&json!("abc")).unwrap(), 10);
    }

    #[test]
    fn test_object_size() {
        let value = json!({"text": "hello"});
        // {"text":"hello"} is 16 chars
        assert_eq!(estimate_json_size(&value).unwrap(), 32);
    }

    #[test]
    fn test_non_ascii_counts_code_units() {
        // "é" is one UTF-16 unit, "𝄞" is two
        assert_eq!(estimate_json_size(&json!("é")).unwrap(), 6);
        assert_eq!(estimate_json_size(&json!("𝄞")).unwrap(), 8);
    }

    #[test]
    fn test_estimator_is_callable_through_arc() {
        let estimator = json_size_estimator();
        assert_eq!(estimator(&json!(null)).unwrap(), 8);
    }
}
