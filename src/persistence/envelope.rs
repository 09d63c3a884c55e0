//! Versioned JSON envelope
//!
//! Values are written as `{"version": 1, "data": ...}`. Anything without
//! that shape is read as a legacy bare value.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::PersistError;

/// Current on-disk format
pub const FORMAT_VERSION: u64 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u64,
    data: T,
}

/// Wrap `value` in the current envelope
pub fn encode<T: Serialize>(key: &str, value: &T) -> Result<String, PersistError> {
    serde_json::to_string(&Envelope {
        version: FORMAT_VERSION,
        data: value,
    })
    .map_err(|e| PersistError::Malformed {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Unwrap an envelope (or a legacy bare value) into `T`
pub fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, PersistError> {
    let malformed = |e: serde_json::Error| PersistError::Malformed {
        key: key.to_string(),
        reason: e.to_string(),
    };

    let value: Value = serde_json::from_str(raw).map_err(malformed)?;
    let payload = match value {
        Value::Object(mut map) if is_envelope(&map) => {
            let version = map.get("version").and_then(Value::as_u64);
            match version {
                Some(FORMAT_VERSION) => map.remove("data").unwrap_or(Value::Null),
                other => {
                    return Err(PersistError::UnsupportedVersion {
                        key: key.to_string(),
                        version: other.unwrap_or(0),
                    });
                }
            }
        }
        legacy => legacy,
    };
    serde_json::from_value(payload).map_err(malformed)
}

fn is_envelope(map: &serde_json::Map<String, Value>) -> bool {
    map.len() == 2 && map.contains_key("version") && map.contains_key("data")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Samples {
        samples: Vec<u32>,
    }

    #[test]
    fn test_envelope() {
        let raw = encode("k", &3usize).unwrap();
        assert_eq!(raw, r#"{"version":1,"data":3}"#);
        assert_eq!(decode::<usize>("k", &raw).unwrap(), 3);
    }

    #[test]
    fn test_legacy_bare_values() {
        // Older saves wrote plain JSON
        assert_eq!(decode::<usize>("k", "2").unwrap(), 2);
        assert_eq!(decode::<Vec<usize>>("k", "[0,1]").unwrap(), vec![0, 1]);
        assert_eq!(
            decode::<Samples>("k", r#"{"samples":[1,2]}"#).unwrap(),
            Samples { samples: vec![1, 2] }
        );
    }

    #[test]
    fn test_future_version_rejected() {
        let err = decode::<usize>("k", r#"{"version":2,"data":3}"#).unwrap_err();
        assert_eq!(
            err,
            PersistError::UnsupportedVersion {
                key: "k".into(),
                version: 2
            }
        );
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        assert!(matches!(
            decode::<usize>("k", r#"{"version":1,"data":"three"}"#),
            Err(PersistError::Malformed { .. })
        ));
        assert!(matches!(
            decode::<usize>("k", ""),
            Err(PersistError::Malformed { .. })
        ));
    }
}
