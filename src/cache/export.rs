//! Export Format
//!
//! The interchange layer for `export`/`import`: a JSON array of
//! `[key, {"value": ..., "expire": ...}]` pairs where `expire` is an epoch
//! millisecond timestamp or the string `"NaN"` for entries that never expire.

use std::fmt;

use serde::de::{self, DeserializeOwned, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{CacheError, Result};

/// Marker written in place of a timestamp for non-expiring entries.
pub const NEVER_EXPIRES: &str = "NaN";

// == Expire Stamp ==
/// Absolute expiry as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpireStamp(pub Option<i64>);

impl Serialize for ExpireStamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Some(at) => serializer.serialize_i64(at),
            None => serializer.serialize_str(NEVER_EXPIRES),
        }
    }
}

impl<'de> Deserialize<'de> for ExpireStamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(StampVisitor)
    }
}

struct StampVisitor;

impl<'de> Visitor<'de> for StampVisitor {
    type Value = ExpireStamp;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an epoch-millisecond number or \"{}\"", NEVER_EXPIRES)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
        Ok(ExpireStamp(Some(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
        i64::try_from(v)
            .map(|v| ExpireStamp(Some(v)))
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
        if v.is_finite() {
            Ok(ExpireStamp(Some(v as i64)))
        } else {
            Ok(ExpireStamp(None))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        if v == NEVER_EXPIRES {
            Ok(ExpireStamp(None))
        } else {
            Err(E::invalid_value(Unexpected::Str(v), &self))
        }
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(ExpireStamp(None))
    }
}

// == Exported Record ==
/// One serialized entry. `T` is `&V` when exporting and `V` when importing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedRecord<T> {
    pub value: T,
    pub expire: ExpireStamp,
}

// == Encode ==
/// Serializes `(key, record)` rows into the export text.
pub fn encode<V: Serialize>(rows: &[(&str, ExportedRecord<&V>)]) -> Result<String> {
    Ok(serde_json::to_string(rows)?)
}

// == Decode ==
/// Parses an export document completely before anything is applied.
///
/// A row with a key but no record is `MissingRecord`; any other structural
/// problem is `InvalidImport`.
pub fn decode<V: DeserializeOwned>(text: &str) -> Result<Vec<(String, ExportedRecord<V>)>> {
    let document: Value = serde_json::from_str(text)?;
    let Value::Array(rows) = document else {
        return Err(CacheError::InvalidImport(
            "expected a JSON array of [key, record] pairs".to_string(),
        ));
    };

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            let Value::Array(parts) = row else {
                return Err(CacheError::InvalidImport(format!(
                    "row {} is not a [key, record] pair",
                    index
                )));
            };
            let mut parts = parts.into_iter();
            let key = match parts.next() {
                Some(Value::String(key)) => key,
                _ => {
                    return Err(CacheError::InvalidImport(format!(
                        "row {} has no string key",
                        index
                    )))
                }
            };
            match parts.next() {
                None | Some(Value::Null) => Err(CacheError::MissingRecord(key)),
                Some(record) => Ok((key, serde_json::from_value(record)?)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_shape() {
        let value = 42;
        let rows = vec![
            (
                "a",
                ExportedRecord {
                    value: &value,
                    expire: ExpireStamp(Some(1_700_000_000_000)),
                },
            ),
            (
                "b",
                ExportedRecord {
                    value: &value,
                    expire: ExpireStamp(None),
                },
            ),
        ];

        let text = encode(&rows).unwrap();
        assert_eq!(
            text,
            r#"[["a",{"value":42,"expire":1700000000000}],["b",{"value":42,"expire":"NaN"}]]"#
        );
    }

    #[test]
    fn test_decode_rows() {
        let text = r#"[["a",{"value":"x","expire":1000}],["b",{"value":"y","expire":"NaN"}]]"#;
        let rows: Vec<(String, ExportedRecord<String>)> = decode(text).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "a");
        assert_eq!(rows[0].1.value, "x");
        assert_eq!(rows[0].1.expire, ExpireStamp(Some(1000)));
        assert_eq!(rows[1].1.expire, ExpireStamp(None));
    }

    #[test]
    fn test_decode_float_timestamp() {
        let rows: Vec<(String, ExportedRecord<u32>)> =
            decode(r#"[["k",{"value":1,"expire":1500.0}]]"#).unwrap();
        assert_eq!(rows[0].1.expire, ExpireStamp(Some(1500)));
    }

    #[test]
    fn test_decode_missing_record() {
        let result = decode::<u32>(r#"[["orphan"]]"#);
        assert!(matches!(result, Err(CacheError::MissingRecord(key)) if key == "orphan"));

        let result = decode::<u32>(r#"[["orphan", null]]"#);
        assert!(matches!(result, Err(CacheError::MissingRecord(_))));
    }

    #[test]
    fn test_decode_malformed_document() {
        assert!(matches!(
            decode::<u32>(r#"{"a":1}"#),
            Err(CacheError::InvalidImport(_))
        ));
        assert!(matches!(
            decode::<u32>(r#"[42]"#),
            Err(CacheError::InvalidImport(_))
        ));
        assert!(matches!(
            decode::<u32>(r#"[[1, {"value":1,"expire":"NaN"}]]"#),
            Err(CacheError::InvalidImport(_))
        ));
        assert!(matches!(
            decode::<u32>("not json"),
            Err(CacheError::Serialization(_))
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_expire_string() {
        let result = decode::<u32>(r#"[["k",{"value":1,"expire":"soon"}]]"#);
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }
}
