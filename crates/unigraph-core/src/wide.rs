//! The `BigInt` API scalar.
//!
//! Attributes such as `credits` or `applications` are stored as 64-bit graph
//! integers. JSON clients commonly parse numbers as doubles, so on the wire the
//! scalar is always written as a decimal string. Input accepts either a string
//! or an integer literal that fits in 64 bits.

use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::WideIntError;

/// A 64-bit integer carried as a decimal string across the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct WideInt(pub i64);

impl WideInt {
    /// Stored form: a plain graph integer.
    pub fn to_store_value(self) -> serde_json::Value {
        serde_json::Value::from(self.0)
    }

    /// Coerce a value read from the store, which may hold the textual form.
    ///
    /// Returns `Ok(None)` for null.
    pub fn from_store_value(value: &serde_json::Value) -> Result<Option<Self>, WideIntError> {
        match value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) => s.parse().map(Some),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(v) => Ok(Some(Self(v))),
                None if n.is_u64() => Err(WideIntError::OutOfRange {
                    input: n.to_string(),
                }),
                None => Err(WideIntError::Malformed {
                    input: n.to_string(),
                    reason: "not an integer".to_string(),
                }),
            },
            other => Err(WideIntError::Malformed {
                input: other.to_string(),
                reason: "expected a string or integer".to_string(),
            }),
        }
    }
}

impl From<i64> for WideInt {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<WideInt> for i64 {
    fn from(value: WideInt) -> Self {
        value.0
    }
}

impl fmt::Display for WideInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for WideInt {
    type Err = WideIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|e| match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => WideIntError::OutOfRange {
                input: s.to_string(),
            },
            _ => WideIntError::Malformed {
                input: s.to_string(),
                reason: e.to_string(),
            },
        })
    }
}

impl Serialize for WideInt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for WideInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WideIntVisitor)
    }
}

struct WideIntVisitor;

impl<'de> Visitor<'de> for WideIntVisitor {
    type Value = WideInt;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or a 64-bit integer")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<WideInt, E> {
        Ok(WideInt(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<WideInt, E> {
        i64::try_from(v).map(WideInt).map_err(|_| {
            E::custom(WideIntError::OutOfRange {
                input: v.to_string(),
            })
        })
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<WideInt, E> {
        v.parse().map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&WideInt(123_456_789_012_345)).unwrap();
        assert_eq!(json, "\"123456789012345\"");
    }

    #[test]
    fn accepts_string_and_integer_input() {
        let from_str: WideInt = serde_json::from_str("\"9007199254740993\"").unwrap();
        let from_int: WideInt = serde_json::from_str("9007199254740993").unwrap();
        assert_eq!(from_str, WideInt(9_007_199_254_740_993));
        assert_eq!(from_int, from_str);

        let negative: WideInt = serde_json::from_str("-42").unwrap();
        assert_eq!(negative.0, -42);
    }

    #[test]
    fn rejects_malformed_literals() {
        assert!(serde_json::from_str::<WideInt>("\"12ab\"").is_err());
        assert!(serde_json::from_str::<WideInt>("1.5").is_err());
        assert!(serde_json::from_str::<WideInt>("true").is_err());
        assert!(serde_json::from_str::<WideInt>("18446744073709551615").is_err());
    }

    #[test]
    fn parse_classifies_overflow() {
        let err = "99999999999999999999".parse::<WideInt>().unwrap_err();
        assert!(matches!(err, WideIntError::OutOfRange { .. }));

        let err = "twelve".parse::<WideInt>().unwrap_err();
        assert!(matches!(err, WideIntError::Malformed { .. }));
    }

    #[test]
    fn coerces_textual_store_values() {
        let text = serde_json::json!("123456789012345");
        assert_eq!(
            WideInt::from_store_value(&text).unwrap(),
            Some(WideInt(123_456_789_012_345))
        );
        assert_eq!(WideInt::from_store_value(&serde_json::Value::Null).unwrap(), None);
        assert!(WideInt::from_store_value(&serde_json::json!(2.5)).is_err());
    }
}
