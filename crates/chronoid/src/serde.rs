//! Serde support: canonical text for the 128-bit families, native integer
//! for Snowflakes, plus field helpers for alternate wire shapes.

use crate::{Identifier, NodeId, Snowflake, Ulid, Uuid};
use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

impl Serialize for Uuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for Uuid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse_canonical(&text).map_err(de::Error::custom)
    }
}

impl Serialize for Ulid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for Ulid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse_canonical(&text).map_err(de::Error::custom)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.to_raw())
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self::from_raw)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_str(&text).map_err(de::Error::custom)
    }
}

/// Serializes a [`Snowflake`] as its decimal string, for consumers that
/// cannot represent the full unsigned 64-bit range natively.
///
/// ```
/// use chronoid::{Snowflake, serde::as_decimal_string};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Message {
///     #[serde(with = "as_decimal_string")]
///     id: Snowflake,
/// }
///
/// let encoded = serde_json::to_string(&Message {
///     id: Snowflake::from_raw(1541815603606036480),
/// })
/// .unwrap();
/// assert_eq!(encoded, r#"{"id":"1541815603606036480"}"#);
/// ```
pub mod as_decimal_string {
    use super::*;

    pub fn serialize<S: Serializer>(id: &Snowflake, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Snowflake, D::Error> {
        let text = String::deserialize(deserializer)?;
        Snowflake::from_str(&text).map_err(de::Error::custom)
    }
}

/// Serializes a 128-bit identifier as 32 lowercase hex chars instead of its
/// canonical form.
pub mod as_hex {
    use super::*;
    use crate::{Format, Repr};

    pub fn serialize<S, I>(id: &I, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        I: Identifier,
    {
        match id.to_repr(Format::Hex) {
            Repr::Hex(hex) => serializer.serialize_str(&hex),
            _ => unreachable!(),
        }
    }

    pub fn deserialize<'de, D, I>(deserializer: D) -> Result<I, D::Error>
    where
        D: Deserializer<'de>,
        I: Identifier,
    {
        let text = String::deserialize(deserializer)?;
        I::parse(&Repr::Hex(text)).map_err(de::Error::custom)
    }
}
