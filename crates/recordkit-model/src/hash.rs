//! Content hashing of instances
//!
//! Provides [`InstanceHash`], a 32-byte Blake3 digest of an instance's
//! canonical encoding. Used as a memoization key and as the base check of
//! [`InstanceDelta`](crate::InstanceDelta).

use crate::instance::ModelInstance;
use crate::value::Value;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte content hash (Blake3)
///
/// Immutable and cheap to clone (Copy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceHash([u8; 32]);

impl InstanceHash {
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create hash from byte slice
    ///
    /// # Errors
    /// Returns error if slice length is not exactly 32 bytes
    #[inline]
    pub fn from_slice(bytes: &[u8]) -> Result<Self, HashError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| HashError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Hash an instance
    ///
    /// The encoding covers the model name, every field name and every value
    /// with a variant tag, so `Int(1)` and `Float(1.0)` hash differently and
    /// nested models hash recursively.
    #[must_use]
    pub fn of(instance: &ModelInstance) -> Self {
        let mut hasher = blake3::Hasher::new();
        feed_instance(&mut hasher, instance);
        Self(*hasher.finalize().as_bytes())
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

fn feed_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn feed_instance(hasher: &mut blake3::Hasher, instance: &ModelInstance) {
    feed_str(hasher, instance.model().name());
    hasher.update(&(instance.len() as u64).to_le_bytes());
    for (name, value) in instance.iter() {
        feed_str(hasher, name);
        feed_value(hasher, value);
    }
}

fn feed_value(hasher: &mut blake3::Hasher, value: &Value) {
    match value {
        Value::Null => {
            hasher.update(&[0]);
        }
        Value::Bool(b) => {
            hasher.update(&[1, u8::from(*b)]);
        }
        Value::Int(i) => {
            hasher.update(&[2]);
            hasher.update(&i.to_le_bytes());
        }
        Value::Float(f) => {
            hasher.update(&[3]);
            hasher.update(&f.to_bits().to_le_bytes());
        }
        Value::String(s) => {
            hasher.update(&[4]);
            feed_str(hasher, s);
        }
        Value::List(items) => {
            hasher.update(&[5]);
            hasher.update(&(items.len() as u64).to_le_bytes());
            for item in items {
                feed_value(hasher, item);
            }
        }
        Value::Map(entries) => {
            hasher.update(&[6]);
            hasher.update(&(entries.len() as u64).to_le_bytes());
            for (key, item) in entries {
                feed_str(hasher, key);
                feed_value(hasher, item);
            }
        }
        Value::Model(instance) => {
            hasher.update(&[7]);
            feed_instance(hasher, instance);
        }
    }
}

impl Display for InstanceHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for InstanceHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8; 32]> for InstanceHash {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

impl serde::Serialize for InstanceHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> serde::Deserialize<'de> for InstanceHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct InstanceHashVisitor;

        impl<'de> serde::de::Visitor<'de> for InstanceHashVisitor {
            type Value = InstanceHash;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str("a 32-byte hash as hex string or byte array")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(serde::de::Error::custom)
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                InstanceHash::from_slice(value).map_err(serde::de::Error::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(InstanceHashVisitor)
        } else {
            deserializer.deserialize_bytes(InstanceHashVisitor)
        }
    }
}

/// Errors that can occur when parsing instance hashes
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// Invalid hash length
    #[error("invalid hash length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Hex encoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_type::ModelType;

    fn point(x: impl Into<Value>, y: impl Into<Value>) -> ModelInstance {
        let (x, y): (Value, Value) = (x.into(), y.into());
        ModelType::define("Point", ["x", "y"], Vec::<(&str, crate::DefaultValue)>::new())
            .unwrap()
            .create([("x", x), ("y", y)])
            .unwrap()
    }

    #[test]
    fn equal_instances_hash_equal() {
        assert_eq!(point(1, 2).content_hash(), point(1, 2).content_hash());
    }

    #[test]
    fn different_values_hash_differently() {
        assert_ne!(point(1, 2).content_hash(), point(2, 1).content_hash());
    }

    #[test]
    fn variant_is_part_of_hash() {
        assert_ne!(point(1, 2).content_hash(), point(1.0, 2).content_hash());
    }

    #[test]
    fn model_name_is_part_of_hash() {
        let other = ModelType::define("Vector", ["x", "y"], Vec::<(&str, crate::DefaultValue)>::new())
            .unwrap()
            .create([("x", 1), ("y", 2)])
            .unwrap();
        assert_ne!(point(1, 2).content_hash(), other.content_hash());
    }

    #[test]
    fn string_boundaries_are_unambiguous() {
        let a = point("ab", "c");
        let b = point("a", "bc");
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn display_parse_round_trip() {
        let hash = point(1, 2).content_hash();
        let parsed: InstanceHash = hash.to_string().parse().unwrap();
        assert_eq!(hash, parsed);
        assert!(hash.to_string().starts_with(&hash.short()));
        assert_eq!(hash.short().len(), 16);
    }

    #[test]
    fn from_slice_invalid_length() {
        let result = InstanceHash::from_slice(&[1u8; 31]);
        assert!(matches!(
            result,
            Err(HashError::InvalidLength {
                expected: 32,
                actual: 31
            })
        ));
    }

    #[test]
    fn serde_json_as_hex() {
        let hash = point(1, 2).content_hash();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json.len(), 66);
        let decoded: InstanceHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, decoded);
    }
}
