//! Dynamic field values
//!
//! Provides [`Value`], the runtime representation of a field, [`FieldKind`]
//! for declaring which values a field accepts, and the [`ModelValue`] bridge
//! between Rust types and [`Value`].

use crate::instance::ModelInstance;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// Value stored in a model field
///
/// Lists and maps are persistent collections: cloning a value never deep-copies
/// them, and deriving a new instance shares every untouched node.
///
/// # Equality
/// Structural. `Float` compares by IEEE total order, so `NaN == NaN` and
/// `-0.0 != 0.0`; this keeps equality reflexive and consistent with [`Hash`].
/// Values of different variants are never equal (`Int(1) != Float(1.0)`).
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Immutable string (cheap to clone)
    String(Arc<str>),
    /// Ordered persistent list
    List(im::Vector<Value>),
    /// Sorted persistent map with string keys
    Map(im::OrdMap<String, Value>),
    /// Nested model instance
    Model(ModelInstance),
}

impl Value {
    /// Build a list value from any iterator of convertible items
    #[must_use]
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a map value from `(key, value)` pairs
    #[must_use]
    pub fn map<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Value>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Short name of the variant, used in diagnostics
    #[inline]
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Model(_) => "model",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&im::Vector<Value>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&im::OrdMap<String, Value>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_model(&self) -> Option<&ModelInstance> {
        match self {
            Self::Model(instance) => Some(instance),
            _ => None,
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Float(_) => 3,
            Self::String(_) => 4,
            Self::List(_) => 5,
            Self::Map(_) => 6,
            Self::Model(_) => 7,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b) == Ordering::Equal,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Model(a), Self::Model(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::List(items) => items.hash(state),
            Self::Map(entries) => entries.hash(state),
            Self::Model(instance) => instance.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Model(instance) => write!(f, "{instance}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items.into_iter().collect())
    }
}

impl From<ModelInstance> for Value {
    fn from(instance: ModelInstance) -> Self {
        Self::Model(instance)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::{SerializeMap, SerializeSeq};

        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::Model(instance) => instance.serialize(serializer),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Value {
    /// Nested objects always decode as [`Value::Map`]; resolving them into
    /// models needs a schema.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> serde::de::Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str("a field value")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                serde::Deserialize::deserialize(deserializer)
            }

            fn visit_bool<E>(self, b: bool) -> Result<Self::Value, E> {
                Ok(Value::Bool(b))
            }

            fn visit_i64<E>(self, i: i64) -> Result<Self::Value, E> {
                Ok(Value::Int(i))
            }

            fn visit_u64<E>(self, u: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                i64::try_from(u)
                    .map(Value::Int)
                    .map_err(|_| E::custom(format!("integer {u} does not fit in i64")))
            }

            fn visit_f64<E>(self, f: f64) -> Result<Self::Value, E> {
                Ok(Value::Float(f))
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E> {
                Ok(Value::from(s))
            }

            fn visit_string<E>(self, s: String) -> Result<Self::Value, E> {
                Ok(Value::from(s))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut items = im::Vector::new();
                while let Some(item) = seq.next_element()? {
                    items.push_back(item);
                }
                Ok(Value::List(items))
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut entries = im::OrdMap::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    entries.insert(key, value);
                }
                Ok(Value::Map(entries))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Declared kind of a field
///
/// Kinds are checked on construction and derivation when the model's
/// [`BuilderConfig::check_kinds`](crate::BuilderConfig) is set.
/// `Null` is accepted by every kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldKind {
    /// Any value
    #[default]
    Any,
    Bool,
    Int,
    Float,
    String,
    List,
    Map,
    /// Nested instance of the named model
    Model(String),
}

impl FieldKind {
    /// Check whether `value` may be stored in a field of this kind
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Any, _)
            | (_, Value::Null)
            | (Self::Bool, Value::Bool(_))
            | (Self::Int, Value::Int(_))
            | (Self::Float, Value::Float(_))
            | (Self::String, Value::String(_))
            | (Self::List, Value::List(_))
            | (Self::Map, Value::Map(_)) => true,
            (Self::Model(name), Value::Model(instance)) => instance.model().name() == name,
            _ => false,
        }
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::String => f.write_str("string"),
            Self::List => f.write_str("list"),
            Self::Map => f.write_str("map"),
            Self::Model(name) => write!(f, "model:{name}"),
        }
    }
}

impl FromStr for FieldKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "any" => Self::Any,
            "bool" => Self::Bool,
            "int" => Self::Int,
            "float" => Self::Float,
            "string" => Self::String,
            "list" => Self::List,
            "map" => Self::Map,
            other => match other.strip_prefix("model:") {
                Some(name) if !name.is_empty() => Self::Model(name.to_string()),
                _ => return Err(KindParseError(s.to_string())),
            },
        };
        Ok(kind)
    }
}

impl TryFrom<String> for FieldKind {
    type Error = KindParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.to_string()
    }
}

/// Unrecognized field kind name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field kind '{0}' (expected any, bool, int, float, string, list, map or model:<Name>)")]
pub struct KindParseError(pub String);

/// Conversion between a Rust type and a field [`Value`]
///
/// Implemented for the scalar types, `String`, `Vec<T>`, `Option<T>`,
/// `BTreeMap<String, T>`, [`Value`] and [`ModelInstance`]. Typed models
/// generated by [`define_model!`](crate::define_model) rely on it.
pub trait ModelValue: Sized {
    /// Kind declared for fields of this type
    fn kind() -> FieldKind;

    /// Convert into a field value
    fn into_value(self) -> Value;

    /// Extract from a field value; `None` if the variant does not match
    fn from_value(value: &Value) -> Option<Self>;
}

impl ModelValue for Value {
    fn kind() -> FieldKind {
        FieldKind::Any
    }

    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl ModelValue for bool {
    fn kind() -> FieldKind {
        FieldKind::Bool
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl ModelValue for i64 {
    fn kind() -> FieldKind {
        FieldKind::Int
    }

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl ModelValue for i32 {
    fn kind() -> FieldKind {
        FieldKind::Int
    }

    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|i| i32::try_from(i).ok())
    }
}

impl ModelValue for u32 {
    fn kind() -> FieldKind {
        FieldKind::Int
    }

    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|i| u32::try_from(i).ok())
    }
}

impl ModelValue for f64 {
    fn kind() -> FieldKind {
        FieldKind::Float
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl ModelValue for String {
    fn kind() -> FieldKind {
        FieldKind::String
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl ModelValue for ModelInstance {
    fn kind() -> FieldKind {
        FieldKind::Any
    }

    fn into_value(self) -> Value {
        Value::Model(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_model().cloned()
    }
}

impl<T: ModelValue> ModelValue for Option<T> {
    fn kind() -> FieldKind {
        T::kind()
    }

    fn into_value(self) -> Value {
        self.map_or(Value::Null, ModelValue::into_value)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ModelValue> ModelValue for Vec<T> {
    fn kind() -> FieldKind {
        FieldKind::List
    }

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(ModelValue::into_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_list()?.iter().map(T::from_value).collect()
    }
}

impl<T: ModelValue> ModelValue for BTreeMap<String, T> {
    fn kind() -> FieldKind {
        FieldKind::Map
    }

    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(k, v)| (k, v.into_value()))
                .collect(),
        )
    }

    fn from_value(value: &Value) -> Option<Self> {
        value
            .as_map()?
            .iter()
            .map(|(k, v)| T::from_value(v).map(|v| (k.clone(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn float_equality_is_reflexive_for_nan() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(hash_of(&nan), hash_of(&nan.clone()));
    }

    #[test]
    fn different_variants_are_not_equal() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::from("1"), Value::Int(1));
        assert_ne!(Value::Null, Value::Bool(false));
    }

    #[test]
    fn list_equality_is_structural() {
        let a = Value::list([1, 2, 3]);
        let b = Value::List(im::vector![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn map_equality_ignores_insertion_order() {
        let a = Value::map([("x", 1), ("y", 2)]);
        let b = Value::map([("y", 2), ("x", 1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn option_converts_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }

    #[test]
    fn accessors_match_variant() {
        assert_eq!(Value::Int(3).as_i64(), Some(3));
        assert_eq!(Value::Int(3).as_f64(), None);
        assert_eq!(Value::from("rex").as_str(), Some("rex"));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert!(Value::Null.is_null());
    }

    #[test]
    fn kind_parse_and_display() {
        for name in ["any", "bool", "int", "float", "string", "list", "map", "model:Dog"] {
            let kind: FieldKind = name.parse().unwrap();
            assert_eq!(kind.to_string(), name);
        }
        assert_eq!(
            "model:".parse::<FieldKind>(),
            Err(KindParseError("model:".to_string()))
        );
        assert!("number".parse::<FieldKind>().is_err());
    }

    #[test]
    fn kind_accepts_null_everywhere() {
        for kind in [FieldKind::Int, FieldKind::String, FieldKind::Model("Dog".into())] {
            assert!(kind.accepts(&Value::Null));
        }
    }

    #[test]
    fn kind_rejects_mismatched_variant() {
        assert!(!FieldKind::Int.accepts(&Value::Float(1.0)));
        assert!(!FieldKind::String.accepts(&Value::Int(1)));
        assert!(FieldKind::Any.accepts(&Value::Int(1)));
    }

    #[test]
    fn kind_serde_as_string() {
        let json = serde_json::to_string(&FieldKind::Model("Owner".into())).unwrap();
        assert_eq!(json, "\"model:Owner\"");
        let parsed: FieldKind = serde_json::from_str("\"float\"").unwrap();
        assert_eq!(parsed, FieldKind::Float);
    }

    #[test]
    fn value_deserializes_from_json() {
        let value: Value = serde_json::from_str(r#"{"a": [1, 2.5, "x", null, true]}"#).unwrap();
        let expected = Value::map([(
            "a",
            Value::list([
                Value::Int(1),
                Value::Float(2.5),
                Value::from("x"),
                Value::Null,
                Value::Bool(true),
            ]),
        )]);
        assert_eq!(value, expected);
    }

    #[test]
    fn model_value_round_trips_containers() {
        let tags = vec!["a".to_string(), "b".to_string()];
        let value = tags.clone().into_value();
        assert_eq!(Vec::<String>::from_value(&value), Some(tags));

        let mut scores = BTreeMap::new();
        scores.insert("q1".to_string(), 1.5_f64);
        let value = scores.clone().into_value();
        assert_eq!(BTreeMap::<String, f64>::from_value(&value), Some(scores));

        assert_eq!(Option::<i64>::from_value(&Value::Null), Some(None));
        assert_eq!(i64::from_value(&Value::from("x")), None);
    }

    #[test]
    fn display_renders_nested_values() {
        let value = Value::map([("tags", Value::list(["a", "b"])), ("n", Value::Int(2))]);
        assert_eq!(value.to_string(), r#"{"n": 2, "tags": ["a", "b"]}"#);
    }
}
