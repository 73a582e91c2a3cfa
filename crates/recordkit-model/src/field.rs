//! Field descriptors
//!
//! A [`FieldDescriptor`] declares one field of a model type: its name, whether
//! it must be supplied, the default used when it is not, and its kind.

use crate::value::{FieldKind, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

static FIELD_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("field name pattern compiles"));

/// Check that `name` is a valid field identifier
#[inline]
#[must_use]
pub fn is_valid_field_name(name: &str) -> bool {
    FIELD_NAME.is_match(name)
}

/// Default for an optional field
///
/// Factories are the general case: they run on every construction that omits
/// the field, so no two instances ever receive the same default allocation.
/// Literals are a convenience and are cloned per construction.
///
/// Factories must be stateless; this is a contract, not checked at runtime.
#[derive(Clone)]
pub enum DefaultValue {
    /// Fixed value
    Literal(Value),
    /// Value produced on demand
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    #[inline]
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    #[inline]
    #[must_use]
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(f))
    }

    /// Produce a fresh default value
    #[inline]
    #[must_use]
    pub fn produce(&self) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Factory(f) => f(),
        }
    }

    /// The literal value, if this default is not a factory
    #[inline]
    #[must_use]
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal(value) => Some(value),
            Self::Factory(_) => None,
        }
    }
}

impl Debug for DefaultValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Whether a field must be supplied
///
/// A required field never has a default and an optional one always has
/// exactly one.
#[derive(Debug, Clone)]
pub enum Presence {
    Required,
    Optional(DefaultValue),
}

/// Declaration of a single model field
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    presence: Presence,
    kind: FieldKind,
}

impl FieldDescriptor {
    /// Required field of kind [`FieldKind::Any`]
    #[inline]
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            presence: Presence::Required,
            kind: FieldKind::Any,
        }
    }

    /// Optional field of kind [`FieldKind::Any`]
    #[inline]
    #[must_use]
    pub fn optional(name: impl Into<String>, default: DefaultValue) -> Self {
        Self {
            name: name.into(),
            presence: Presence::Optional(default),
            kind: FieldKind::Any,
        }
    }

    /// Set the declared kind
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    #[inline]
    #[must_use]
    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        matches!(self.presence, Presence::Required)
    }

    /// Default for optional fields, `None` for required ones
    #[inline]
    #[must_use]
    pub fn default(&self) -> Option<&DefaultValue> {
        match &self.presence {
            Presence::Required => None,
            Presence::Optional(default) => Some(default),
        }
    }

    /// Same name, requiredness and kind (defaults are not comparable)
    pub(crate) fn same_shape(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.is_required() == other.is_required()
    }
}
