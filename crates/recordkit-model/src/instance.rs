//! Model instances
//!
//! A [`ModelInstance`] is an immutable record conforming to its
//! [`ModelType`]. Every "change" produces a new instance; untouched fields are
//! shared with the original.

use crate::error::InstanceError;
use crate::hash::InstanceHash;
use crate::model_type::ModelType;
use crate::path::{FieldPath, PathError};
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

/// Immutable record of a model type
///
/// # Invariants
/// - Holds exactly one value per field of its model type, in declaration order
/// - Never mutated in place
/// - Equality is structural: same model type and equal values
#[derive(Clone)]
pub struct ModelInstance {
    model: ModelType,
    values: im::Vector<Value>,
}

impl ModelInstance {
    /// Assemble from already validated parts
    pub(crate) fn from_parts(model: ModelType, values: im::Vector<Value>) -> Self {
        debug_assert_eq!(model.len(), values.len());
        Self { model, values }
    }

    /// Model type of this instance
    #[inline]
    #[must_use]
    pub fn model(&self) -> &ModelType {
        &self.model
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a field, `None` if the model has no such field
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.model.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Value of a field
    ///
    /// # Errors
    /// Returns [`InstanceError::UnknownField`] if the model has no such field
    pub fn field(&self, name: &str) -> Result<&Value, InstanceError> {
        self.get(name).ok_or_else(|| self.model.unknown_field(name))
    }

    /// `(name, value)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.model.field_names().zip(self.values.iter())
    }

    /// Values in declaration order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Copy of the field mapping in declaration order
    #[must_use]
    pub fn to_map(&self) -> IndexMap<String, Value> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    /// Derive a new instance with one field replaced
    ///
    /// `self` is left untouched. Deriving with the current value yields an
    /// instance equal to `self`.
    ///
    /// # Errors
    /// - [`InstanceError::UnknownField`] if the model has no such field
    /// - [`InstanceError::KindMismatch`] when kind checking is enabled
    pub fn with_field(&self, name: &str, value: impl Into<Value>) -> Result<Self, InstanceError> {
        let index = self
            .model
            .index_of(name)
            .ok_or_else(|| self.model.unknown_field(name))?;
        let value = value.into();
        self.model.check_kind_at(index, &value)?;
        Ok(Self {
            model: self.model.clone(),
            values: self.values.update(index, value),
        })
    }

    /// Derive a new instance with several fields replaced
    ///
    /// Either every replacement applies or none does.
    ///
    /// # Errors
    /// Same as [`ModelInstance::with_field`] for the first offending pair
    pub fn with_fields<I, K, V>(&self, changes: I) -> Result<Self, InstanceError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut values = self.values.clone();
        for (name, value) in changes {
            let name = name.as_ref();
            let index = self
                .model
                .index_of(name)
                .ok_or_else(|| self.model.unknown_field(name))?;
            let value = value.into();
            self.model.check_kind_at(index, &value)?;
            values = values.update(index, value);
        }
        Ok(Self {
            model: self.model.clone(),
            values,
        })
    }

    /// Read a field of a nested model
    ///
    /// # Errors
    /// - [`InstanceError::UnknownField`] if a segment names no field
    /// - [`PathError::NotAModel`] if an intermediate field is not a model
    pub fn get_path(&self, path: &FieldPath) -> Result<&Value, InstanceError> {
        let mut current = self;
        let segments = path.segments();
        let (last, parents) = segments
            .split_last()
            .ok_or(InstanceError::Path(PathError::EmptyPath))?;
        for segment in parents {
            current = current
                .field(segment)?
                .as_model()
                .ok_or_else(|| PathError::NotAModel {
                    segment: segment.clone(),
                })?;
        }
        current.field(last)
    }

    /// Derive a new instance with a nested field replaced
    ///
    /// Every model along the path is rebuilt; everything else is shared.
    ///
    /// # Errors
    /// Same as [`ModelInstance::get_path`] and [`ModelInstance::with_field`]
    pub fn with_path(&self, path: &FieldPath, value: impl Into<Value>) -> Result<Self, InstanceError> {
        match path.split_first() {
            (head, None) => self.with_field(head, value),
            (head, Some(rest)) => {
                let child = self
                    .field(head)?
                    .as_model()
                    .ok_or_else(|| PathError::NotAModel {
                        segment: head.to_string(),
                    })?;
                let child = child.with_path(&rest, value)?;
                self.with_field(head, Value::Model(child))
            }
        }
    }

    /// Content hash over model name, field names and values
    ///
    /// Equal instances have equal hashes, so the hash can serve as a
    /// memoization key across processes.
    #[inline]
    #[must_use]
    pub fn content_hash(&self) -> InstanceHash {
        InstanceHash::of(self)
    }
}

impl PartialEq for ModelInstance {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model && self.values == other.values
    }
}

impl Eq for ModelInstance {}

impl Hash for ModelInstance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.model.name().hash(state);
        self.values.hash(state);
    }
}

impl Debug for ModelInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.model.name());
        for (name, value) in self.iter() {
            s.field(name, value);
        }
        s.finish()
    }
}

impl Display for ModelInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.model.name())?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, " {name}: {value}")?;
        }
        if self.is_empty() {
            f.write_str("}")
        } else {
            f.write_str(" }")
        }
    }
}

impl serde::Serialize for ModelInstance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
