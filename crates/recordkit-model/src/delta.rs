//! Field-level deltas between instances
//!
//! Provides [`InstanceDelta`]: the set of field replacements that turns one
//! instance into another, guarded by the base instance's content hash.

use crate::error::InstanceError;
use crate::hash::InstanceHash;
use crate::instance::ModelInstance;
use crate::value::Value;
use std::fmt::{self, Display, Formatter};

/// Replacement of a single field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldChange {
    field: String,
    before: Value,
    after: Value,
}

impl FieldChange {
    #[inline]
    #[must_use]
    pub fn new(field: impl Into<String>, before: Value, after: Value) -> Self {
        Self {
            field: field.into(),
            before,
            after,
        }
    }

    #[inline]
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[inline]
    #[must_use]
    pub fn before(&self) -> &Value {
        &self.before
    }

    #[inline]
    #[must_use]
    pub fn after(&self) -> &Value {
        &self.after
    }

    #[inline]
    #[must_use]
    fn inverted(&self) -> Self {
        Self {
            field: self.field.clone(),
            before: self.after.clone(),
            after: self.before.clone(),
        }
    }
}

impl Display for FieldChange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.before, self.after)
    }
}

/// Changes turning one instance into another
///
/// # Invariants
/// - `base` is the hash of the instance the delta was computed from and
///   `target` the hash of the instance it produces
/// - `changes` lists differing fields in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDelta {
    model: String,
    base: InstanceHash,
    target: InstanceHash,
    changes: Vec<FieldChange>,
}

impl InstanceDelta {
    /// Compute the delta from `from` to `to`
    ///
    /// # Errors
    /// Returns [`DeltaError::ModelMismatch`] if the instances belong to
    /// different model types
    pub fn between(from: &ModelInstance, to: &ModelInstance) -> Result<Self, DeltaError> {
        if from.model() != to.model() {
            return Err(DeltaError::ModelMismatch {
                expected: from.model().name().to_string(),
                actual: to.model().name().to_string(),
            });
        }

        let changes = from
            .iter()
            .zip(to.values())
            .filter(|((_, before), after)| before != after)
            .map(|((name, before), after)| FieldChange::new(name, before.clone(), after.clone()))
            .collect();

        Ok(Self {
            model: from.model().name().to_string(),
            base: from.content_hash(),
            target: to.content_hash(),
            changes,
        })
    }

    #[inline]
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Hash the delta expects to apply to
    #[inline]
    #[must_use]
    pub fn base(&self) -> &InstanceHash {
        &self.base
    }

    /// Hash of the instance the delta produces
    #[inline]
    #[must_use]
    pub fn target(&self) -> &InstanceHash {
        &self.target
    }

    #[inline]
    #[must_use]
    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// True if the two instances were equal
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Check the delta can apply to `instance`
    ///
    /// # Errors
    /// - [`DeltaError::ModelMismatch`] for an instance of another model
    /// - [`DeltaError::BaseMismatch`] if `instance` is not the base
    pub fn validate_base(&self, instance: &ModelInstance) -> Result<(), DeltaError> {
        if instance.model().name() != self.model {
            return Err(DeltaError::ModelMismatch {
                expected: self.model.clone(),
                actual: instance.model().name().to_string(),
            });
        }
        let actual = instance.content_hash();
        if actual != self.base {
            return Err(DeltaError::BaseMismatch {
                expected: self.base,
                actual,
            });
        }
        Ok(())
    }

    /// Derive the target instance from the base
    ///
    /// # Errors
    /// Returns error if base validation fails or a change is rejected by the
    /// model
    pub fn apply(&self, instance: &ModelInstance) -> Result<ModelInstance, DeltaError> {
        self.validate_base(instance)?;
        let derived = instance.with_fields(
            self.changes
                .iter()
                .map(|change| (change.field.as_str(), change.after.clone())),
        )?;
        Ok(derived)
    }

    /// Delta that undoes this one
    #[must_use]
    pub fn invert(&self) -> Self {
        Self {
            model: self.model.clone(),
            base: self.target,
            target: self.base,
            changes: self.changes.iter().map(FieldChange::inverted).collect(),
        }
    }
}

impl Display for InstanceDelta {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.model, self.base.short())?;
        for change in &self.changes {
            write!(f, "\n  {change}")?;
        }
        Ok(())
    }
}

/// Errors specific to delta operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeltaError {
    /// Base hash mismatch (the instance changed since the delta was computed)
    #[error("base hash mismatch: expected {expected}, got {actual}")]
    BaseMismatch {
        expected: InstanceHash,
        actual: InstanceHash,
    },

    /// Instances belong to different model types
    #[error("model mismatch: expected {expected}, got {actual}")]
    ModelMismatch { expected: String, actual: String },

    /// A change was rejected by the model
    #[error("instance error: {0}")]
    Instance(#[from] InstanceError),
}
