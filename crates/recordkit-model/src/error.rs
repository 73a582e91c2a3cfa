//! Error types for model definition and instance construction
//!
//! - [`DefinitionError`]: the field table itself is malformed (fatal to that
//!   definition, fix the declaration)
//! - [`InstanceError`]: a `create`/`with_field` call got bad input
//!   (recoverable, fix the input and retry)

use crate::path::PathError;
use crate::value::FieldKind;

/// Errors raised while compiling a field table into a model type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    /// Same field name declared twice in one set
    #[error("model '{model}': field '{field}' is declared more than once")]
    DuplicateField { model: String, field: String },

    /// Field name appears in both the required and optional sets
    #[error("model '{model}': field '{field}' is declared both required and optional")]
    OverlappingField { model: String, field: String },

    /// Field name is not an identifier
    #[error("model '{model}': invalid field name '{field}'")]
    InvalidFieldName { model: String, field: String },

    /// Literal default does not match the declared kind
    #[error("model '{model}': default for '{field}' is {actual}, expected {expected}")]
    DefaultKindMismatch {
        model: String,
        field: String,
        expected: FieldKind,
        actual: &'static str,
    },

    /// Field count exceeds the configured limit
    #[error("model '{model}': {count} fields exceeds the limit of {max}")]
    TooManyFields {
        model: String,
        count: usize,
        max: usize,
    },
}

/// Errors raised while creating or deriving an instance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstanceError {
    /// Required fields were not supplied
    #[error("model '{model}': missing required field(s): {}", .fields.join(", "))]
    MissingRequiredField { model: String, fields: Vec<String> },

    /// Field name is not part of the model type
    #[error("model '{model}': unknown field '{field}'")]
    UnknownField { model: String, field: String },

    /// Same field supplied twice in one call
    #[error("model '{model}': field '{field}' supplied more than once")]
    DuplicateValue { model: String, field: String },

    /// Value does not match the declared kind
    #[error("model '{model}': field '{field}' expects {expected}, got {actual}")]
    KindMismatch {
        model: String,
        field: String,
        expected: FieldKind,
        actual: &'static str,
    },

    /// Instance belongs to a different model type
    #[error("expected an instance of '{expected}', got '{actual}'")]
    ModelMismatch { expected: String, actual: String },

    /// Nested path could not be resolved
    #[error("path error: {0}")]
    Path(#[from] PathError),
}

impl InstanceError {
    /// Name of the field the error is about, if it concerns a single field
    #[inline]
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::UnknownField { field, .. }
            | Self::DuplicateValue { field, .. }
            | Self::KindMismatch { field, .. } => Some(field),
            Self::MissingRequiredField { fields, .. } if fields.len() == 1 => {
                fields.first().map(String::as_str)
            }
            _ => None,
        }
    }
}

/// Any model error
///
/// Returned where both definition and construction can fail, such as the
/// conversions generated by [`define_model!`](crate::define_model).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Instance(#[from] InstanceError),
}

impl ModelError {
    /// Check if the error comes from a malformed declaration
    #[inline]
    #[must_use]
    pub fn is_definition_error(&self) -> bool {
        matches!(self, Self::Definition(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_listed() {
        let err = InstanceError::MissingRequiredField {
            model: "CursorPosition".into(),
            fields: vec!["line_number".into(), "offset".into()],
        };
        assert_eq!(
            err.to_string(),
            "model 'CursorPosition': missing required field(s): line_number, offset"
        );
        assert_eq!(err.field(), None);
    }

    #[test]
    fn single_field_is_reported() {
        let err = InstanceError::UnknownField {
            model: "Dog".into(),
            field: "tail".into(),
        };
        assert_eq!(err.field(), Some("tail"));
    }

    #[test]
    fn model_error_wraps_both_sides() {
        let def: ModelError = DefinitionError::DuplicateField {
            model: "Dog".into(),
            field: "name".into(),
        }
        .into();
        assert!(def.is_definition_error());

        let inst: ModelError = InstanceError::UnknownField {
            model: "Dog".into(),
            field: "x".into(),
        }
        .into();
        assert!(!inst.is_definition_error());
        assert_eq!(inst.to_string(), "model 'Dog': unknown field 'x'");
    }
}
