//! Model types and the model builder
//!
//! A [`ModelType`] is a compiled field table. It is fixed at definition time
//! and is the only way to create [`ModelInstance`]s.

use crate::config::BuilderConfig;
use crate::error::{DefinitionError, InstanceError};
use crate::field::{is_valid_field_name, DefaultValue, FieldDescriptor};
use crate::instance::ModelInstance;
use crate::value::{FieldKind, Value};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Compiled, immutable schema of a record
///
/// Cheap to clone; clones share the same field table.
///
/// # Invariants
/// - Field names are unique and valid identifiers
/// - Required fields come first, then optional fields, each in declaration
///   order; this order is the iteration and serialization order
/// - Never gains or loses fields after definition
#[derive(Clone)]
pub struct ModelType {
    inner: Arc<ModelTypeInner>,
}

struct ModelTypeInner {
    name: String,
    fields: IndexMap<String, FieldDescriptor>,
    config: BuilderConfig,
}

impl ModelType {
    /// Define a model from a required set and an optional set with defaults
    ///
    /// # Errors
    /// - [`DefinitionError::DuplicateField`] if a name repeats within a set
    /// - [`DefinitionError::OverlappingField`] if a name is in both sets
    /// - [`DefinitionError::InvalidFieldName`] if a name is not an identifier
    ///
    /// # Example
    /// ```rust
    /// use recordkit_model::{DefaultValue, ModelType};
    ///
    /// let dog = ModelType::define(
    ///     "Dog",
    ///     ["name"],
    ///     [("dogdad", DefaultValue::literal("Pablo"))],
    /// )
    /// .unwrap();
    /// assert_eq!(dog.len(), 2);
    /// ```
    pub fn define<R, O, N>(
        name: impl Into<String>,
        required: R,
        optional: O,
    ) -> Result<Self, DefinitionError>
    where
        R: IntoIterator<Item = N>,
        O: IntoIterator<Item = (N, DefaultValue)>,
        N: Into<String>,
    {
        let mut builder = Self::builder(name);
        for field in required {
            builder = builder.required(field);
        }
        for (field, default) in optional {
            builder = builder.field(FieldDescriptor::optional(field, default));
        }
        builder.build()
    }

    /// Start a fluent definition
    #[inline]
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder::new(name)
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.inner.config
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.fields.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.fields.is_empty()
    }

    /// Descriptors in declaration order
    #[inline]
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.inner.fields.values()
    }

    /// Field names in declaration order
    #[inline]
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.inner.fields.keys().map(String::as_str)
    }

    #[inline]
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields().filter(|f| f.is_required())
    }

    #[inline]
    pub fn optional_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields().filter(|f| !f.is_required())
    }

    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.inner.fields.get(name)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.fields.contains_key(name)
    }

    /// Position of a field in declaration order
    #[inline]
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.inner.fields.get_index_of(name)
    }

    pub(crate) fn descriptor_at(&self, index: usize) -> Option<&FieldDescriptor> {
        self.inner.fields.get_index(index).map(|(_, d)| d)
    }

    /// Check whether two handles refer to the same definition
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Create an instance from `(field, value)` pairs
    ///
    /// Omitted optional fields receive a freshly produced default.
    ///
    /// # Errors
    /// - [`InstanceError::UnknownField`] for names not in the model
    /// - [`InstanceError::DuplicateValue`] for names supplied twice
    /// - [`InstanceError::MissingRequiredField`] listing every omitted
    ///   required field
    /// - [`InstanceError::KindMismatch`] when kind checking is enabled
    pub fn create<I, K, V>(&self, values: I) -> Result<ModelInstance, InstanceError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut slots: Vec<Option<Value>> = vec![None; self.len()];

        for (name, value) in values {
            let name = name.as_ref();
            let index = self.index_of(name).ok_or_else(|| self.unknown_field(name))?;
            if slots[index].is_some() {
                return Err(InstanceError::DuplicateValue {
                    model: self.name().to_string(),
                    field: name.to_string(),
                });
            }
            let value = value.into();
            self.check_kind_at(index, &value)?;
            slots[index] = Some(value);
        }

        let missing: Vec<String> = self
            .fields()
            .zip(&slots)
            .filter(|(field, slot)| field.is_required() && slot.is_none())
            .map(|(field, _)| field.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(InstanceError::MissingRequiredField {
                model: self.name().to_string(),
                fields: missing,
            });
        }

        let mut values = im::Vector::new();
        for (index, slot) in slots.into_iter().enumerate() {
            let value = match slot {
                Some(value) => value,
                None => {
                    let value = self
                        .descriptor_at(index)
                        .and_then(FieldDescriptor::default)
                        .map(DefaultValue::produce)
                        .unwrap_or_default();
                    self.check_kind_at(index, &value)?;
                    value
                }
            };
            values.push_back(value);
        }

        Ok(ModelInstance::from_parts(self.clone(), values))
    }

    /// Create an instance with every optional field at its default
    ///
    /// # Errors
    /// Returns [`InstanceError::MissingRequiredField`] if the model has
    /// required fields
    pub fn create_default(&self) -> Result<ModelInstance, InstanceError> {
        self.create(std::iter::empty::<(&str, Value)>())
    }

    pub(crate) fn unknown_field(&self, name: &str) -> InstanceError {
        InstanceError::UnknownField {
            model: self.name().to_string(),
            field: name.to_string(),
        }
    }

    pub(crate) fn check_kind_at(&self, index: usize, value: &Value) -> Result<(), InstanceError> {
        if !self.config().check_kinds {
            return Ok(());
        }
        match self.descriptor_at(index) {
            Some(field) if !field.kind().accepts(value) => Err(InstanceError::KindMismatch {
                model: self.name().to_string(),
                field: field.name().to_string(),
                expected: field.kind().clone(),
                actual: value.kind_name(),
            }),
            _ => Ok(()),
        }
    }
}

/// Same definition, or same name with identically shaped fields
impl PartialEq for ModelType {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.name() == other.name()
                && self.len() == other.len()
                && self.fields().zip(other.fields()).all(|(a, b)| a.same_shape(b)))
    }
}

impl Eq for ModelType {}

impl Debug for ModelType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("name", &self.inner.name)
            .field("fields", &self.inner.fields.values().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for model types
///
/// Collects the required and optional sets; all validation happens in
/// [`ModelBuilder::build`].
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    required: Vec<FieldDescriptor>,
    optional: Vec<FieldDescriptor>,
    config: BuilderConfig,
}

impl ModelBuilder {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: Vec::new(),
            optional: Vec::new(),
            config: BuilderConfig::default(),
        }
    }

    /// Add a descriptor to the set matching its presence
    #[inline]
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        if field.is_required() {
            self.required.push(field);
        } else {
            self.optional.push(field);
        }
        self
    }

    /// Add a required field of any kind
    #[inline]
    #[must_use]
    pub fn required(self, name: impl Into<String>) -> Self {
        self.field(FieldDescriptor::required(name))
    }

    /// Add a required field of the given kind
    #[inline]
    #[must_use]
    pub fn required_kind(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(FieldDescriptor::required(name).with_kind(kind))
    }

    /// Add an optional field with a literal default
    #[inline]
    #[must_use]
    pub fn optional(self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.field(FieldDescriptor::optional(name, DefaultValue::literal(default)))
    }

    /// Add an optional field of the given kind with a literal default
    #[inline]
    #[must_use]
    pub fn optional_kind(
        self,
        name: impl Into<String>,
        kind: FieldKind,
        default: impl Into<Value>,
    ) -> Self {
        self.field(FieldDescriptor::optional(name, DefaultValue::literal(default)).with_kind(kind))
    }

    /// Add an optional field whose default is produced per construction
    #[inline]
    #[must_use]
    pub fn optional_with<F>(self, name: impl Into<String>, kind: FieldKind, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.field(FieldDescriptor::optional(name, DefaultValue::factory(factory)).with_kind(kind))
    }

    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the field table and compile it
    ///
    /// # Errors
    /// See [`ModelType::define`]; additionally
    /// [`DefinitionError::DefaultKindMismatch`] and
    /// [`DefinitionError::TooManyFields`].
    pub fn build(self) -> Result<ModelType, DefinitionError> {
        let Self {
            name,
            required,
            optional,
            config,
        } = self;

        for field in required.iter().chain(&optional) {
            if !is_valid_field_name(field.name()) {
                return Err(DefinitionError::InvalidFieldName {
                    model: name,
                    field: field.name().to_string(),
                });
            }
        }

        let required_names = unique_names(&name, &required)?;
        unique_names(&name, &optional)?;
        if let Some(field) = optional
            .iter()
            .find(|f| required_names.contains(f.name()))
        {
            return Err(DefinitionError::OverlappingField {
                model: name.clone(),
                field: field.name().to_string(),
            });
        }

        let count = required.len() + optional.len();
        if count > config.max_fields {
            return Err(DefinitionError::TooManyFields {
                model: name,
                count,
                max: config.max_fields,
            });
        }

        if config.check_kinds {
            for field in &optional {
                let literal = field.default().and_then(DefaultValue::as_literal);
                if let Some(value) = literal {
                    if !field.kind().accepts(value) {
                        return Err(DefinitionError::DefaultKindMismatch {
                            model: name,
                            field: field.name().to_string(),
                            expected: field.kind().clone(),
                            actual: value.kind_name(),
                        });
                    }
                }
            }
        }

        let fields: IndexMap<String, FieldDescriptor> = required
            .into_iter()
            .chain(optional)
            .map(|f| (f.name().to_string(), f))
            .collect();

        tracing::debug!(model = %name, fields = fields.len(), "defined model type");

        Ok(ModelType {
            inner: Arc::new(ModelTypeInner {
                name,
                fields,
                config,
            }),
        })
    }
}

fn unique_names<'a>(
    model: &str,
    fields: &'a [FieldDescriptor],
) -> Result<HashSet<&'a str>, DefinitionError> {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        if !seen.insert(field.name()) {
            return Err(DefinitionError::DuplicateField {
                model: model.to_string(),
                field: field.name().to_string(),
            });
        }
    }
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dog() -> ModelType {
        ModelType::builder("Dog")
            .required_kind("name", FieldKind::String)
            .optional_kind("dogdad", FieldKind::String, "Pablo")
            .build()
            .unwrap()
    }

    #[test]
    fn define_orders_required_first() {
        let model = ModelType::define(
            "Query",
            ["table", "limit"],
            [("offset", DefaultValue::literal(0))],
        )
        .unwrap();
        assert_eq!(
            model.field_names().collect::<Vec<_>>(),
            vec!["table", "limit", "offset"]
        );
        assert_eq!(model.required_fields().count(), 2);
        assert_eq!(model.optional_fields().count(), 1);
    }

    #[test]
    fn builder_keeps_required_before_optional_regardless_of_call_order() {
        let model = ModelType::builder("M")
            .optional("b", 1)
            .required("a")
            .build()
            .unwrap();
        assert_eq!(model.field_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(model.index_of("b"), Some(1));
    }

    #[test]
    fn duplicate_required_field_rejected() {
        let err = ModelType::define("M", ["a", "a"], Vec::<(&str, DefaultValue)>::new())
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateField {
                model: "M".into(),
                field: "a".into()
            }
        );
    }

    #[test]
    fn duplicate_optional_field_rejected() {
        let err = ModelType::builder("M")
            .optional("a", 1)
            .optional("a", 2)
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateField { .. }));
    }

    #[test]
    fn overlapping_field_rejected() {
        let err = ModelType::define("M", ["a"], [("a", DefaultValue::literal(1))]).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::OverlappingField {
                model: "M".into(),
                field: "a".into()
            }
        );
    }

    #[test]
    fn invalid_field_name_rejected() {
        let err = ModelType::builder("M").required("not valid").build().unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidFieldName { .. }));
    }

    #[test]
    fn default_kind_mismatch_rejected() {
        let err = ModelType::builder("M")
            .optional_kind("n", FieldKind::Int, "zero")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DefaultKindMismatch {
                model: "M".into(),
                field: "n".into(),
                expected: FieldKind::Int,
                actual: "string"
            }
        );
    }

    #[test]
    fn default_kind_not_checked_when_disabled() {
        let model = ModelType::builder("M")
            .with_config(BuilderConfig::new().with_check_kinds(false))
            .optional_kind("n", FieldKind::Int, "zero")
            .build();
        assert!(model.is_ok());
    }

    #[test]
    fn too_many_fields_rejected() {
        let err = ModelType::builder("M")
            .with_config(BuilderConfig::new().with_max_fields(1))
            .required("a")
            .required("b")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::TooManyFields {
                model: "M".into(),
                count: 2,
                max: 1
            }
        );
    }

    #[test]
    fn create_fills_defaults() {
        let rex = dog().create([("name", "Rex")]).unwrap();
        assert_eq!(rex.get("name"), Some(&Value::from("Rex")));
        assert_eq!(rex.get("dogdad"), Some(&Value::from("Pablo")));
    }

    #[test]
    fn create_reports_all_missing_required() {
        let model = ModelType::define(
            "CursorPosition",
            ["line_number", "offset"],
            Vec::<(&str, DefaultValue)>::new(),
        )
        .unwrap();
        let err = model.create_default().unwrap_err();
        assert_eq!(
            err,
            InstanceError::MissingRequiredField {
                model: "CursorPosition".into(),
                fields: vec!["line_number".into(), "offset".into()]
            }
        );
    }

    #[test]
    fn create_rejects_unknown_field() {
        let err = dog()
            .create([("name", Value::from("Rex")), ("unknown_field", Value::Int(1))])
            .unwrap_err();
        assert_eq!(
            err,
            InstanceError::UnknownField {
                model: "Dog".into(),
                field: "unknown_field".into()
            }
        );
    }

    #[test]
    fn create_rejects_duplicate_value() {
        let err = dog().create([("name", "Rex"), ("name", "Max")]).unwrap_err();
        assert!(matches!(err, InstanceError::DuplicateValue { .. }));
    }

    #[test]
    fn create_rejects_kind_mismatch() {
        let err = dog().create([("name", 7)]).unwrap_err();
        assert_eq!(
            err,
            InstanceError::KindMismatch {
                model: "Dog".into(),
                field: "name".into(),
                expected: FieldKind::String,
                actual: "int"
            }
        );
    }

    #[test]
    fn factory_default_checked_against_kind() {
        let model = ModelType::builder("M")
            .optional_with("tags", FieldKind::List, || Value::Int(0))
            .build()
            .unwrap();
        assert!(matches!(
            model.create_default(),
            Err(InstanceError::KindMismatch { .. })
        ));
    }

    #[test]
    fn empty_model_creates_empty_instance() {
        let model = ModelType::builder("Unit").build().unwrap();
        assert!(model.is_empty());
        assert!(model.create_default().unwrap().is_empty());
    }

    #[test]
    fn equality_by_shape() {
        assert_eq!(dog(), dog());
        let other = ModelType::builder("Dog").required("name").build().unwrap();
        assert_ne!(dog(), other);
        let a = dog();
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&dog()));
    }
}
