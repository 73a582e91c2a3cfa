//! Schema documents
//!
//! A schema document declares model types as data. The same structure is read
//! from TOML, JSON or YAML:
//!
//! ```toml
//! [[model]]
//! name = "Dog"
//!
//! [[model.field]]
//! name = "name"
//! kind = "string"
//!
//! [[model.field]]
//! name = "dogdad"
//! kind = "string"
//! default = "Pablo"
//! ```
//!
//! A field with a `default` is optional, one without is required. An explicit
//! `required` key must agree with that.

use crate::error::SchemaError;
use recordkit_model::{BuilderConfig, DefaultValue, FieldDescriptor, FieldKind, ModelType, Value};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaFormat {
    Toml,
    Json,
    Yaml,
}

impl SchemaFormat {
    /// Pick the format from a file extension
    ///
    /// # Errors
    /// Returns [`SchemaError::UnsupportedFormat`] for unknown or missing
    /// extensions
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(SchemaError::UnsupportedFormat(ext.to_string())),
        }
    }
}

/// Parsed schema document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default, rename = "model")]
    pub models: Vec<ModelSchema>,
}

/// One model declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub name: String,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldSchema>,
}

/// One field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// `None` when the key is absent; an explicit `null` is `Some(Value::Null)`
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl SchemaDocument {
    /// Parse a document in the given format
    ///
    /// # Errors
    /// Returns the format's parse error
    pub fn parse(content: &str, format: SchemaFormat) -> Result<Self, SchemaError> {
        let document = match format {
            SchemaFormat::Toml => toml::from_str(content)?,
            SchemaFormat::Json => serde_json::from_str(content)?,
            SchemaFormat::Yaml => serde_yaml::from_str(content)?,
        };
        Ok(document)
    }

    /// Read and parse a document, picking the format from the extension
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let format = SchemaFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
        Self::parse(&content, format)
    }

    /// Names of the declared models, in document order
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.name.as_str())
    }
}

impl ModelSchema {
    /// Compile into a model type
    ///
    /// Nested `model:<Name>` references are not resolved here; see
    /// [`ModelRegistry::load`](crate::ModelRegistry::load).
    ///
    /// # Errors
    /// - [`SchemaError::RequiredWithDefault`] / [`SchemaError::MissingDefault`]
    ///   if `required` disagrees with `default`
    /// - [`SchemaError::Definition`] if the model builder rejects the table
    pub fn to_model_type(&self, config: &BuilderConfig) -> Result<ModelType, SchemaError> {
        let mut builder = ModelType::builder(&self.name).with_config(config.clone());
        for field in &self.fields {
            builder = builder.field(field.to_descriptor(&self.name)?);
        }
        Ok(builder.build()?)
    }

    /// Models referenced by `model:<Name>` kinds, with the referring field
    pub fn references(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|f| match &f.kind {
            FieldKind::Model(target) => Some((f.name.as_str(), target.as_str())),
            _ => None,
        })
    }
}

impl FieldSchema {
    fn to_descriptor(&self, model: &str) -> Result<FieldDescriptor, SchemaError> {
        let descriptor = match (self.required, &self.default) {
            (Some(true), Some(_)) => {
                return Err(SchemaError::RequiredWithDefault {
                    model: model.to_string(),
                    field: self.name.clone(),
                })
            }
            (Some(false), None) => {
                return Err(SchemaError::MissingDefault {
                    model: model.to_string(),
                    field: self.name.clone(),
                })
            }
            (_, Some(default)) => {
                let default = match (&self.kind, default) {
                    // integer literals in float fields, as the codec accepts them
                    #[allow(clippy::cast_precision_loss)]
                    (FieldKind::Float, Value::Int(i)) => Value::Float(*i as f64),
                    _ => default.clone(),
                };
                FieldDescriptor::optional(&self.name, DefaultValue::literal(default))
            }
            (_, None) => FieldDescriptor::required(&self.name),
        };
        Ok(descriptor.with_kind(self.kind.clone()))
    }
}

impl From<&ModelType> for ModelSchema {
    /// Describe a model type as a schema; factory defaults are produced once
    /// to obtain a literal
    fn from(model: &ModelType) -> Self {
        let fields = model
            .fields()
            .map(|f| FieldSchema {
                name: f.name().to_string(),
                kind: f.kind().clone(),
                required: None,
                default: f.default().map(DefaultValue::produce),
            })
            .collect();
        Self {
            name: model.name().to_string(),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use recordkit_test_utils::{DOG_SCHEMA_JSON, DOG_SCHEMA_TOML, DOG_SCHEMA_YAML};

    #[test]
    fn format_from_extension() {
        assert_eq!(SchemaFormat::from_path(Path::new("a.toml")).unwrap(), SchemaFormat::Toml);
        assert_eq!(SchemaFormat::from_path(Path::new("a.JSON")).unwrap(), SchemaFormat::Json);
        assert_eq!(SchemaFormat::from_path(Path::new("a.yml")).unwrap(), SchemaFormat::Yaml);
        assert!(matches!(
            SchemaFormat::from_path(Path::new("a.md")),
            Err(SchemaError::UnsupportedFormat(ext)) if ext == "md"
        ));
        assert!(SchemaFormat::from_path(Path::new("schema")).is_err());
    }

    #[test]
    fn all_formats_parse_to_same_document() {
        let toml = SchemaDocument::parse(DOG_SCHEMA_TOML, SchemaFormat::Toml).unwrap();
        let json = SchemaDocument::parse(DOG_SCHEMA_JSON, SchemaFormat::Json).unwrap();
        let yaml = SchemaDocument::parse(DOG_SCHEMA_YAML, SchemaFormat::Yaml).unwrap();
        assert_eq!(toml, json);
        assert_eq!(toml, yaml);
        assert_eq!(toml.model_names().collect::<Vec<_>>(), vec!["Dog", "Owner"]);
    }

    #[test]
    fn model_schema_compiles() {
        let doc = SchemaDocument::parse(DOG_SCHEMA_TOML, SchemaFormat::Toml).unwrap();
        let dog = doc.models[0].to_model_type(&BuilderConfig::default()).unwrap();
        assert_eq!(dog.name(), "Dog");
        assert!(dog.field("name").unwrap().is_required());
        let rex = dog.create([("name", "Rex")]).unwrap();
        assert_eq!(rex.get("dogdad"), Some(&Value::from("Pablo")));
    }

    #[test]
    fn references_are_listed() {
        let doc = SchemaDocument::parse(DOG_SCHEMA_TOML, SchemaFormat::Toml).unwrap();
        assert_eq!(doc.models[1].references().collect::<Vec<_>>(), vec![("dog", "Dog")]);
        assert_eq!(doc.models[0].references().count(), 0);
    }

    #[test]
    fn required_with_default_rejected() {
        let doc = SchemaDocument::parse(
            r#"
            [[model]]
            name = "M"
            [[model.field]]
            name = "a"
            required = true
            default = 1
            "#,
            SchemaFormat::Toml,
        )
        .unwrap();
        assert!(matches!(
            doc.models[0].to_model_type(&BuilderConfig::default()),
            Err(SchemaError::RequiredWithDefault { .. })
        ));
    }

    #[test]
    fn optional_without_default_rejected() {
        let doc = SchemaDocument::parse(
            r#"{"model": [{"name": "M", "field": [{"name": "a", "required": false}]}]}"#,
            SchemaFormat::Json,
        )
        .unwrap();
        assert!(matches!(
            doc.models[0].to_model_type(&BuilderConfig::default()),
            Err(SchemaError::MissingDefault { .. })
        ));
    }

    #[test]
    fn builder_errors_surface() {
        let doc = SchemaDocument::parse(
            r#"{"model": [{"name": "M", "field": [{"name": "a"}, {"name": "a", "default": 1}]}]}"#,
            SchemaFormat::Json,
        )
        .unwrap();
        assert!(matches!(
            doc.models[0].to_model_type(&BuilderConfig::default()),
            Err(SchemaError::Definition(_))
        ));
    }

    #[test]
    fn invalid_kind_is_a_parse_error() {
        let result = SchemaDocument::parse(
            r#"{"model": [{"name": "M", "field": [{"name": "a", "kind": "number"}]}]}"#,
            SchemaFormat::Json,
        );
        assert!(matches!(result, Err(SchemaError::Json(_))));
    }

    #[test]
    fn null_default_makes_field_optional() {
        let doc = SchemaDocument::parse(
            r#"{"model": [{"name": "C", "field": [
                {"name": "w", "required": false, "default": null},
                {"name": "h", "default": null}
            ]}]}"#,
            SchemaFormat::Json,
        )
        .unwrap();
        assert_eq!(doc.models[0].fields[0].default, Some(Value::Null));
        let model = doc.models[0].to_model_type(&BuilderConfig::default()).unwrap();
        assert!(!model.field("w").unwrap().is_required());
        assert!(!model.field("h").unwrap().is_required());
        let c = model.create_default().unwrap();
        assert_eq!(c.get("w"), Some(&Value::Null));
    }

    #[test]
    fn yaml_tilde_default_is_null() {
        let doc = SchemaDocument::parse(
            "model:\n  - name: C\n    field:\n      - name: w\n        default: ~\n",
            SchemaFormat::Yaml,
        )
        .unwrap();
        assert_eq!(doc.models[0].fields[0].default, Some(Value::Null));
    }

    #[test]
    fn absent_default_stays_required() {
        let doc = SchemaDocument::parse(
            r#"{"model": [{"name": "C", "field": [{"name": "w"}]}]}"#,
            SchemaFormat::Json,
        )
        .unwrap();
        assert_eq!(doc.models[0].fields[0].default, None);
    }

    #[test]
    fn null_default_survives_json_round_trip() {
        let model = ModelType::builder("C")
            .required("title")
            .optional("width", Value::Null)
            .build()
            .unwrap();
        let document = SchemaDocument {
            models: vec![ModelSchema::from(&model)],
        };
        let json = serde_json::to_string(&document).unwrap();
        let reparsed = SchemaDocument::parse(&json, SchemaFormat::Json).unwrap();
        assert_eq!(reparsed, document);

        let rebuilt = reparsed.models[0]
            .to_model_type(&BuilderConfig::default())
            .unwrap();
        assert!(!rebuilt.field("width").unwrap().is_required());
        assert_eq!(rebuilt, model);
    }

    #[test]
    fn documents_round_trip_through_every_format() {
        let document = SchemaDocument::parse(DOG_SCHEMA_TOML, SchemaFormat::Toml).unwrap();

        let toml = toml::to_string(&document).unwrap();
        assert_eq!(SchemaDocument::parse(&toml, SchemaFormat::Toml).unwrap(), document);

        let json = serde_json::to_string_pretty(&document).unwrap();
        assert_eq!(SchemaDocument::parse(&json, SchemaFormat::Json).unwrap(), document);

        let yaml = serde_yaml::to_string(&document).unwrap();
        assert_eq!(SchemaDocument::parse(&yaml, SchemaFormat::Yaml).unwrap(), document);
    }

    #[test]
    fn integer_default_widens_for_float_field() {
        let doc = SchemaDocument::parse(
            r#"
            [[model]]
            name = "Point"
            [[model.field]]
            name = "x"
            kind = "float"
            default = 0
            "#,
            SchemaFormat::Toml,
        )
        .unwrap();
        let point = doc.models[0]
            .to_model_type(&BuilderConfig::default())
            .unwrap()
            .create_default()
            .unwrap();
        assert_eq!(point.get("x"), Some(&Value::Float(0.0)));
    }

    #[test]
    fn schema_from_model_type() {
        let schema = ModelSchema::from(&recordkit_test_utils::dog_model());
        assert_eq!(schema.name, "Dog");
        assert_eq!(schema.fields[1].default, Some(Value::from("Pablo")));
        let rebuilt = schema.to_model_type(&BuilderConfig::default()).unwrap();
        assert_eq!(rebuilt, recordkit_test_utils::dog_model());
    }
}
