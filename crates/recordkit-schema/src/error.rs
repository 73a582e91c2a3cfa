//! Error types for schema loading and instance codecs

use recordkit_model::{DefinitionError, InstanceError};
use std::path::PathBuf;

/// Errors while loading schema documents into a registry
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// No format registered for file extension
    #[error("unsupported schema format: '{0}' (expected toml, json, yaml or yml)")]
    UnsupportedFormat(String),

    /// Field marked required but given a default
    #[error("model '{model}': required field '{field}' cannot have a default")]
    RequiredWithDefault { model: String, field: String },

    /// Field marked optional but given no default
    #[error("model '{model}': optional field '{field}' needs a default")]
    MissingDefault { model: String, field: String },

    /// `model:<Name>` kind refers to a model that is not known
    #[error("model '{model}': field '{field}' refers to unknown model '{target}'")]
    UnknownModel {
        model: String,
        field: String,
        target: String,
    },

    /// Model name already registered
    #[error("model '{0}' is already registered")]
    DuplicateModel(String),

    /// Field table rejected by the model builder
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

impl SchemaError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors while encoding or decoding instances
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Instance input was not a JSON object
    #[error("model '{model}': expected a JSON object, got {actual}")]
    ExpectedObject { model: String, actual: &'static str },

    /// Nested model kind refers to a model missing from the registry
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    /// Integer outside the signed 64-bit range
    #[error("unsupported number: {0}")]
    UnsupportedNumber(String),

    /// NaN or infinite float, which JSON cannot represent
    #[error("non-finite float at '{0}' cannot be encoded as JSON")]
    NonFiniteFloat(String),

    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
