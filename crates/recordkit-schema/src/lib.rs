//! recordkit Schema Layer
//!
//! Declares model types as data and moves instances in and out of JSON.
//!
//! - [`SchemaDocument`]: TOML, JSON or YAML list of models and fields
//! - [`ModelRegistry`]: concurrent name -> model type map, loaded from documents
//! - [`codec`]: JSON encoding and registry-driven decoding of instances
//!
//! # Example
//!
//! ```rust
//! use recordkit_schema::{codec, ModelRegistry, SchemaFormat};
//!
//! let registry = ModelRegistry::new();
//! registry
//!     .load_str(
//!         r#"{"model": [{"name": "Dog", "field": [
//!             {"name": "name", "kind": "string"},
//!             {"name": "dogdad", "kind": "string", "default": "Pablo"}
//!         ]}]}"#,
//!         SchemaFormat::Json,
//!     )
//!     .unwrap();
//!
//! let rex = codec::decode_named("Dog", &registry, &serde_json::json!({"name": "Rex"})).unwrap();
//! assert_eq!(rex.get("dogdad").and_then(|v| v.as_str()), Some("Pablo"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod codec;
mod document;
mod error;
mod registry;

pub use document::{FieldSchema, ModelSchema, SchemaDocument, SchemaFormat};
pub use error::{CodecError, SchemaError};
pub use registry::ModelRegistry;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
