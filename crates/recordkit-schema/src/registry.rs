//! Model registry
//!
//! Provides [`ModelRegistry`], a concurrent name -> [`ModelType`] map filled
//! from schema documents or by hand.

use crate::document::{SchemaDocument, SchemaFormat};
use crate::error::SchemaError;
use dashmap::DashMap;
use recordkit_model::{BuilderConfig, ModelType};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Registry of model types by name
///
/// Reads and inserts may happen from several threads. Loading a document is
/// all-or-nothing: when any model in it fails, nothing is registered.
///
/// Lookups go straight to the map. Writers take a single lock, so the
/// duplicate checks of a load and its inserts see the same registry.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: DashMap<String, ModelType>,
    config: BuilderConfig,
    writer: Mutex<()>,
}

impl ModelRegistry {
    /// Create empty registry with default builder settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty registry compiling documents with `config`
    #[must_use]
    pub fn with_config(config: BuilderConfig) -> Self {
        Self {
            models: DashMap::new(),
            config,
            writer: Mutex::new(()),
        }
    }

    /// The guarded state is `()`, so a poisoned lock leaves nothing broken
    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builder settings applied to loaded documents
    #[inline]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Register a model type under its name
    ///
    /// # Errors
    /// Returns [`SchemaError::DuplicateModel`] if the name is taken
    pub fn register(&self, model: ModelType) -> Result<(), SchemaError> {
        let _writer = self.write_lock();
        self.insert_new(model)
    }

    fn insert_new(&self, model: ModelType) -> Result<(), SchemaError> {
        use dashmap::mapref::entry::Entry;

        match self.models.entry(model.name().to_string()) {
            Entry::Occupied(entry) => Err(SchemaError::DuplicateModel(entry.key().clone())),
            Entry::Vacant(entry) => {
                tracing::debug!(model = %model.name(), "registered model type");
                entry.insert(model);
                Ok(())
            }
        }
    }

    /// Look up a model type
    pub fn get(&self, name: &str) -> Option<ModelType> {
        self.models.get(name).map(|entry| entry.value().clone())
    }

    /// Check if a model is registered
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Registered model names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of registered models
    #[inline]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if registry is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Compile and register every model of a document
    ///
    /// Returns the names of the new models in document order.
    ///
    /// # Errors
    /// - [`SchemaError::DuplicateModel`] if a name repeats in the document or
    ///   is already registered
    /// - [`SchemaError::UnknownModel`] if a `model:<Name>` kind refers to a
    ///   model neither in the document nor in the registry
    /// - any error from compiling a model
    pub fn load(&self, document: &SchemaDocument) -> Result<Vec<String>, SchemaError> {
        let _writer = self.write_lock();
        let mut declared = HashSet::new();
        for name in document.model_names() {
            if !declared.insert(name) || self.contains(name) {
                return Err(SchemaError::DuplicateModel(name.to_string()));
            }
        }

        for model in &document.models {
            for (field, target) in model.references() {
                if !declared.contains(target) && !self.contains(target) {
                    return Err(SchemaError::UnknownModel {
                        model: model.name.clone(),
                        field: field.to_string(),
                        target: target.to_string(),
                    });
                }
            }
        }

        let compiled = document
            .models
            .iter()
            .map(|m| m.to_model_type(&self.config))
            .collect::<Result<Vec<_>, _>>()?;

        let mut names = Vec::with_capacity(compiled.len());
        for model in compiled {
            names.push(model.name().to_string());
            self.insert_new(model)?;
        }
        tracing::debug!(count = names.len(), "loaded schema document");
        Ok(names)
    }

    /// Parse and load a document
    ///
    /// # Errors
    /// Returns parse errors and everything [`load`](Self::load) returns
    pub fn load_str(&self, content: &str, format: SchemaFormat) -> Result<Vec<String>, SchemaError> {
        self.load(&SchemaDocument::parse(content, format)?)
    }

    /// Read, parse and load a document file
    ///
    /// # Errors
    /// Returns IO and parse errors and everything [`load`](Self::load) returns
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Vec<String>, SchemaError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading schema file");
        self.load(&SchemaDocument::from_file(path)?)
    }
}
