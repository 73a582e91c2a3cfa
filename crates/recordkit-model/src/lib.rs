//! recordkit Model System
//!
//! Immutable, structurally validated records compiled from field tables.
//!
//! # Core Concepts
//!
//! - [`FieldDescriptor`]: name, requiredness, default and kind of one field
//! - [`ModelType`]: compiled field table; creates instances
//! - [`ModelInstance`]: immutable record with structural equality
//! - [`Value`]: dynamic field value backed by persistent collections
//! - [`define_model!`]: typed struct per model with generated accessors
//! - [`InstanceHash`] / [`InstanceDelta`]: content hashing and field diffs
//!
//! # Example
//!
//! ```rust
//! use recordkit_model::{FieldKind, ModelType, Value};
//!
//! let dog = ModelType::builder("Dog")
//!     .required_kind("name", FieldKind::String)
//!     .optional_kind("dogdad", FieldKind::String, "Pablo")
//!     .build()
//!     .unwrap();
//!
//! let rex = dog.create([("name", "Rex")]).unwrap();
//! let adopted = rex.with_field("dogdad", "Sam").unwrap();
//!
//! assert_eq!(rex.get("dogdad"), Some(&Value::from("Pablo")));
//! assert_eq!(adopted.get("dogdad"), Some(&Value::from("Sam")));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod config;
mod delta;
mod error;
mod field;
mod hash;
mod instance;
mod macros;
mod model_type;
mod path;
mod value;

// Re-exports
pub use config::BuilderConfig;
pub use delta::{DeltaError, FieldChange, InstanceDelta};
pub use error::{DefinitionError, InstanceError, ModelError};
pub use field::{is_valid_field_name, DefaultValue, FieldDescriptor, Presence};
pub use hash::{HashError, InstanceHash};
pub use instance::ModelInstance;
pub use model_type::{ModelBuilder, ModelType};
pub use path::{FieldPath, PathError};
pub use value::{FieldKind, KindParseError, ModelValue, Value};

/// Support items for [`define_model!`]; not a stable API.
#[doc(hidden)]
pub mod __private {
    pub use super::macros::extract;
    pub use once_cell::sync::OnceCell;
}

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for defining and using models
    pub use crate::{
        define_model, DefaultValue, FieldDescriptor, FieldKind, InstanceError, ModelInstance,
        ModelType, ModelValue, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn full_model_lifecycle() {
        // Define
        let position = ModelType::builder("CursorPosition")
            .required_kind("line_number", FieldKind::Int)
            .required_kind("offset", FieldKind::Int)
            .build()
            .unwrap();

        // Create and read
        let pos = position
            .create([("line_number", 3), ("offset", 10)])
            .unwrap();
        assert_eq!(pos.field("line_number").unwrap(), &Value::Int(3));
        assert_eq!(pos.field("offset").unwrap(), &Value::Int(10));

        // Derive and diff
        let moved = pos.with_field("offset", 11).unwrap();
        let delta = InstanceDelta::between(&pos, &moved).unwrap();
        assert_eq!(delta.len(), 1);
        assert_eq!(delta.apply(&pos).unwrap(), moved);
        assert_ne!(pos.content_hash(), moved.content_hash());
    }

    #[test]
    fn factory_defaults_are_fresh_per_instance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let model = ModelType::builder("Dashboard")
            .required_kind("title", FieldKind::String)
            .optional_with("widgets", FieldKind::List, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Value::list(Vec::<Value>::new())
            })
            .build()
            .unwrap();

        let a = model.create([("title", "a")]).unwrap();
        let b = model.create([("title", "b")]).unwrap();
        let _c = model
            .create([("title", Value::from("c")), ("widgets", Value::list([1]))])
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let mut widgets = a.field("widgets").unwrap().as_list().unwrap().clone();
        widgets.push_back(Value::from("chart"));
        let a = a.with_field("widgets", Value::List(widgets)).unwrap();
        assert_eq!(a.field("widgets").unwrap().as_list().unwrap().len(), 1);
        assert!(b.field("widgets").unwrap().as_list().unwrap().is_empty());
    }

    #[test]
    fn shared_across_threads() {
        let model = ModelType::builder("Counter")
            .required_kind("n", FieldKind::Int)
            .build()
            .unwrap();
        let base = model.create([("n", 0)]).unwrap();

        let handles: Vec<_> = (0..4_i64)
            .map(|i| {
                let base = base.clone();
                thread::spawn(move || base.with_field("n", i).unwrap())
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let derived = handle.join().unwrap();
            assert_eq!(derived.get("n"), Some(&Value::Int(i as i64)));
        }
        assert_eq!(base.get("n"), Some(&Value::Int(0)));
    }
}
