//! Testing utilities for recordkit workspace
//!
//! Shared model fixtures, sample schema documents and proptest strategies.

#![allow(missing_docs)]

use proptest::prelude::*;
use recordkit_model::{FieldKind, ModelInstance, ModelType, Value};

pub fn dog_model() -> ModelType {
    ModelType::builder("Dog")
        .required_kind("name", FieldKind::String)
        .optional_kind("dogdad", FieldKind::String, "Pablo")
        .build()
        .unwrap()
}

pub fn cursor_position_model() -> ModelType {
    ModelType::builder("CursorPosition")
        .required_kind("lineNumber", FieldKind::Int)
        .required_kind("offset", FieldKind::Int)
        .build()
        .unwrap()
}

pub fn owner_model() -> ModelType {
    ModelType::builder("Owner")
        .required_kind("name", FieldKind::String)
        .required_kind("dog", FieldKind::Model("Dog".to_string()))
        .optional_kind("city", FieldKind::String, "Lisbon")
        .build()
        .unwrap()
}

/// Model whose optional `widgets` list is produced by a factory
pub fn dashboard_model() -> ModelType {
    ModelType::builder("Dashboard")
        .required_kind("title", FieldKind::String)
        .optional_with("widgets", FieldKind::List, || Value::List(im::Vector::new()))
        .optional_with("filters", FieldKind::Map, || Value::Map(im::OrdMap::new()))
        .build()
        .unwrap()
}

pub fn create_dog(name: &str) -> ModelInstance {
    dog_model().create([("name", name)]).unwrap()
}

pub fn create_owner(name: &str, dog: ModelInstance) -> ModelInstance {
    owner_model()
        .create([("name", Value::from(name)), ("dog", Value::Model(dog))])
        .unwrap()
}

pub const DOG_SCHEMA_TOML: &str = r#"
[[model]]
name = "Dog"

[[model.field]]
name = "name"
kind = "string"

[[model.field]]
name = "dogdad"
kind = "string"
default = "Pablo"

[[model]]
name = "Owner"

[[model.field]]
name = "name"
kind = "string"
required = true

[[model.field]]
name = "dog"
kind = "model:Dog"

[[model.field]]
name = "city"
kind = "string"
default = "Lisbon"
"#;

pub const DOG_SCHEMA_JSON: &str = r#"{
  "model": [
    {
      "name": "Dog",
      "field": [
        { "name": "name", "kind": "string" },
        { "name": "dogdad", "kind": "string", "default": "Pablo" }
      ]
    },
    {
      "name": "Owner",
      "field": [
        { "name": "name", "kind": "string", "required": true },
        { "name": "dog", "kind": "model:Dog" },
        { "name": "city", "kind": "string", "default": "Lisbon" }
      ]
    }
  ]
}"#;

pub const DOG_SCHEMA_YAML: &str = r#"
model:
  - name: Dog
    field:
      - name: name
        kind: string
      - name: dogdad
        kind: string
        default: Pablo
  - name: Owner
    field:
      - name: name
        kind: string
        required: true
      - name: dog
        kind: "model:Dog"
      - name: city
        kind: string
        default: Lisbon
"#;

/// Scalar values (no lists, maps or models)
pub fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>().prop_map(Value::Float),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::from),
    ]
}

/// Arbitrary values nested up to three levels deep
pub fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|items| Value::List(items.into_iter().collect())),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|entries| Value::Map(entries.into_iter().collect())),
        ]
    })
}

/// Valid `Dog` inputs: a name and maybe a dogdad
pub fn arb_dog_input() -> impl Strategy<Value = (String, Option<String>)> {
    ("[A-Z][a-z]{0,8}", proptest::option::of("[A-Z][a-z]{0,8}"))
}

/// A field name of the `Dog` model
pub fn arb_dog_field() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("name"), Just("dogdad")]
}
