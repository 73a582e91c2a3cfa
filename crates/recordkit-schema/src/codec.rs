//! JSON codec for model instances
//!
//! Instances encode as JSON objects with fields in declaration order. Decoding
//! is driven by the target model: fields of kind `model:<Name>` are resolved
//! through a [`ModelRegistry`], and integers are widened for `float` fields.

use crate::error::CodecError;
use crate::registry::ModelRegistry;
use recordkit_model::{FieldKind, ModelInstance, ModelType, Value};
use serde_json::Value as Json;

/// Encode an instance as a JSON object
///
/// # Errors
/// Returns [`CodecError::NonFiniteFloat`] for NaN or infinite floats, which
/// JSON would otherwise turn into `null`
pub fn encode(instance: &ModelInstance) -> Result<Json, CodecError> {
    check_finite(instance)?;
    Ok(serde_json::to_value(instance)?)
}

/// Encode an instance as a pretty-printed JSON string
///
/// # Errors
/// Same as [`encode`]
pub fn encode_string(instance: &ModelInstance) -> Result<String, CodecError> {
    check_finite(instance)?;
    Ok(serde_json::to_string_pretty(instance)?)
}

fn check_finite(instance: &ModelInstance) -> Result<(), CodecError> {
    match instance
        .iter()
        .find_map(|(name, value)| non_finite_path(value, name))
    {
        Some(path) => Err(CodecError::NonFiniteFloat(path)),
        None => Ok(()),
    }
}

/// Path of the first NaN or infinite float inside `value`
fn non_finite_path(value: &Value, path: &str) -> Option<String> {
    match value {
        Value::Float(f) if !f.is_finite() => Some(path.to_string()),
        Value::List(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| non_finite_path(item, &format!("{path}[{i}]"))),
        Value::Map(entries) => entries
            .iter()
            .find_map(|(key, item)| non_finite_path(item, &format!("{path}.{key}"))),
        Value::Model(nested) => nested
            .iter()
            .find_map(|(name, item)| non_finite_path(item, &format!("{path}.{name}"))),
        _ => None,
    }
}

/// Decode a JSON object into an instance of `model`
///
/// Construction rules are the same as [`ModelType::create`]: unknown keys,
/// missing required fields and kind mismatches are errors.
///
/// # Errors
/// - [`CodecError::ExpectedObject`] if `json` is not an object
/// - [`CodecError::UnknownModel`] if a nested model is not registered
/// - [`CodecError::UnsupportedNumber`] for integers beyond `i64`
/// - [`CodecError::Instance`] if construction fails
pub fn decode(
    model: &ModelType,
    registry: &ModelRegistry,
    json: &Json,
) -> Result<ModelInstance, CodecError> {
    let Json::Object(object) = json else {
        return Err(CodecError::ExpectedObject {
            model: model.name().to_string(),
            actual: json_kind(json),
        });
    };

    let mut values = Vec::with_capacity(object.len());
    for (name, raw) in object {
        let value = match model.field(name) {
            Some(field) => decode_with_kind(field.kind(), registry, raw)?,
            // left for create() to report
            None => decode_value(raw)?,
        };
        values.push((name.as_str(), value));
    }
    Ok(model.create(values)?)
}

/// Decode a JSON object into an instance of the registered model `name`
///
/// # Errors
/// Returns [`CodecError::UnknownModel`] if `name` is not registered, and
/// everything [`decode`] returns
pub fn decode_named(
    name: &str,
    registry: &ModelRegistry,
    json: &Json,
) -> Result<ModelInstance, CodecError> {
    let model = registry
        .get(name)
        .ok_or_else(|| CodecError::UnknownModel(name.to_string()))?;
    decode(&model, registry, json)
}

/// Parse and decode a JSON string
///
/// # Errors
/// Returns JSON syntax errors and everything [`decode`] returns
pub fn decode_str(
    model: &ModelType,
    registry: &ModelRegistry,
    input: &str,
) -> Result<ModelInstance, CodecError> {
    let json: Json = serde_json::from_str(input)?;
    decode(model, registry, &json)
}

/// Convert a JSON value for field `name` of `model`
///
/// Used to build replacements for [`ModelInstance::with_fields`]. Names not in
/// the model convert without a kind and are rejected by the derivation.
///
/// # Errors
/// Returns [`CodecError::UnknownModel`] and [`CodecError::UnsupportedNumber`]
/// as [`decode`] does
pub fn decode_field(
    model: &ModelType,
    registry: &ModelRegistry,
    name: &str,
    json: &Json,
) -> Result<Value, CodecError> {
    match model.field(name) {
        Some(field) => decode_with_kind(field.kind(), registry, json),
        None => decode_value(json),
    }
}

/// Convert a JSON value without a declared kind
///
/// Objects become [`Value::Map`].
///
/// # Errors
/// Returns [`CodecError::UnsupportedNumber`] for integers beyond `i64`
pub fn decode_value(json: &Json) -> Result<Value, CodecError> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if n.is_u64() {
                return Err(CodecError::UnsupportedNumber(n.to_string()));
            } else {
                n.as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| CodecError::UnsupportedNumber(n.to_string()))?
            }
        }
        Json::String(s) => Value::from(s.as_str()),
        Json::Array(items) => Value::List(items.iter().map(decode_value).collect::<Result<_, _>>()?),
        Json::Object(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
                .collect::<Result<_, CodecError>>()?,
        ),
    })
}

fn decode_with_kind(
    kind: &FieldKind,
    registry: &ModelRegistry,
    json: &Json,
) -> Result<Value, CodecError> {
    match (kind, json) {
        (FieldKind::Model(name), Json::Object(_)) => {
            Ok(Value::Model(decode_named(name, registry, json)?))
        }
        (FieldKind::Float, Json::Number(n)) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| CodecError::UnsupportedNumber(n.to_string())),
        _ => decode_value(json),
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
