//! Marshaling between `serde_json` documents and engine values.

use crate::array::Array;
use crate::bigint::BigInt;
use crate::exception::JsiNativeException;
use crate::object::Object;
use crate::runtime::Runtime;
use crate::value::{MAX_SAFE_INTEGER, Value};

/// Nesting limit for both directions. Deeper input (or a cycle) fails.
pub const MAX_JSON_DEPTH: usize = 128;

/// Parse UTF-8 JSON and build the value through the handle API.
///
/// Syntax errors are reported to the runtime's exception handler as a
/// `SyntaxError` and yield `None`.
pub fn parse_json_utf8(rt: &dyn Runtime, json: &[u8]) -> Option<Value> {
    match serde_json::from_slice::<serde_json::Value>(json) {
        Ok(document) => Value::from_json(rt, &document),
        Err(err) => {
            rt.report_jsi_exception(
                &JsiNativeException::new(format!("Invalid JSON: {err}")).with_name("SyntaxError"),
            );
            None
        }
    }
}

impl Value {
    /// Build an engine value from a JSON document. Integers outside the safe
    /// double range become BigInt objects.
    pub fn from_json(rt: &dyn Runtime, json: &serde_json::Value) -> Option<Value> {
        from_json_at(rt, json, 0)
    }

    /// Convert to a JSON document with `JSON.stringify` semantics:
    /// `toJSON()` is honoured, functions, symbols and `undefined` are
    /// skipped in objects and become `null` in arrays, non-finite numbers
    /// become `null`. `None` for values that have no JSON form at the top
    /// level, or when nesting exceeds [`MAX_JSON_DEPTH`].
    pub fn to_json(&self, rt: &dyn Runtime) -> Option<serde_json::Value> {
        to_json_at(rt, self, 0)
    }
}

fn from_json_at(rt: &dyn Runtime, json: &serde_json::Value, depth: usize) -> Option<Value> {
    if depth > MAX_JSON_DEPTH {
        return None;
    }
    Some(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from_i64(rt, i)?
            } else if let Some(u) = n.as_u64() {
                Value::from_u64(rt, u)?
            } else {
                Value::Number(n.as_f64()?)
            }
        }
        serde_json::Value::String(s) => Value::from_utf8(rt, s),
        serde_json::Value::Array(items) => {
            let array = Array::new(rt, items.len())?;
            for (index, item) in items.iter().enumerate() {
                let element = from_json_at(rt, item, depth + 1)?;
                if !array.set_value_at_index(rt, index, &element) {
                    return None;
                }
            }
            array.into()
        }
        serde_json::Value::Object(fields) => {
            let object = Object::new(rt);
            for (key, field) in fields {
                let element = from_json_at(rt, field, depth + 1)?;
                if !object.set_property(rt, key, &element) {
                    return None;
                }
            }
            Value::Object(object)
        }
    })
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER as f64 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

fn to_json_at(rt: &dyn Runtime, value: &Value, depth: usize) -> Option<serde_json::Value> {
    if depth > MAX_JSON_DEPTH {
        tracing::warn!(depth, "JSON conversion exceeded the nesting limit");
        return None;
    }
    match value {
        Value::Undefined | Value::Symbol(_) => None,
        Value::Null => Some(serde_json::Value::Null),
        Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
        Value::Number(n) => Some(number_to_json(*n)),
        Value::String(s) => Some(serde_json::Value::String(s.utf8(rt))),
        Value::Object(object) => object_to_json(rt, object, depth),
    }
}

fn object_to_json(rt: &dyn Runtime, object: &Object, depth: usize) -> Option<serde_json::Value> {
    if object.is_function(rt) {
        return None;
    }

    if object.is_big_int(rt) {
        let big = BigInt::from_object_unchecked(object.clone_in(rt));
        return big.to_decimal_string(rt).map(serde_json::Value::String);
    }

    if let Some(to_json) = object.get_property_as_function(rt, "toJSON") {
        let replacement = to_json.call_with_this(rt, object, &[])?;
        return to_json_at(rt, &replacement, depth + 1);
    }

    if object.is_array(rt) {
        let array = object.clone_in(rt).get_array(rt);
        let mut items = Vec::with_capacity(array.size(rt));
        for element in array.to_vec(rt) {
            items.push(to_json_at(rt, &element, depth + 1).unwrap_or(serde_json::Value::Null));
        }
        return Some(serde_json::Value::Array(items));
    }

    let mut fields = serde_json::Map::new();
    let names = object.get_property_names(rt)?;
    for name in names.to_vec(rt) {
        let Some(key) = name.as_string().map(|s| s.utf8(rt)) else {
            continue;
        };
        let Some(field) = object.get_property(rt, &key) else {
            continue;
        };
        if let Some(json) = to_json_at(rt, &field, depth + 1) {
            fields.insert(key, json);
        }
    }
    Some(serde_json::Value::Object(fields))
}
