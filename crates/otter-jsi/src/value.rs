//! The `Value` sum type.

use std::fmt;

use crate::bigint::BigInt;
use crate::object::Object;
use crate::runtime::Runtime;
use crate::string::JsString;
use crate::symbol::Symbol;

/// Maximum magnitude of an integer that an IEEE-754 double holds exactly.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// A JavaScript value.
///
/// Primitive variants are stored inline. Heap variants own a handle whose
/// pointer keeps one engine reference alive; dropping the `Value` releases
/// it. Heap values are duplicated with [`Value::clone_in`], which asks the
/// runtime for another reference to the same engine value.
#[derive(Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Symbol(Symbol),
    String(JsString),
    Object(Object),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Symbol(s) => write!(f, "Symbol({:?})", s.pointer()),
            Value::String(s) => write!(f, "String({:?})", s.pointer()),
            Value::Object(o) => write!(f, "Object({:?})", o.pointer()),
        }
    }
}

impl Value {
    pub fn undefined() -> Self {
        Value::Undefined
    }

    pub fn null() -> Self {
        Value::Null
    }

    /// An integer as a `Number` when it fits in a double exactly, otherwise
    /// as a `BigInt` object. `None` only when the BigInt could not be built.
    pub fn from_i64(rt: &dyn Runtime, n: i64) -> Option<Value> {
        if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&n) {
            return Some(Value::Number(n as f64));
        }
        BigInt::from_i64(rt, n).map(|b| Value::Object(b.into_object()))
    }

    pub fn from_u64(rt: &dyn Runtime, n: u64) -> Option<Value> {
        match i64::try_from(n) {
            Ok(n) => Value::from_i64(rt, n),
            Err(_) => BigInt::from_u64(rt, n).map(|b| Value::Object(b.into_object())),
        }
    }

    pub fn from_utf8(rt: &dyn Runtime, s: &str) -> Value {
        Value::String(JsString::create_from_utf8(rt, s))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Value::Symbol(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&JsString> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<JsString> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// `typeof`-style name of the variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Symbol(_) => "symbol",
            Value::String(_) => "string",
            Value::Object(_) => "object",
        }
    }

    /// Another handle to the same value.
    pub fn clone_in(&self, rt: &dyn Runtime) -> Value {
        match self {
            Value::Undefined => Value::Undefined,
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(*b),
            Value::Number(n) => Value::Number(*n),
            Value::Symbol(s) => Value::Symbol(s.clone_in(rt)),
            Value::String(s) => Value::String(s.clone_in(rt)),
            Value::Object(o) => Value::Object(o.clone_in(rt)),
        }
    }

    /// `===`.
    pub fn strict_equals(rt: &dyn Runtime, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::Symbol(x), Value::Symbol(y)) => Symbol::strict_equals(rt, x, y),
            (Value::String(x), Value::String(y)) => JsString::strict_equals(rt, x, y),
            (Value::Object(x), Value::Object(y)) => Object::strict_equals(rt, x, y),
            _ => false,
        }
    }

    /// `String(value)`, evaluated by the engine's global `String` function.
    pub fn to_js_string(&self, rt: &dyn Runtime) -> Option<JsString> {
        match self {
            Value::String(s) => Some(s.clone_in(rt)),
            Value::Undefined => Some(JsString::create_from_ascii(rt, "undefined")),
            Value::Null => Some(JsString::create_from_ascii(rt, "null")),
            Value::Bool(b) => Some(JsString::create_from_ascii(rt, if *b { "true" } else { "false" })),
            _ => {
                let string_ctor = rt.global().get_property_as_function(rt, "String")?;
                string_ctor
                    .call(rt, std::slice::from_ref(self))?
                    .into_string()
            }
        }
    }

    /// Parse UTF-8 JSON into a value.
    pub fn create_from_json_utf8(rt: &dyn Runtime, json: &[u8]) -> Option<Value> {
        rt.create_value_from_json_utf8(json)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n.into())
    }
}

impl From<JsString> for Value {
    fn from(s: JsString) -> Self {
        Value::String(s)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}
