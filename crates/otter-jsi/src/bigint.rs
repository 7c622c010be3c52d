//! Arbitrary-precision integers.
//!
//! Integers outside the safe double range travel as objects whose
//! `toString()`, `valueOf()` and `toJSON()` all return the exact decimal
//! string. The digits live on the object itself; the three methods are
//! created once per runtime and read them from `this`. Backends may also
//! hand out engine-native bigints through the same handle, which answer
//! `toString()` natively.

use crate::exception::{JsiNativeException, JsiResult};
use crate::function::Function;
use crate::object::{Object, object_subtype};
use crate::runtime::Runtime;
use crate::value::Value;

const CONVERSION_METHODS: [&str; 3] = ["toString", "valueOf", "toJSON"];

/// Property holding the decimal digits of a portable BigInt.
pub const DIGITS_PROPERTY: &str = "__bigintDigits";

#[derive(Debug)]
pub struct BigInt {
    object: Object,
}

object_subtype!(BigInt);

impl BigInt {
    /// Parse a decimal integer literal (optional leading `-`).
    pub fn from_decimal(rt: &dyn Runtime, digits: &str) -> Option<BigInt> {
        rt.create_big_int(digits)
    }

    pub fn from_i64(rt: &dyn Runtime, n: i64) -> Option<BigInt> {
        rt.create_big_int(&n.to_string())
    }

    pub fn from_u64(rt: &dyn Runtime, n: u64) -> Option<BigInt> {
        rt.create_big_int(&n.to_string())
    }

    /// Unchecked narrowing of an object built by [`BigInt::from_decimal`].
    pub fn from_object_unchecked(object: Object) -> BigInt {
        BigInt::from_object(object)
    }

    /// The exact decimal representation.
    pub fn to_decimal_string(&self, rt: &dyn Runtime) -> Option<String> {
        let to_string = self.get_property_as_function(rt, "toString")?;
        let result = to_string.call_with_this(rt, self, &[])?;
        result.as_string().map(|s| s.utf8(rt))
    }

    pub fn to_i64(&self, rt: &dyn Runtime) -> Option<i64> {
        self.to_decimal_string(rt)?.parse().ok()
    }
}

/// Canonical form of a decimal integer literal: no leading zeros, no `-0`.
/// `None` when `digits` is not an integer literal.
pub fn normalize_decimal(digits: &str) -> Option<String> {
    let (negative, body) = match digits.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, digits),
    };
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let body = body.trim_start_matches('0');
    if body.is_empty() {
        return Some("0".to_string());
    }
    Some(if negative {
        format!("-{body}")
    } else {
        body.to_string()
    })
}

/// Build the portable BigInt representation: a plain object carrying its
/// digits and the runtime's shared conversion methods.
///
/// Backends call this from `Runtime::create_big_int`.
pub fn create_big_int_object(rt: &dyn Runtime, digits: &str) -> Option<Object> {
    let digits = normalize_decimal(digits)?;
    let object = rt.create_object();
    if !object.set_property(rt, DIGITS_PROPERTY, &Value::from_utf8(rt, &digits)) {
        return None;
    }
    for method in CONVERSION_METHODS {
        let func = rt
            .core()
            .shared_function(rt, method, || Function::from_closure(rt, method, 0, read_digits))?;
        if !object.set_property(rt, method, &Value::from(func)) {
            return None;
        }
    }
    Some(object)
}

fn read_digits(rt: &dyn Runtime, this: &Value, _args: &[Value]) -> JsiResult<Value> {
    this.as_object()
        .and_then(|this| this.get_property(rt, DIGITS_PROPERTY))
        .filter(Value::is_string)
        .ok_or_else(|| {
            JsiNativeException::new("BigInt method called on an incompatible receiver").with_name("TypeError")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_decimal() {
        assert_eq!(normalize_decimal("9007199254740993").as_deref(), Some("9007199254740993"));
        assert_eq!(normalize_decimal("-0042").as_deref(), Some("-42"));
        assert_eq!(normalize_decimal("-0").as_deref(), Some("0"));
        assert_eq!(normalize_decimal("000").as_deref(), Some("0"));
    }

    #[test]
    fn test_normalize_rejects_non_integers() {
        assert!(normalize_decimal("").is_none());
        assert!(normalize_decimal("-").is_none());
        assert!(normalize_decimal("1.5").is_none());
        assert!(normalize_decimal("0x10").is_none());
        assert!(normalize_decimal("+1").is_none());
    }
}
