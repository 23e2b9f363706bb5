//! Built-in primitive value kinds.
//!
//! `string`, `number` and `boolean` are the kinds the `typeOrValue`
//! shortcut infers from a bare default value. Their casts follow the usual
//! loose conversions (`"5"` → `5`, `0` → `false`, `true` → `"true"`);
//! `null` passes through every primitive cast unchanged so attributes stay
//! nullable.

use crate::contract::{Contract, ValueType};
use crate::value::Value;
use serde_json::Value as Json;
use std::sync::{Arc, OnceLock};

/// Largest integer a double represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

pub fn string() -> Arc<ValueType> {
    static STRING: OnceLock<Arc<ValueType>> = OnceLock::new();
    STRING
        .get_or_init(|| primitive("String", cast_string, Json::from("")))
        .clone()
}

pub fn number() -> Arc<ValueType> {
    static NUMBER: OnceLock<Arc<ValueType>> = OnceLock::new();
    NUMBER
        .get_or_init(|| primitive("Number", cast_number, Json::from(0)))
        .clone()
}

pub fn boolean() -> Arc<ValueType> {
    static BOOLEAN: OnceLock<Arc<ValueType>> = OnceLock::new();
    BOOLEAN
        .get_or_init(|| primitive("Boolean", cast_boolean, Json::from(false)))
        .clone()
}

fn primitive(name: &str, cast: fn(Value) -> Value, empty: Json) -> Arc<ValueType> {
    let created = empty.clone();
    let contract = Arc::new(
        Contract::base()
            .named(format!("{name}Attribute"))
            .with_cast(move |value, _, _, _| Ok(cast(value)))
            .with_create(move |_| Value::Data(created.clone())),
    );

    let mut ty = ValueType::new(name).with_constructor(move |_| Value::Data(empty.clone()));
    contract.attach([&mut ty]);
    Arc::new(ty)
}

/// Convert to a number. Unparseable input becomes `null`.
///
/// # Examples
///
/// ```rust
/// use attrkit::primitives::cast_number;
/// use attrkit::Value;
///
/// assert_eq!(cast_number(Value::from("5")), Value::from(5));
/// assert_eq!(cast_number(Value::from(" 2.5 ")), Value::from(2.5));
/// assert_eq!(cast_number(Value::from(true)), Value::from(1));
/// assert!(cast_number(Value::from("five")).is_null());
/// ```
pub fn cast_number(value: Value) -> Value {
    let n = match &value {
        Value::Data(Json::Null) => return value,
        Value::Data(Json::Number(n)) => n.as_f64(),
        Value::Data(Json::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse::<f64>().ok()
            }
        }
        Value::Data(Json::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    match n.filter(|n| n.is_finite()) {
        // Integral numbers are stored as integers so equality does not
        // depend on how the input was spelled.
        Some(n) if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER => Value::from(n as i64),
        Some(n) => Value::from(n),
        None => Value::null(),
    }
}

/// Convert to a string.
pub fn cast_string(value: Value) -> Value {
    let s = match &value {
        Value::Data(Json::Null) | Value::Data(Json::String(_)) => return value,
        Value::Data(Json::Number(n)) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER => (f as i64).to_string(),
            _ => n.to_string(),
        },
        Value::Data(Json::Bool(b)) => b.to_string(),
        Value::Data(data) => data.to_string(),
        Value::Object(nested) => nested
            .to_json()
            .map(|json| json.to_string())
            .unwrap_or_else(|| nested.kind().to_string()),
    };
    Value::from(s)
}

/// Convert to a boolean by truthiness.
pub fn cast_boolean(value: Value) -> Value {
    let b = match &value {
        Value::Data(Json::Null) | Value::Data(Json::Bool(_)) => return value,
        Value::Data(Json::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::Data(Json::String(s)) => !s.is_empty(),
        Value::Data(_) | Value::Object(_) => true,
    };
    Value::from(b)
}
