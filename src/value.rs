//! Attribute values.
//!
//! A `Value` is either plain structural data (a `serde_json::Value`) or a
//! shared nested object implementing [`Nested`]. "Undefined" is modelled as
//! `Option<Value>::None` throughout the crate.

use crate::error::AttrError;
use crate::model::Model;
use std::fmt;
use std::sync::Arc;

/// Arguments of a member invocation on a nested object.
///
/// `model` is the model instance on whose behalf the call happens, when
/// there is one (watchers and proxied methods pass it; direct calls may not).
#[derive(Clone, Copy)]
pub struct Call<'a> {
    pub args: &'a [Value],
    pub model: Option<&'a dyn Model>,
}

impl<'a> Call<'a> {
    /// A call with arguments and no invoking model.
    pub fn new(args: &'a [Value]) -> Self {
        Self { args, model: None }
    }

    /// Attach the invoking model.
    pub fn with_model(mut self, model: &'a dyn Model) -> Self {
        self.model = Some(model);
        self
    }

    /// Positional argument, if present.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}

/// Capability contract of a nested object stored inside an attribute.
///
/// Concrete value kinds (nested models, collections, references) implement
/// this. Every method has a conservative default so that implementors only
/// provide what their kind supports. Interior mutability is the
/// implementor's business; all methods take `&self`.
pub trait Nested: Send + Sync {
    /// Name of the value kind, used in diagnostics.
    fn kind(&self) -> &str;

    /// Read a property. `None` when the property does not exist.
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Write a property.
    fn set_property(&self, name: &str, _value: Value) -> Result<(), AttrError> {
        Err(AttrError::MissingMember {
            attribute: self.kind().to_string(),
            member: name.to_string(),
        })
    }

    /// Invoke a method. Returns `None` when the method does not exist.
    fn invoke(&self, _method: &str, _call: Call<'_>) -> Option<Result<Value, AttrError>> {
        None
    }

    /// The aggregate owning this object, if any.
    fn owner(&self) -> Option<Arc<dyn Nested>> {
        None
    }

    /// Whether this object emits events other models can listen to.
    fn is_triggerable(&self) -> bool {
        false
    }

    /// Own clone capability. `None` means the object has none and is shared
    /// by reference.
    fn clone_nested(&self, _deep: bool) -> Option<Value> {
        None
    }

    /// Own serialization capability.
    fn to_json(&self) -> Option<serde_json::Value> {
        None
    }
}

/// A value held by an attribute.
///
/// Equality is structural for data and identity for nested objects.
///
/// # Examples
///
/// ```rust
/// use attrkit::Value;
///
/// let a = Value::from(5);
/// assert_eq!(a, Value::from(5));
/// assert_eq!(a.as_f64(), Some(5.0));
/// assert!(Value::null().is_null());
/// ```
#[derive(Clone)]
pub enum Value {
    /// Plain structural data.
    Data(serde_json::Value),
    /// A shared nested object.
    Object(Arc<dyn Nested>),
}

impl Value {
    /// The `null` value.
    pub fn null() -> Self {
        Value::Data(serde_json::Value::Null)
    }

    /// Wrap a nested object.
    pub fn object(nested: impl Nested + 'static) -> Self {
        Value::Object(Arc::new(nested))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Data(serde_json::Value::Null))
    }

    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Data(data) => Some(data),
            Value::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn Nested>> {
        match self {
            Value::Object(nested) => Some(nested),
            Value::Data(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_data().and_then(serde_json::Value::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(serde_json::Value::as_str)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_data().and_then(serde_json::Value::as_bool)
    }

    /// Whether both values refer to the same nested object.
    pub fn same_object(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => same_nested(a, b),
            _ => false,
        }
    }
}

/// Identity comparison for nested objects, ignoring vtable pointers.
pub(crate) fn same_nested(a: &Arc<dyn Nested>, b: &Arc<dyn Nested>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Data(a), Value::Data(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => same_nested(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Data(data) => write!(f, "Data({})", data),
            Value::Object(nested) => write!(f, "Object(<{}>)", nested.kind()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(data: serde_json::Value) -> Self {
        Value::Data(data)
    }
}

impl From<Arc<dyn Nested>> for Value {
    fn from(nested: Arc<dyn Nested>) -> Self {
        Value::Object(nested)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Data(b.into())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Data(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Data(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Data(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Data(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Data(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Data(s.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Point;

    impl Nested for Point {
        fn kind(&self) -> &str {
            "Point"
        }
    }

    #[test]
    fn test_data_equality_is_structural() {
        assert_eq!(Value::from(json!({"a": [1, 2]})), Value::from(json!({"a": [1, 2]})));
        assert_ne!(Value::from(json!({"a": 1})), Value::from(json!({"a": 2})));
    }

    #[test]
    fn test_object_equality_is_identity() {
        let a = Value::object(Point);
        let b = Value::object(Point);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!(a.same_object(&a.clone()));
        assert!(!a.same_object(&Value::null()));
    }

    #[test]
    fn test_debug_shows_kind() {
        assert_eq!(format!("{:?}", Value::object(Point)), "Object(<Point>)");
        assert_eq!(format!("{:?}", Value::from("x")), "Data(\"x\")");
    }

    #[test]
    fn test_default_set_property_fails() {
        let err = Point.set_property("x", Value::from(1)).unwrap_err();
        assert!(matches!(err, AttrError::MissingMember { .. }));
    }
}
