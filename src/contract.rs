//! Value-kind contracts.
//!
//! A [`Contract`] is the capability record every concrete attribute kind
//! supplies: default cast, hooks, events, change detection, cloning,
//! validation, creation and serialization. Kinds override individual fields
//! of [`Contract::base`] rather than inheriting from it.
//!
//! A [`ValueType`] is a concrete value kind as seen by declarations: its
//! name, the members it exposes to proxying, how to construct an empty
//! instance, and (once attached) the contract describing its attributes.

use crate::attribute::Setup;
use crate::context::WriteContext;
use crate::error::AttrError;
use crate::hooks::{GetHook, HookResult, SetHook};
use crate::model::{EventMap, Model};
use crate::options::Options;
use crate::value::{same_nested, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Cast raw input to the attribute's kind.
pub type Cast =
    Arc<dyn Fn(Value, &WriteContext, &dyn Model, &str) -> Result<Value, AttrError> + Send + Sync>;

/// Change-detection predicate: `true` when `value` differs from the stored
/// value (`None` when nothing is stored yet).
pub type IsChanged = Arc<dyn Fn(&Value, Option<&Value>) -> bool + Send + Sync>;

/// Validator returning a failure message, `None` when valid.
pub type Validator = Arc<dyn Fn(&dyn Model, &Value, &str) -> Option<String> + Send + Sync>;

pub type CloneFn = Arc<dyn Fn(&Value, &WriteContext) -> Value + Send + Sync>;

pub type CreateFn = Arc<dyn Fn(&WriteContext) -> Value + Send + Sync>;

/// Serialize a value stored under `key`.
pub type ToJson = Arc<dyn Fn(&Value, &str) -> Value + Send + Sync>;

pub type Parse = Arc<dyn Fn(Value, &str) -> Result<Value, AttrError> + Send + Sync>;

/// Type-specific setup run once while an attribute is constructed.
pub type Initialize = Arc<dyn Fn(&mut Setup<'_>) + Send + Sync>;

/// Default change detection for typeless attributes.
///
/// Data compares structurally, with numbers compared by value so `6` and
/// `6.0` are equal. Nested objects compare by identity, and writing into an
/// empty slot is always a change.
///
/// # Examples
///
/// ```rust
/// use attrkit::contract::generic_is_changed;
/// use attrkit::Value;
///
/// assert!(!generic_is_changed(&Value::from(1), Some(&Value::from(1))));
/// assert!(!generic_is_changed(&Value::from(6), Some(&Value::from(6.0))));
/// assert!(generic_is_changed(&Value::from(1), Some(&Value::from(2))));
/// assert!(generic_is_changed(&Value::null(), None));
/// ```
pub fn generic_is_changed(value: &Value, prev: Option<&Value>) -> bool {
    match (value, prev) {
        (Value::Data(a), Some(Value::Data(b))) => !same_data(a, b),
        (Value::Object(a), Some(Value::Object(b))) => !same_nested(a, b),
        _ => true,
    }
}

fn same_data(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    use serde_json::Value as Json;

    match (a, b) {
        (Json::Number(x), Json::Number(y)) => x.as_f64() == y.as_f64(),
        (Json::Array(xs), Json::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_data(x, y))
        }
        (Json::Object(xs), Json::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| same_data(x, y)))
        }
        _ => a == b,
    }
}

/// Default clone: delegate to the object's own clone capability, otherwise
/// share it. Data is owned, so copying it is always structural.
fn generic_clone(value: &Value, ctx: &WriteContext) -> Value {
    match value {
        Value::Object(nested) => nested
            .clone_nested(ctx.deep())
            .unwrap_or_else(|| value.clone()),
        Value::Data(_) => value.clone(),
    }
}

fn generic_to_json(value: &Value, _key: &str) -> Value {
    match value {
        Value::Object(nested) => nested
            .to_json()
            .map(Value::Data)
            .unwrap_or_else(|| value.clone()),
        Value::Data(_) => value.clone(),
    }
}

/// Capability record of an attribute kind.
#[derive(Clone)]
pub struct Contract {
    pub(crate) name: String,
    pub(crate) cast: Option<Cast>,
    pub(crate) get: Option<GetHook>,
    pub(crate) set: Option<SetHook>,
    pub(crate) events: EventMap,
    pub(crate) system_events: EventMap,
    pub(crate) is_changed: IsChanged,
    pub(crate) clone: CloneFn,
    pub(crate) validate: Validator,
    pub(crate) create: Option<CreateFn>,
    pub(crate) to_json: ToJson,
    pub(crate) parse: Option<Parse>,
    pub(crate) initialize: Option<Initialize>,
}

impl Contract {
    /// The base contract used by typeless attributes.
    pub fn base() -> Self {
        Self {
            name: "Attribute".to_string(),
            cast: None,
            get: None,
            set: None,
            events: EventMap::new(),
            system_events: EventMap::new(),
            is_changed: Arc::new(generic_is_changed),
            clone: Arc::new(generic_clone),
            validate: Arc::new(|_: &dyn Model, _: &Value, _: &str| -> Option<String> { None }),
            create: None,
            to_json: Arc::new(generic_to_json),
            parse: None,
            initialize: None,
        }
    }

    /// Shared instance of [`Contract::base`].
    pub fn shared_base() -> Arc<Contract> {
        static BASE: OnceLock<Arc<Contract>> = OnceLock::new();
        BASE.get_or_init(|| Arc::new(Contract::base())).clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_cast<F>(mut self, cast: F) -> Self
    where
        F: Fn(Value, &WriteContext, &dyn Model, &str) -> Result<Value, AttrError>
            + Send
            + Sync
            + 'static,
    {
        self.cast = Some(Arc::new(cast));
        self
    }

    /// Default read hook, run before any user read hook.
    pub fn with_get<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Model, Value, &str) -> HookResult + Send + Sync + 'static,
    {
        self.get = Some(Arc::new(hook));
        self
    }

    /// Default write hook, run after every user write hook.
    pub fn with_set<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut dyn Model, Value, &str) -> HookResult + Send + Sync + 'static,
    {
        self.set = Some(Arc::new(hook));
        self
    }

    /// Class-level user events; attribute `events` merge into these.
    pub fn with_events(mut self, events: EventMap) -> Self {
        self.events.extend(events);
        self
    }

    pub fn with_system_events(mut self, events: EventMap) -> Self {
        self.system_events.extend(events);
        self
    }

    pub fn with_is_changed<F>(mut self, is_changed: F) -> Self
    where
        F: Fn(&Value, Option<&Value>) -> bool + Send + Sync + 'static,
    {
        self.is_changed = Arc::new(is_changed);
        self
    }

    pub fn with_clone<F>(mut self, clone: F) -> Self
    where
        F: Fn(&Value, &WriteContext) -> Value + Send + Sync + 'static,
    {
        self.clone = Arc::new(clone);
        self
    }

    pub fn with_validate<F>(mut self, validate: F) -> Self
    where
        F: Fn(&dyn Model, &Value, &str) -> Option<String> + Send + Sync + 'static,
    {
        self.validate = Arc::new(validate);
        self
    }

    pub fn with_create<F>(mut self, create: F) -> Self
    where
        F: Fn(&WriteContext) -> Value + Send + Sync + 'static,
    {
        self.create = Some(Arc::new(create));
        self
    }

    pub fn with_to_json<F>(mut self, to_json: F) -> Self
    where
        F: Fn(&Value, &str) -> Value + Send + Sync + 'static,
    {
        self.to_json = Arc::new(to_json);
        self
    }

    pub fn with_parse<F>(mut self, parse: F) -> Self
    where
        F: Fn(Value, &str) -> Result<Value, AttrError> + Send + Sync + 'static,
    {
        self.parse = Some(Arc::new(parse));
        self
    }

    pub fn with_initialize<F>(mut self, initialize: F) -> Self
    where
        F: Fn(&mut Setup<'_>) + Send + Sync + 'static,
    {
        self.initialize = Some(Arc::new(initialize));
        self
    }

    /// Make this contract the attribute contract of every given type.
    ///
    /// Once attached, declarations using the type (`ty.options()`,
    /// `ty.value(v)`, `ty.has()`, or an explicit `type` option) build their
    /// attributes from this contract.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use attrkit::contract::{Contract, ValueType};
    /// use std::sync::Arc;
    ///
    /// let contract = Arc::new(Contract::base().named("PointAttribute"));
    /// let mut point = ValueType::new("Point");
    /// contract.attach([&mut point]);
    ///
    /// let point = Arc::new(point);
    /// let attr = point.has().create_attribute("origin");
    /// assert_eq!(attr.contract().name(), "PointAttribute");
    /// ```
    pub fn attach<'a>(self: &Arc<Self>, types: impl IntoIterator<Item = &'a mut ValueType>) {
        for ty in types {
            ty.contract = Some(self.clone());
        }
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("name", &self.name)
            .field("cast", &self.cast.is_some())
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .field("system_events", &self.system_events.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// How a member of a value kind is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    /// A callable member.
    Method,
    /// A read/write accessor.
    Property,
}

/// A member a value kind makes available to proxying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
}

impl Member {
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method,
        }
    }

    pub fn property(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Property,
        }
    }
}

/// A concrete value kind.
#[derive(Clone)]
pub struct ValueType {
    name: String,
    members: Vec<Member>,
    construct: Option<CreateFn>,
    contract: Option<Arc<Contract>>,
}

impl ValueType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            construct: None,
            contract: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a callable member available to proxying.
    pub fn with_method(mut self, name: impl Into<String>) -> Self {
        self.members.push(Member::method(name));
        self
    }

    /// Declare an accessor member available to proxying.
    pub fn with_property(mut self, name: impl Into<String>) -> Self {
        self.members.push(Member::property(name));
        self
    }

    /// How to build an empty instance of this kind.
    pub fn with_constructor<F>(mut self, construct: F) -> Self
    where
        F: Fn(&WriteContext) -> Value + Send + Sync + 'static,
    {
        self.construct = Some(Arc::new(construct));
        self
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Build an empty instance, if the kind knows how.
    pub fn construct(&self, ctx: &WriteContext) -> Option<Value> {
        self.construct.as_ref().map(|construct| construct(ctx))
    }

    /// The attribute contract installed by [`Contract::attach`].
    pub fn contract(&self) -> Option<&Arc<Contract>> {
        self.contract.as_ref()
    }

    /// Builder pre-seeded with this type.
    pub fn options(self: &Arc<Self>) -> Options {
        Options::new().r#type(self.clone())
    }

    /// Alias of [`ValueType::options`].
    pub fn attribute(self: &Arc<Self>) -> Options {
        self.options()
    }

    /// Builder pre-seeded with this type and a default value.
    pub fn value(self: &Arc<Self>, value: impl Into<Value>) -> Options {
        self.options().value(value)
    }

    /// Zero-configuration builder for this type.
    pub fn has(self: &Arc<Self>) -> Options {
        self.options()
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueType")
            .field("name", &self.name)
            .field("members", &self.members)
            .field("contract", &self.contract.as_ref().map(|c| c.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Nested;
    use serde_json::json;

    struct Doc {
        deep_copies: bool,
    }

    impl Nested for Doc {
        fn kind(&self) -> &str {
            "Doc"
        }

        fn clone_nested(&self, deep: bool) -> Option<Value> {
            Some(Value::object(Doc { deep_copies: deep }))
        }

        fn to_json(&self) -> Option<serde_json::Value> {
            Some(json!({"deep": self.deep_copies}))
        }
    }

    struct Opaque;

    impl Nested for Opaque {
        fn kind(&self) -> &str {
            "Opaque"
        }
    }

    #[test]
    fn test_generic_is_changed_objects() {
        let a = Value::object(Opaque);
        assert!(!generic_is_changed(&a, Some(&a.clone())));
        assert!(generic_is_changed(&a, Some(&Value::object(Opaque))));
        assert!(generic_is_changed(&a, Some(&Value::null())));
    }

    #[test]
    fn test_generic_is_changed_numbers() {
        assert!(!generic_is_changed(&Value::from(6), Some(&Value::from(6.0))));
        assert!(!generic_is_changed(
            &Value::Data(json!({"a": [1, {"b": 2}]})),
            Some(&Value::Data(json!({"a": [1.0, {"b": 2.0}]})))
        ));
        assert!(generic_is_changed(
            &Value::Data(json!([1, 2])),
            Some(&Value::Data(json!([1, 2, 3])))
        ));
        assert!(generic_is_changed(
            &Value::Data(json!({"a": 1})),
            Some(&Value::Data(json!({"b": 1})))
        ));
        assert!(generic_is_changed(&Value::from(6), Some(&Value::from("6"))));
    }

    #[test]
    fn test_generic_clone_delegates() {
        let doc = Value::object(Doc { deep_copies: false });
        let copy = generic_clone(&doc, &WriteContext::deep_copy());
        assert!(!copy.same_object(&doc));
        assert_eq!(
            generic_to_json(&copy, "doc"),
            Value::from(json!({"deep": true}))
        );
    }

    #[test]
    fn test_generic_clone_shares_opaque() {
        let opaque = Value::object(Opaque);
        let copy = generic_clone(&opaque, &WriteContext::new());
        assert!(copy.same_object(&opaque));
        assert!(generic_to_json(&opaque, "o").same_object(&opaque));
    }

    #[test]
    fn test_generic_clone_data() {
        let data = Value::from(json!({"list": [1, 2, 3]}));
        assert_eq!(generic_clone(&data, &WriteContext::deep_copy()), data);
        assert_eq!(generic_to_json(&data, "d"), data);
    }

    #[test]
    fn test_attach_installs_back_reference() {
        let contract = Arc::new(Contract::base().named("Custom"));
        let mut a = ValueType::new("A");
        let mut b = ValueType::new("B");
        contract.attach([&mut a, &mut b]);

        assert_eq!(a.contract().map(|c| c.name()), Some("Custom"));
        assert_eq!(b.contract().map(|c| c.name()), Some("Custom"));
    }

    #[test]
    fn test_value_type_members() {
        let ty = ValueType::new("Cart")
            .with_method("total")
            .with_property("size");
        assert_eq!(ty.member("total").map(|m| m.kind), Some(MemberKind::Method));
        assert_eq!(ty.member("size").map(|m| m.kind), Some(MemberKind::Property));
        assert!(ty.member("missing").is_none());
        assert!(ty.construct(&WriteContext::new()).is_none());
    }
}
