//! Attribute options builder.
//!
//! [`Options`] accumulates the configuration of one attribute through
//! chained calls and is consumed by [`Options::create_attribute`]. Most
//! options overwrite (last write wins); `get` and `set` hooks accumulate,
//! `events` merge, and `check` wraps the previous validator.
//!
//! Declarations can also be given as data through an [`OptionSpec`]. Each
//! key is looked up in [`OPTION_TABLE`], which maps option names to typed
//! handlers; unknown keys are rejected.

use crate::attribute::Attribute;
use crate::contract::{Cast, CloneFn, Contract, CreateFn, Parse, ToJson, ValueType, Validator};
use crate::context::WriteContext;
use crate::error::AttrError;
use crate::hooks::{GetHook, HookResult, SetHook};
use crate::model::{EventMap, Model};
use crate::name::AttrName;
use crate::primitives;
use crate::reference::{self, WatcherRef};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Which members of a nested value are proxied onto the host model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Proxy {
    /// Every member the value kind declares.
    All,
    /// An explicit allow-list.
    Members(Vec<String>),
}

impl From<bool> for Proxy {
    fn from(_: bool) -> Self {
        Proxy::All
    }
}

impl From<&str> for Proxy {
    /// Parse a space-separated allow-list. An empty list proxies everything.
    fn from(names: &str) -> Self {
        let members: Vec<String> = names.split_whitespace().map(str::to_string).collect();
        if members.is_empty() {
            Proxy::All
        } else {
            Proxy::Members(members)
        }
    }
}

impl From<String> for Proxy {
    fn from(names: String) -> Self {
        Proxy::from(names.as_str())
    }
}

/// A bare type or a bare default value, from which options are inferred.
#[derive(Clone)]
pub enum TypeOrValue {
    Type(Arc<ValueType>),
    Value(Value),
}

impl From<Arc<ValueType>> for TypeOrValue {
    fn from(ty: Arc<ValueType>) -> Self {
        TypeOrValue::Type(ty)
    }
}

macro_rules! type_or_value_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for TypeOrValue {
                fn from(value: $source) -> Self {
                    TypeOrValue::Value(Value::from(value))
                }
            }
        )*
    };
}

type_or_value_from!(Value, bool, i32, i64, u64, f64, &str, String);

/// Value of one entry of an [`OptionSpec`].
#[derive(Clone)]
pub enum OptionValue {
    Text(String),
    Value(Value),
    Type(Arc<ValueType>),
    TypeOrValue(TypeOrValue),
    Cast(Cast),
    Create(CreateFn),
    Parse(Parse),
    Clone(CloneFn),
    ToJson(ToJson),
    Validate(Validator),
    Get(GetHook),
    Set(SetHook),
    Events(EventMap),
    Proxy(Proxy),
    Watcher(WatcherRef),
}

impl OptionValue {
    fn variant(&self) -> &'static str {
        match self {
            OptionValue::Text(_) => "Text",
            OptionValue::Value(_) => "Value",
            OptionValue::Type(_) => "Type",
            OptionValue::TypeOrValue(_) => "TypeOrValue",
            OptionValue::Cast(_) => "Cast",
            OptionValue::Create(_) => "Create",
            OptionValue::Parse(_) => "Parse",
            OptionValue::Clone(_) => "Clone",
            OptionValue::ToJson(_) => "ToJson",
            OptionValue::Validate(_) => "Validate",
            OptionValue::Get(_) => "Get",
            OptionValue::Set(_) => "Set",
            OptionValue::Events(_) => "Events",
            OptionValue::Proxy(_) => "Proxy",
            OptionValue::Watcher(_) => "Watcher",
        }
    }
}

impl fmt::Debug for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Text(text) => write!(f, "Text({text:?})"),
            OptionValue::Value(value) => write!(f, "Value({value:?})"),
            OptionValue::Type(ty) => write!(f, "Type({})", ty.name()),
            OptionValue::Proxy(proxy) => write!(f, "Proxy({proxy:?})"),
            OptionValue::Watcher(watcher) => write!(f, "Watcher({watcher:?})"),
            other => write!(f, "{}(..)", other.variant()),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(text: &str) -> Self {
        OptionValue::Text(text.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(text: String) -> Self {
        OptionValue::Text(text)
    }
}

impl From<Value> for OptionValue {
    fn from(value: Value) -> Self {
        OptionValue::Value(value)
    }
}

impl From<Arc<ValueType>> for OptionValue {
    fn from(ty: Arc<ValueType>) -> Self {
        OptionValue::Type(ty)
    }
}

impl From<TypeOrValue> for OptionValue {
    fn from(type_or_value: TypeOrValue) -> Self {
        OptionValue::TypeOrValue(type_or_value)
    }
}

impl From<EventMap> for OptionValue {
    fn from(events: EventMap) -> Self {
        OptionValue::Events(events)
    }
}

impl From<Proxy> for OptionValue {
    fn from(proxy: Proxy) -> Self {
        OptionValue::Proxy(proxy)
    }
}

impl From<WatcherRef> for OptionValue {
    fn from(watcher: WatcherRef) -> Self {
        OptionValue::Watcher(watcher)
    }
}

/// Declarative option spec: ordered `(key, value)` entries.
///
/// # Examples
///
/// ```rust
/// use attrkit::options::{create_options, OptionSpec, TypeOrValue};
///
/// let spec = OptionSpec::new()
///     .with("typeOrValue", TypeOrValue::from(10))
///     .with("changeEvents", "change:size");
/// let attr = create_options(spec).unwrap().create_attribute("size");
///
/// assert_eq!(attr.value_type().map(|t| t.name()), Some("Number"));
/// assert_eq!(attr.trigger_when_changed(), Some("change:size"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OptionSpec {
    entries: Vec<(String, OptionValue)>,
}

impl OptionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Handler applying one option entry to a builder.
pub type OptionHandler = fn(&mut Options, OptionValue) -> Result<(), AttrError>;

fn expects(option: &'static str, expected: &'static str) -> AttrError {
    AttrError::OptionType { option, expected }
}

/// Every key accepted by [`Options::options`], with its handler.
pub const OPTION_TABLE: &[(&str, OptionHandler)] = &[
    ("name", |o, v| match v {
        OptionValue::Text(name) => {
            o.name = Some(name);
            Ok(())
        }
        _ => Err(expects("name", "text")),
    }),
    ("value", |o, v| match v {
        OptionValue::Value(value) => {
            o.value = Some(value);
            Ok(())
        }
        OptionValue::Text(text) => {
            o.value = Some(Value::from(text));
            Ok(())
        }
        _ => Err(expects("value", "a value")),
    }),
    ("type", |o, v| match v {
        OptionValue::Type(ty) => {
            o.ty = Some(ty);
            Ok(())
        }
        _ => Err(expects("type", "a value type")),
    }),
    ("cast", |o, v| match v {
        OptionValue::Cast(cast) => {
            o.cast = Some(cast);
            Ok(())
        }
        _ => Err(expects("cast", "a cast function")),
    }),
    ("create", |o, v| match v {
        OptionValue::Create(create) => {
            o.create = Some(create);
            Ok(())
        }
        _ => Err(expects("create", "a create function")),
    }),
    ("parse", |o, v| match v {
        OptionValue::Parse(parse) => {
            o.parse = Some(parse);
            Ok(())
        }
        _ => Err(expects("parse", "a parse function")),
    }),
    ("clone", |o, v| match v {
        OptionValue::Clone(clone) => {
            o.clone = Some(clone);
            Ok(())
        }
        _ => Err(expects("clone", "a clone function")),
    }),
    ("toJSON", |o, v| match v {
        OptionValue::ToJson(to_json) => {
            o.to_json = Some(to_json);
            Ok(())
        }
        _ => Err(expects("toJSON", "a serialization function")),
    }),
    ("validate", |o, v| match v {
        OptionValue::Validate(validate) => {
            o.validate = Some(validate);
            Ok(())
        }
        _ => Err(expects("validate", "a validator")),
    }),
    ("triggerWhenChanged", |o, v| match v {
        OptionValue::Text(events) => {
            o.trigger_when_changed = Some(events);
            Ok(())
        }
        _ => Err(expects("triggerWhenChanged", "event names")),
    }),
    ("changeEvents", |o, v| match v {
        OptionValue::Text(events) => {
            o.change_events = Some(events);
            Ok(())
        }
        _ => Err(expects("changeEvents", "event names")),
    }),
    ("get", |o, v| match v {
        OptionValue::Get(hook) => {
            o.get.insert(0, hook);
            Ok(())
        }
        _ => Err(expects("get", "a read hook")),
    }),
    ("set", |o, v| match v {
        OptionValue::Set(hook) => {
            o.set.push(hook);
            Ok(())
        }
        _ => Err(expects("set", "a write hook")),
    }),
    ("events", |o, v| match v {
        OptionValue::Events(events) => {
            o.merge_events(events);
            Ok(())
        }
        _ => Err(expects("events", "an event map")),
    }),
    ("proxy", |o, v| match v {
        OptionValue::Proxy(proxy) => {
            o.proxy = Some(proxy);
            Ok(())
        }
        OptionValue::Text(names) => {
            o.proxy = Some(Proxy::from(names));
            Ok(())
        }
        _ => Err(expects("proxy", "a proxy rule")),
    }),
    ("watcher", |o, v| match v {
        OptionValue::Watcher(watcher) => o.add_watcher(watcher),
        OptionValue::Text(path) => o.add_watcher(WatcherRef::Path(path)),
        other => Err(AttrError::wrong_watcher(
            format!("{other:?}"),
            "unrecognized watcher",
        )),
    }),
];

/// Builder for one attribute declaration.
///
/// # Examples
///
/// ```rust
/// use attrkit::{Options, Value};
///
/// let attr = Options::new()
///     .value(1)
///     .set(|_, v: Value, _| Ok(v.as_f64().map(|n| Value::from(n.max(0.0)))))
///     .check(|_, v, _| v.as_f64().map_or(false, |n| n < 100.0), "too large")
///     .create_attribute("level");
///
/// assert_eq!(attr.name().as_str(), "level");
/// assert!(attr.has_set_hook());
/// ```
pub struct Options {
    pub(crate) name: Option<String>,
    pub(crate) value: Option<Value>,
    pub(crate) ty: Option<Arc<ValueType>>,
    pub(crate) cast: Option<Cast>,
    pub(crate) create: Option<CreateFn>,
    pub(crate) parse: Option<Parse>,
    pub(crate) clone: Option<CloneFn>,
    pub(crate) to_json: Option<ToJson>,
    pub(crate) validate: Option<Validator>,
    pub(crate) trigger_when_changed: Option<String>,
    pub(crate) change_events: Option<String>,
    pub(crate) get: Vec<GetHook>,
    pub(crate) set: Vec<SetHook>,
    pub(crate) events: Option<EventMap>,
    pub(crate) proxy: Option<Proxy>,
    synthesize_proxy_events: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            name: None,
            value: None,
            ty: None,
            cast: None,
            create: None,
            parse: None,
            clone: None,
            to_json: None,
            validate: None,
            trigger_when_changed: None,
            change_events: None,
            get: Vec::new(),
            set: Vec::new(),
            events: None,
            proxy: None,
            synthesize_proxy_events: true,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options inferred from a bare type or default value.
    ///
    /// Strings, numbers and booleans pick the matching primitive kind;
    /// any other value becomes a typeless default.
    pub fn from_type_or_value(type_or_value: impl Into<TypeOrValue>) -> Self {
        match type_or_value.into() {
            TypeOrValue::Type(ty) => Self::new().r#type(ty),
            TypeOrValue::Value(value) => {
                let primitive = match value.as_data() {
                    Some(serde_json::Value::String(_)) => Some(primitives::string()),
                    Some(serde_json::Value::Number(_)) => Some(primitives::number()),
                    Some(serde_json::Value::Bool(_)) => Some(primitives::boolean()),
                    _ => None,
                };
                match primitive {
                    Some(ty) => Self::new().r#type(ty).value(value),
                    None => Self::new().value(value),
                }
            }
        }
    }

    /// Options from a declarative spec.
    ///
    /// A `typeOrValue` entry is rewritten into explicit `type`/`value`
    /// options first; the remaining entries are then applied in order.
    pub fn from_spec(spec: OptionSpec) -> Result<Self, AttrError> {
        let mut seed = None;
        let mut rest = OptionSpec::new();
        for (key, value) in spec.entries {
            if key != "typeOrValue" {
                rest.entries.push((key, value));
                continue;
            }
            seed = Some(match value {
                OptionValue::TypeOrValue(type_or_value) => type_or_value,
                OptionValue::Type(ty) => TypeOrValue::Type(ty),
                OptionValue::Value(value) => TypeOrValue::Value(value),
                OptionValue::Text(text) => TypeOrValue::Value(Value::from(text)),
                _ => return Err(expects("typeOrValue", "a type or a value")),
            });
        }

        let options = match seed {
            Some(type_or_value) => Self::from_type_or_value(type_or_value),
            None => Self::new(),
        };
        options.options(rest)
    }

    /// Apply a spec entry by entry through [`OPTION_TABLE`].
    pub fn options(mut self, spec: OptionSpec) -> Result<Self, AttrError> {
        for (key, value) in spec.entries {
            let (_, apply) = OPTION_TABLE
                .iter()
                .find(|(name, _)| *name == key)
                .ok_or_else(|| AttrError::UnknownOption(key.clone()))?;
            apply(&mut self, value)?;
        }
        Ok(self)
    }

    /// Alias of [`Options::options`].
    pub fn attribute(self, spec: OptionSpec) -> Result<Self, AttrError> {
        self.options(spec)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Default value.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn r#type(mut self, ty: Arc<ValueType>) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn cast<F>(mut self, cast: F) -> Self
    where
        F: Fn(Value, &WriteContext, &dyn Model, &str) -> Result<Value, AttrError>
            + Send
            + Sync
            + 'static,
    {
        self.cast = Some(Arc::new(cast));
        self
    }

    pub fn create<F>(mut self, create: F) -> Self
    where
        F: Fn(&WriteContext) -> Value + Send + Sync + 'static,
    {
        self.create = Some(Arc::new(create));
        self
    }

    pub fn parse<F>(mut self, parse: F) -> Self
    where
        F: Fn(Value, &str) -> Result<Value, AttrError> + Send + Sync + 'static,
    {
        self.parse = Some(Arc::new(parse));
        self
    }

    /// The `clone` option.
    pub fn clone_with<F>(mut self, clone: F) -> Self
    where
        F: Fn(&Value, &WriteContext) -> Value + Send + Sync + 'static,
    {
        self.clone = Some(Arc::new(clone));
        self
    }

    pub fn to_json<F>(mut self, to_json: F) -> Self
    where
        F: Fn(&Value, &str) -> Value + Send + Sync + 'static,
    {
        self.to_json = Some(Arc::new(to_json));
        self
    }

    pub fn validate<F>(mut self, validate: F) -> Self
    where
        F: Fn(&dyn Model, &Value, &str) -> Option<String> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(validate));
        self
    }

    pub fn trigger_when_changed(mut self, events: impl Into<String>) -> Self {
        self.trigger_when_changed = Some(events.into());
        self
    }

    pub fn change_events(mut self, events: impl Into<String>) -> Self {
        self.change_events = Some(events.into());
        self
    }

    /// Add a read hook. The latest one added runs first.
    pub fn get<F>(self, hook: F) -> Self
    where
        F: Fn(&dyn Model, Value, &str) -> HookResult + Send + Sync + 'static,
    {
        self.get_hook(Arc::new(hook))
    }

    pub fn get_hook(mut self, hook: GetHook) -> Self {
        self.get.insert(0, hook);
        self
    }

    /// Add a write hook. Hooks run in registration order.
    pub fn set<F>(self, hook: F) -> Self
    where
        F: Fn(&mut dyn Model, Value, &str) -> HookResult + Send + Sync + 'static,
    {
        self.set_hook(Arc::new(hook))
    }

    pub fn set_hook(mut self, hook: SetHook) -> Self {
        self.set.push(hook);
        self
    }

    /// Merge event handlers; same-named events are replaced.
    pub fn events(mut self, events: EventMap) -> Self {
        self.merge_events(events);
        self
    }

    /// Add a validator that runs after the current one.
    ///
    /// The first failure wins. An empty `message` reports
    /// `"<name> is not valid"`.
    pub fn check<F>(mut self, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&dyn Model, &Value, &str) -> bool + Send + Sync + 'static,
    {
        let message = message.into();
        let check: Validator = Arc::new(move |model: &dyn Model, value: &Value, name: &str| {
            if predicate(model, value, name) {
                None
            } else if message.is_empty() {
                Some(format!("{name} is not valid"))
            } else {
                Some(message.clone())
            }
        });

        self.validate = Some(match self.validate.take() {
            Some(prev) => Arc::new(move |model: &dyn Model, value: &Value, name: &str| {
                prev(model, value, name).or_else(|| check(model, value, name))
            }),
            None => check,
        });
        self
    }

    /// Register a watcher as a write hook.
    ///
    /// Fails with [`AttrError::WrongWatcher`] when a path cannot be parsed.
    pub fn watcher(mut self, watcher: impl Into<WatcherRef>) -> Result<Self, AttrError> {
        self.add_watcher(watcher.into())?;
        Ok(self)
    }

    /// Proxy members of the nested value onto the host model.
    pub fn proxy(mut self, proxy: impl Into<Proxy>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Whether a string `proxy` without an explicit `triggerWhenChanged`
    /// synthesizes `change:<member>` events. On by default.
    pub fn synthesize_proxy_events(mut self, enabled: bool) -> Self {
        self.synthesize_proxy_events = enabled;
        self
    }

    /// Finalize into an attribute named `name`.
    pub fn create_attribute(mut self, name: impl Into<AttrName>) -> Attribute {
        let name = name.into();
        let contract = self
            .ty
            .as_ref()
            .and_then(|ty| ty.contract().cloned())
            .unwrap_or_else(Contract::shared_base);

        if self.trigger_when_changed.is_none() {
            self.trigger_when_changed = self.change_events.clone();
        }

        if self.synthesize_proxy_events && self.trigger_when_changed.is_none() {
            if let Some(Proxy::Members(members)) = &self.proxy {
                let events = members
                    .iter()
                    .map(|member| format!("change:{member}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                warn!(attribute = %name, %events, "synthesized triggerWhenChanged from proxy list");
                self.trigger_when_changed = Some(events);
            }
        }

        Attribute::new(name, self, contract)
    }

    fn merge_events(&mut self, events: EventMap) {
        self.events.get_or_insert_with(EventMap::new).extend(events);
    }

    fn add_watcher(&mut self, watcher: WatcherRef) -> Result<(), AttrError> {
        let hook = reference::resolve(watcher)?;
        self.set.push(hook);
        Ok(())
    }
}

/// Seed a builder from a declarative spec.
pub fn create_options(spec: OptionSpec) -> Result<Options, AttrError> {
    Options::from_spec(spec)
}

/// Either a builder or a type/value shortcut.
pub enum Declaration {
    Options(Options),
    Shortcut(TypeOrValue),
}

impl From<Options> for Declaration {
    fn from(options: Options) -> Self {
        Declaration::Options(options)
    }
}

impl From<TypeOrValue> for Declaration {
    fn from(type_or_value: TypeOrValue) -> Self {
        Declaration::Shortcut(type_or_value)
    }
}

impl From<Arc<ValueType>> for Declaration {
    fn from(ty: Arc<ValueType>) -> Self {
        Declaration::Shortcut(TypeOrValue::Type(ty))
    }
}

impl From<Value> for Declaration {
    fn from(value: Value) -> Self {
        Declaration::Shortcut(TypeOrValue::Value(value))
    }
}

/// Finalize a builder or a shortcut into an attribute.
///
/// # Examples
///
/// ```rust
/// use attrkit::{create, primitives, Options, Value};
///
/// let flag = create(Value::from(true), "enabled");
/// assert_eq!(flag.value_type().map(|t| t.name()), Some("Boolean"));
///
/// let label = create(Options::new().value("x"), "label");
/// assert!(label.value_type().is_none());
///
/// let count = create(primitives::number(), "count");
/// assert_eq!(count.contract().name(), "NumberAttribute");
/// ```
pub fn create(declaration: impl Into<Declaration>, name: impl Into<AttrName>) -> Attribute {
    let options = match declaration.into() {
        Declaration::Options(options) => options,
        Declaration::Shortcut(type_or_value) => Options::from_type_or_value(type_or_value),
    };
    options.create_attribute(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{events, ClassSpec, Record};

    fn record() -> Record {
        Record::new(Arc::new(ClassSpec::new("Test")))
    }

    #[test]
    fn test_proxy_from() {
        assert_eq!(Proxy::from(true), Proxy::All);
        assert_eq!(Proxy::from(false), Proxy::All);
        assert_eq!(Proxy::from(""), Proxy::All);
        assert_eq!(
            Proxy::from("total  size"),
            Proxy::Members(vec!["total".into(), "size".into()])
        );
    }

    #[test]
    fn test_type_or_value_inference() {
        let s = Options::from_type_or_value("hi");
        assert_eq!(s.ty.as_ref().map(|t| t.name()), Some("String"));
        assert_eq!(s.value, Some(Value::from("hi")));

        let n = Options::from_type_or_value(3);
        assert_eq!(n.ty.as_ref().map(|t| t.name()), Some("Number"));

        let b = Options::from_type_or_value(false);
        assert_eq!(b.ty.as_ref().map(|t| t.name()), Some("Boolean"));

        let data = Options::from_type_or_value(Value::from(serde_json::json!([1, 2])));
        assert!(data.ty.is_none());
        assert!(data.value.is_some());

        let typed = Options::from_type_or_value(primitives::number());
        assert_eq!(typed.ty.as_ref().map(|t| t.name()), Some("Number"));
        assert!(typed.value.is_none());
    }

    #[test]
    fn test_simple_options_last_write_wins() {
        let o = Options::new()
            .value(1)
            .value(2)
            .trigger_when_changed("a")
            .trigger_when_changed("b");
        assert_eq!(o.value, Some(Value::from(2)));
        assert_eq!(o.trigger_when_changed.as_deref(), Some("b"));
    }

    #[test]
    fn test_events_merge() {
        let o = Options::new()
            .events(events("change", |_: &mut dyn Model, _: &[Value]| Ok(())))
            .events(events("remove", |_: &mut dyn Model, _: &[Value]| Ok(())))
            .events(events("change", |_: &mut dyn Model, _: &[Value]| Ok(())));
        let keys: Vec<_> = o.events.unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["change", "remove"]);
    }

    #[test]
    fn test_check_chaining() {
        let o = Options::new()
            .check(|_, v, _| v.as_f64().map_or(false, |n| n > 0.0), "m1")
            .check(|_, v, _| v.as_f64().map_or(false, |n| n < 10.0), "m2");
        let validate = o.validate.unwrap();
        let model = record();

        assert_eq!(validate(&model, &Value::from(-5), "n"), Some("m1".into()));
        assert_eq!(validate(&model, &Value::from(-50), "n"), Some("m1".into()));
        assert_eq!(validate(&model, &Value::from(50), "n"), Some("m2".into()));
        assert_eq!(validate(&model, &Value::from(5), "n"), None);
    }

    #[test]
    fn test_check_default_message() {
        let validate = Options::new()
            .check(|_, _, _| false, "")
            .validate
            .unwrap();
        assert_eq!(
            validate(&record(), &Value::null(), "email"),
            Some("email is not valid".into())
        );
    }

    #[test]
    fn test_check_wraps_explicit_validator() {
        let validate = Options::new()
            .validate(|_, _, _| Some("first".into()))
            .check(|_, _, _| false, "second")
            .validate
            .unwrap();
        assert_eq!(validate(&record(), &Value::null(), "x"), Some("first".into()));
    }

    #[test]
    fn test_watcher_errors() {
        let err = Options::new().watcher("a..b").err().unwrap();
        assert!(matches!(err, AttrError::WrongWatcher { .. }));

        let err = Options::new()
            .options(OptionSpec::new().with("watcher", Value::from(5)))
            .err()
            .unwrap();
        assert!(matches!(err, AttrError::WrongWatcher { .. }));
    }

    #[test]
    fn test_watcher_registers_set_hook() {
        let o = Options::new().watcher("^onChange").unwrap();
        assert_eq!(o.set.len(), 1);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let err = Options::new()
            .options(OptionSpec::new().with("colour", "red"))
            .err()
            .unwrap();
        assert_eq!(err, AttrError::UnknownOption("colour".into()));
    }

    #[test]
    fn test_option_type_mismatch() {
        let err = Options::new()
            .options(OptionSpec::new().with("type", "Number"))
            .err()
            .unwrap();
        assert_eq!(
            err,
            AttrError::OptionType {
                option: "type",
                expected: "a value type"
            }
        );
    }

    #[test]
    fn test_table_applies_hooks_in_order() {
        let a: SetHook = Arc::new(|_: &mut dyn Model, v: Value, _: &str| Ok(Some(v)));
        let b: SetHook = Arc::new(|_: &mut dyn Model, v: Value, _: &str| Ok(Some(v)));
        let g1: GetHook = Arc::new(|_: &dyn Model, v: Value, _: &str| Ok(Some(v)));
        let g2: GetHook = Arc::new(|_: &dyn Model, v: Value, _: &str| Ok(Some(v)));

        let o = Options::new()
            .options(
                OptionSpec::new()
                    .with("set", OptionValue::Set(a.clone()))
                    .with("set", OptionValue::Set(b.clone()))
                    .with("get", OptionValue::Get(g1.clone()))
                    .with("get", OptionValue::Get(g2.clone())),
            )
            .unwrap();

        assert!(Arc::ptr_eq(&o.set[0], &a));
        assert!(Arc::ptr_eq(&o.set[1], &b));
        assert!(Arc::ptr_eq(&o.get[0], &g2));
        assert!(Arc::ptr_eq(&o.get[1], &g1));
    }

    #[test]
    fn test_from_spec_keeps_other_entries() {
        let o = Options::from_spec(
            OptionSpec::new()
                .with("typeOrValue", Value::from("draft"))
                .with("name", "status"),
        )
        .unwrap();
        assert_eq!(o.ty.as_ref().map(|t| t.name()), Some("String"));
        assert_eq!(o.value, Some(Value::from("draft")));
        assert_eq!(o.name.as_deref(), Some("status"));
    }

    #[test]
    fn test_every_table_key_is_unique() {
        let mut keys: Vec<_> = OPTION_TABLE.iter().map(|(k, _)| *k).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), OPTION_TABLE.len());
    }

    #[test]
    fn test_change_events_copied() {
        let attr = Options::new()
            .change_events("change:inner")
            .create_attribute("inner");
        assert_eq!(attr.trigger_when_changed(), Some("change:inner"));

        let attr = Options::new()
            .trigger_when_changed("explicit")
            .change_events("ignored")
            .create_attribute("inner");
        assert_eq!(attr.trigger_when_changed(), Some("explicit"));
    }

    #[test]
    fn test_proxy_synthesizes_trigger_when_changed() {
        let attr = Options::new().proxy("total size").create_attribute("cart");
        assert_eq!(
            attr.trigger_when_changed(),
            Some("change:total change:size")
        );

        let attr = Options::new()
            .proxy("total")
            .trigger_when_changed("custom")
            .create_attribute("cart");
        assert_eq!(attr.trigger_when_changed(), Some("custom"));

        let attr = Options::new().proxy(true).create_attribute("cart");
        assert_eq!(attr.trigger_when_changed(), None);

        let attr = Options::new()
            .proxy("total")
            .synthesize_proxy_events(false)
            .create_attribute("cart");
        assert_eq!(attr.trigger_when_changed(), None);
    }

    #[test]
    fn test_untyped_uses_base_contract() {
        let attr = Options::new().create_attribute("anything");
        assert_eq!(attr.contract().name(), "Attribute");
        assert!(Arc::ptr_eq(attr.contract(), &Contract::shared_base()));
    }
}
