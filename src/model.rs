//! Host model contract.
//!
//! Attribute storage, listener registration and event emission belong to
//! the host runtime. The core talks to it only through the [`Model`] trait.
//! [`ClassSpec`] describes a model class (its attributes, own members and
//! proxied bindings) and [`Record`] is a small in-memory host that keeps
//! everything observable, used by the demos and tests.

use crate::attribute::Attribute;
use crate::context::WriteContext;
use crate::error::AttrError;
use crate::mixin::Binding;
use crate::name::AttrName;
use crate::value::{same_nested, Nested, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Event handler registered on a nested value.
pub type Handler = Arc<dyn Fn(&mut dyn Model, &[Value]) -> Result<(), AttrError> + Send + Sync>;

/// Event name to handler mapping.
pub type EventMap = BTreeMap<String, Handler>;

/// Method defined by a model class itself.
pub type HostMethod =
    Arc<dyn Fn(&mut dyn Model, &[Value]) -> Result<Value, AttrError> + Send + Sync>;

/// Build a single-entry [`EventMap`].
///
/// # Examples
///
/// ```rust
/// use attrkit::model::{events, Model};
/// use attrkit::Value;
///
/// let map = events("change", |_: &mut dyn Model, _: &[Value]| Ok(()));
/// assert!(map.contains_key("change"));
/// ```
pub fn events<F>(event: impl Into<String>, handler: F) -> EventMap
where
    F: Fn(&mut dyn Model, &[Value]) -> Result<(), AttrError> + Send + Sync + 'static,
{
    let mut map = EventMap::new();
    map.insert(event.into(), Arc::new(handler) as Handler);
    map
}

/// The host model instance as seen by attribute transforms.
pub trait Model {
    /// Currently stored value of an attribute.
    fn attribute(&self, name: &str) -> Option<&Value>;

    /// Store a value into the attribute store.
    fn store(&mut self, name: &str, value: Value);

    /// Member lookup used by watcher path traversal.
    fn property(&self, name: &str) -> Option<Value> {
        self.attribute(name).cloned()
    }

    /// The aggregate owning this model, if any.
    fn owner(&self) -> Option<Arc<dyn Nested>> {
        None
    }

    /// Invoke a method of the model. `None` when it has no such method.
    fn invoke(&mut self, _method: &str, _args: &[Value]) -> Option<Result<Value, AttrError>> {
        None
    }

    /// Register `events` as listeners on `target`.
    fn listen_to(&mut self, target: &Arc<dyn Nested>, events: &EventMap);

    /// Drop every listener this model registered on `target`.
    fn stop_listening(&mut self, target: &Arc<dyn Nested>);

    /// Emit an event from this model. The model itself is the emitter and
    /// is not repeated in `args`.
    fn trigger(&mut self, event: &str, args: &[Value]);
}

/// Definition of a model class: attributes, own members and proxied members.
///
/// Built once at class-definition time and shared by every instance.
#[derive(Default)]
pub struct ClassSpec {
    name: String,
    members: BTreeSet<String>,
    methods: BTreeMap<String, HostMethod>,
    attributes: BTreeMap<AttrName, Arc<Attribute>>,
    pub(crate) bindings: BTreeMap<String, Binding>,
}

impl ClassSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare an own member (property or method) without behaviour.
    pub fn with_member(mut self, name: impl Into<String>) -> Self {
        self.members.insert(name.into());
        self
    }

    /// Declare an own method.
    pub fn with_method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&mut dyn Model, &[Value]) -> Result<Value, AttrError> + Send + Sync + 'static,
    {
        let name = name.into();
        self.members.insert(name.clone());
        self.methods.insert(name, Arc::new(method));
        self
    }

    /// Add an attribute, installing its proxied members.
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.define(attribute);
        self
    }

    /// Add an attribute, installing its proxied members.
    pub fn define(&mut self, attribute: Attribute) -> Arc<Attribute> {
        attribute.attach_mixins(self);
        let attribute = Arc::new(attribute);
        self.attributes
            .insert(attribute.name().clone(), attribute.clone());
        attribute
    }

    /// Whether `name` is already taken by the class itself.
    pub fn defines(&self, name: &str) -> bool {
        self.members.contains(name)
            || self.bindings.contains_key(name)
            || self.attributes.contains_key(&AttrName::new(name))
    }

    pub fn attribute(&self, name: &str) -> Option<&Arc<Attribute>> {
        self.attributes.get(&AttrName::new(name))
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Arc<Attribute>> {
        self.attributes.values()
    }

    pub fn method(&self, name: &str) -> Option<&HostMethod> {
        self.methods.get(name)
    }

    /// Forwarding binding installed for a proxied member.
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }
}

/// Listener registration made by a [`Record`].
#[derive(Clone)]
pub struct Listening {
    pub target: Arc<dyn Nested>,
    pub events: EventMap,
}

/// Event emitted by a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub struct Triggered {
    pub event: String,
    pub args: Vec<Value>,
}

/// In-memory host model.
///
/// # Examples
///
/// ```rust
/// use attrkit::model::{ClassSpec, Record};
/// use attrkit::{primitives, Value};
/// use std::sync::Arc;
///
/// let class = ClassSpec::new("Counter")
///     .with_attribute(primitives::number().value(0).create_attribute("count"));
/// let mut counter = Record::new(Arc::new(class));
///
/// counter.set("count", Value::from("41")).unwrap();
/// assert_eq!(counter.get("count").unwrap(), Some(Value::from(41)));
/// ```
pub struct Record {
    class: Arc<ClassSpec>,
    attributes: HashMap<String, Value>,
    owner: Option<Arc<dyn Nested>>,
    listening: Vec<Listening>,
    triggered: Vec<Triggered>,
}

impl Record {
    /// Create an instance with every attribute set to its default value.
    pub fn new(class: Arc<ClassSpec>) -> Self {
        let ctx = WriteContext::new();
        let attributes = class
            .attributes()
            .filter_map(|attr| {
                attr.default_value(&ctx)
                    .map(|value| (attr.name().to_string(), value))
            })
            .collect();

        Self {
            class,
            attributes,
            owner: None,
            listening: Vec::new(),
            triggered: Vec::new(),
        }
    }

    pub fn with_owner(mut self, owner: Arc<dyn Nested>) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn class(&self) -> &Arc<ClassSpec> {
        &self.class
    }

    /// Write an attribute through its compiled transform.
    ///
    /// Names the class does not declare are stored as given.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), AttrError> {
        self.set_with(name, value, &WriteContext::new())
    }

    pub fn set_with(&mut self, name: &str, value: Value, ctx: &WriteContext) -> Result<(), AttrError> {
        match self.class.attribute(name).cloned() {
            Some(attr) => attr.write(self, value, ctx),
            None => {
                self.store(name, value);
                Ok(())
            }
        }
    }

    /// Read an attribute through its read hook.
    pub fn get(&self, name: &str) -> Result<Option<Value>, AttrError> {
        match self.class.attribute(name) {
            Some(attr) => attr.read(self),
            None => Ok(self.attributes.get(name).cloned()),
        }
    }

    /// Run the attribute validator against the stored value.
    pub fn validate(&self, name: &str) -> Option<String> {
        let attr = self.class.attribute(name)?;
        let value = self.attributes.get(name).cloned().unwrap_or_else(Value::null);
        attr.validate(self, &value)
    }

    /// Call an own or proxied method.
    pub fn call(&mut self, method: &str, args: &[Value]) -> Result<Value, AttrError> {
        let class = self.class.name().to_string();
        self.invoke(method, args)
            .unwrap_or_else(|| {
                Err(AttrError::MissingMember {
                    attribute: class,
                    member: method.to_string(),
                })
            })
    }

    /// Read a proxied property.
    pub fn proxied(&self, member: &str) -> Result<Option<Value>, AttrError> {
        match self.class.binding(member) {
            Some(binding) => binding.get(self),
            None => Err(self.missing(member)),
        }
    }

    /// Write a proxied property.
    pub fn set_proxied(&mut self, member: &str, value: Value) -> Result<(), AttrError> {
        match self.class.binding(member) {
            Some(binding) => binding.set(self, value),
            None => Err(self.missing(member)),
        }
    }

    /// Deliver `event` from `target` to the handlers this record registered
    /// on it. Returns the number of handlers run.
    pub fn deliver(
        &mut self,
        target: &Arc<dyn Nested>,
        event: &str,
        args: &[Value],
    ) -> Result<usize, AttrError> {
        let handlers: Vec<Handler> = self
            .listening
            .iter()
            .filter(|l| same_nested(&l.target, target))
            .filter_map(|l| l.events.get(event).cloned())
            .collect();

        for handler in &handlers {
            handler(self, args)?;
        }
        Ok(handlers.len())
    }

    /// Event names this record listens to on `target`.
    pub fn listeners(&self, target: &Arc<dyn Nested>) -> Vec<String> {
        self.listening
            .iter()
            .filter(|l| same_nested(&l.target, target))
            .flat_map(|l| l.events.keys().cloned())
            .collect()
    }

    pub fn triggered(&self) -> &[Triggered] {
        &self.triggered
    }

    fn missing(&self, member: &str) -> AttrError {
        AttrError::MissingMember {
            attribute: self.class.name().to_string(),
            member: member.to_string(),
        }
    }
}

impl Model for Record {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    fn store(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }

    fn owner(&self) -> Option<Arc<dyn Nested>> {
        self.owner.clone()
    }

    fn invoke(&mut self, method: &str, args: &[Value]) -> Option<Result<Value, AttrError>> {
        let class = self.class.clone();
        if let Some(own) = class.method(method) {
            return Some(own(self, args));
        }
        match class.binding(method) {
            Some(binding) if binding.is_method() => Some(binding.call(self, args)),
            _ => None,
        }
    }

    fn listen_to(&mut self, target: &Arc<dyn Nested>, events: &EventMap) {
        self.listening.push(Listening {
            target: target.clone(),
            events: events.clone(),
        });
    }

    fn stop_listening(&mut self, target: &Arc<dyn Nested>) {
        self.listening.retain(|l| !same_nested(&l.target, target));
    }

    fn trigger(&mut self, event: &str, args: &[Value]) {
        self.triggered.push(Triggered {
            event: event.to_string(),
            args: args.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tag;

    impl Nested for Tag {
        fn kind(&self) -> &str {
            "Tag"
        }
    }

    #[test]
    fn test_untyped_store_roundtrip() {
        let mut record = Record::new(Arc::new(ClassSpec::new("Bag")));
        record.set("loose", Value::from(3)).unwrap();
        assert_eq!(record.get("loose").unwrap(), Some(Value::from(3)));
        assert_eq!(record.get("missing").unwrap(), None);
    }

    #[test]
    fn test_listen_and_stop() {
        let mut record = Record::new(Arc::new(ClassSpec::new("Bag")));
        let tag: Arc<dyn Nested> = Arc::new(Tag);
        let other: Arc<dyn Nested> = Arc::new(Tag);

        record.listen_to(&tag, &events("change", |_: &mut dyn Model, _: &[Value]| Ok(())));
        record.listen_to(&other, &events("remove", |_: &mut dyn Model, _: &[Value]| Ok(())));
        assert_eq!(record.listeners(&tag), vec!["change"]);

        record.stop_listening(&tag);
        assert!(record.listeners(&tag).is_empty());
        assert_eq!(record.listeners(&other), vec!["remove"]);
    }

    #[test]
    fn test_deliver_runs_matching_handlers() {
        let mut record = Record::new(Arc::new(ClassSpec::new("Bag")));
        let tag: Arc<dyn Nested> = Arc::new(Tag);
        record.listen_to(
            &tag,
            &events("change", |model: &mut dyn Model, args: &[Value]| {
                model.store("seen", args[0].clone());
                Ok(())
            }),
        );

        assert_eq!(record.deliver(&tag, "change", &[Value::from(1)]).unwrap(), 1);
        assert_eq!(record.deliver(&tag, "other", &[]).unwrap(), 0);
        assert_eq!(record.attribute("seen"), Some(&Value::from(1)));
    }

    #[test]
    fn test_own_method_call() {
        let class = ClassSpec::new("Greeter").with_method("hello", |_: &mut dyn Model, args: &[Value]| {
            Ok(Value::from(format!("hello {}", args[0].as_str().unwrap_or("?"))))
        });
        assert!(class.defines("hello"));

        let mut record = Record::new(Arc::new(class));
        assert_eq!(
            record.call("hello", &[Value::from("bob")]).unwrap(),
            Value::from("hello bob")
        );
        assert!(matches!(
            record.call("nope", &[]),
            Err(AttrError::MissingMember { .. })
        ));
    }
}
