//! Attribute descriptors.
//!
//! An [`Attribute`] is the finalized, immutable description of one named
//! slot on a model class. It is built from an [`Options`] and the contract
//! of its value kind, and carries the compiled write [`Transform`] that
//! every write to this slot goes through. One descriptor is shared by every
//! instance of its class; it holds no per-instance state.

use crate::context::WriteContext;
use crate::contract::{Cast, CloneFn, Contract, CreateFn, IsChanged, Parse, ToJson, Validator, ValueType};
use crate::error::AttrError;
use crate::hooks::{chain_get_hooks, chain_set_hooks, GetHook, SetHook};
use crate::model::{EventMap, Model};
use crate::name::AttrName;
use crate::options::{Options, Proxy};
use crate::transform::{self, Parts, Shape, Transform};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A finalized attribute descriptor.
///
/// # Examples
///
/// ```rust
/// use attrkit::model::{ClassSpec, Record};
/// use attrkit::{primitives, Model, Shape, Value, WriteContext};
/// use std::sync::Arc;
///
/// let attr = primitives::number()
///     .value(0)
///     .set(|_, v: Value, _| Ok(v.as_f64().map(|n| Value::from(n as i64 + 1))))
///     .create_attribute("count");
/// assert_eq!(attr.shape(), Shape::Hook { cast: true });
///
/// let mut model = Record::new(Arc::new(ClassSpec::new("Counter")));
/// let stored = attr.transform(Value::from("5"), &WriteContext::new(), &mut model).unwrap();
/// assert_eq!(stored, Value::from(6));
/// ```
pub struct Attribute {
    name: AttrName,
    ty: Option<Arc<ValueType>>,
    contract: Arc<Contract>,
    value: Option<Value>,
    cast: Option<Cast>,
    get: Option<GetHook>,
    set: Option<SetHook>,
    events: Option<EventMap>,
    system_events: Option<EventMap>,
    is_changed: IsChanged,
    clone: CloneFn,
    validate: Validator,
    create: Option<CreateFn>,
    to_json: ToJson,
    parse: Option<Parse>,
    trigger_when_changed: Option<String>,
    proxy: Option<Proxy>,
    shape: Shape,
    transform: Transform,
}

impl Attribute {
    /// Build a descriptor from finalized options.
    ///
    /// Option values override the contract defaults, except that `events`
    /// merge into the contract's events and the contract's default hooks
    /// wrap the user hooks (read defaults run first, write defaults last).
    pub(crate) fn new(name: AttrName, options: Options, contract: Arc<Contract>) -> Self {
        let Options {
            name: renamed,
            value,
            ty,
            cast,
            create,
            parse,
            clone,
            to_json,
            validate,
            trigger_when_changed,
            get,
            set,
            events,
            proxy,
            ..
        } = options;

        let name = renamed.map(AttrName::from).unwrap_or(name);

        // A declared map, even an empty one, installs event delegation.
        let events = match events {
            Some(declared) => {
                let mut merged = contract.events.clone();
                merged.extend(declared);
                Some(merged)
            }
            None => non_empty(contract.events.clone()),
        };

        let get: Vec<GetHook> = contract.get.iter().cloned().chain(get).collect();
        let set: Vec<SetHook> = set.into_iter().chain(contract.set.iter().cloned()).collect();

        let mut attr = Self {
            name,
            ty,
            value,
            cast: cast.or_else(|| contract.cast.clone()),
            get: chain_get_hooks(get),
            set: chain_set_hooks(set),
            events,
            system_events: non_empty(contract.system_events.clone()),
            is_changed: contract.is_changed.clone(),
            clone: clone.unwrap_or_else(|| contract.clone.clone()),
            validate: validate.unwrap_or_else(|| contract.validate.clone()),
            create: create.or_else(|| contract.create.clone()),
            to_json: to_json.unwrap_or_else(|| contract.to_json.clone()),
            parse: parse.or_else(|| contract.parse.clone()),
            trigger_when_changed,
            proxy,
            shape: Shape::Identity,
            transform: Arc::new(
                |value: Value, _: &WriteContext, _: &mut dyn Model| -> Result<Value, AttrError> {
                    Ok(value)
                },
            ),
            contract,
        };

        if let Some(initialize) = attr.contract.initialize.clone() {
            initialize(&mut Setup { attr: &mut attr });
        }

        let (shape, transform) = transform::assemble(Parts {
            name: attr.name.clone(),
            cast: attr.cast.clone(),
            set: attr.set.clone(),
            is_changed: attr.is_changed.clone(),
            events: attr.events.clone(),
            system_events: attr.system_events.clone(),
        });
        attr.shape = shape;
        attr.transform = transform;

        debug!(
            attribute = %attr.name,
            kind = attr.contract.name(),
            shape = %shape,
            "assembled attribute pipeline"
        );
        attr
    }

    pub fn name(&self) -> &AttrName {
        &self.name
    }

    pub fn value_type(&self) -> Option<&Arc<ValueType>> {
        self.ty.as_ref()
    }

    /// Contract this attribute was built from.
    pub fn contract(&self) -> &Arc<Contract> {
        &self.contract
    }

    /// Declared default value, as given.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn has_cast(&self) -> bool {
        self.cast.is_some()
    }

    pub fn has_get_hook(&self) -> bool {
        self.get.is_some()
    }

    pub fn has_set_hook(&self) -> bool {
        self.set.is_some()
    }

    /// User events, merged over the contract's class-level events.
    pub fn events(&self) -> Option<&EventMap> {
        self.events.as_ref()
    }

    pub fn system_events(&self) -> Option<&EventMap> {
        self.system_events.as_ref()
    }

    pub fn trigger_when_changed(&self) -> Option<&str> {
        self.trigger_when_changed.as_deref()
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    /// Run the compiled write path on a raw value.
    ///
    /// Returns the value to store. Cast and hook failures propagate as is;
    /// side effects already performed are not rolled back.
    pub fn transform(
        &self,
        raw: Value,
        ctx: &WriteContext,
        model: &mut dyn Model,
    ) -> Result<Value, AttrError> {
        (self.transform)(raw, ctx, model)
    }

    pub fn is_changed(&self, value: &Value, prev: Option<&Value>) -> bool {
        (self.is_changed)(value, prev)
    }

    /// Validation message for `value`, `None` when valid.
    pub fn validate(&self, model: &dyn Model, value: &Value) -> Option<String> {
        (self.validate)(model, value, self.name.as_str())
    }

    pub fn clone_value(&self, value: &Value, ctx: &WriteContext) -> Value {
        (self.clone)(value, ctx)
    }

    /// Build an empty value of the attribute's kind.
    ///
    /// Falls back to the type's own constructor, then to `null`.
    pub fn create(&self, ctx: &WriteContext) -> Value {
        match &self.create {
            Some(create) => create(ctx),
            None => self
                .ty
                .as_ref()
                .and_then(|ty| ty.construct(ctx))
                .unwrap_or_else(Value::null),
        }
    }

    /// Initial value for a new model instance.
    ///
    /// A declared default is cloned so instances never share it. Without
    /// one, typed attributes start from [`Attribute::create`] and typeless
    /// attributes start undefined.
    pub fn default_value(&self, ctx: &WriteContext) -> Option<Value> {
        match (&self.value, &self.ty, &self.create) {
            (Some(value), _, _) => Some(self.clone_value(value, ctx)),
            (None, Some(_), _) | (None, None, Some(_)) => Some(self.create(ctx)),
            (None, None, None) => None,
        }
    }

    pub fn to_json(&self, value: &Value, key: &str) -> Value {
        (self.to_json)(value, key)
    }

    /// Parse serialized input. Without a parser the input is returned.
    pub fn parse(&self, value: Value) -> Result<Value, AttrError> {
        match &self.parse {
            Some(parse) => parse(value, self.name.as_str()),
            None => Ok(value),
        }
    }

    /// Read the stored value through the read hook.
    ///
    /// An undefined slot reads as `None` without running the hook.
    pub fn read(&self, model: &dyn Model) -> Result<Option<Value>, AttrError> {
        let Some(stored) = model.attribute(self.name.as_str()).cloned() else {
            return Ok(None);
        };
        match &self.get {
            Some(get) => get(model, stored, self.name.as_str()),
            None => Ok(Some(stored)),
        }
    }

    /// Transform `raw` and store the result.
    pub fn write(
        &self,
        model: &mut dyn Model,
        raw: Value,
        ctx: &WriteContext,
    ) -> Result<(), AttrError> {
        let value = self.transform(raw, ctx, &mut *model)?;
        model.store(self.name.as_str(), value);
        Ok(())
    }
}

fn non_empty(events: EventMap) -> Option<EventMap> {
    if events.is_empty() {
        None
    } else {
        Some(events)
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.ty.as_ref().map(|t| t.name()))
            .field("contract", &self.contract.name())
            .field("value", &self.value)
            .field("shape", &self.shape)
            .field("trigger_when_changed", &self.trigger_when_changed)
            .field("proxy", &self.proxy)
            .finish()
    }
}

/// Mutable view of an attribute under construction, handed to a
/// contract's `initialize` step before the write path is assembled.
///
/// # Examples
///
/// ```rust
/// use attrkit::contract::{Contract, ValueType};
/// use attrkit::{Shape, Value};
/// use std::sync::Arc;
///
/// let contract = Arc::new(Contract::base().with_initialize(|setup| {
///     if setup.value().is_none() {
///         setup.set_value(Value::from("untitled"));
///     }
/// }));
/// let mut ty = ValueType::new("Title");
/// contract.attach([&mut ty]);
///
/// let attr = Arc::new(ty).has().create_attribute("title");
/// assert_eq!(attr.value(), Some(&Value::from("untitled")));
/// assert_eq!(attr.shape(), Shape::Identity);
/// ```
pub struct Setup<'a> {
    attr: &'a mut Attribute,
}

impl Setup<'_> {
    pub fn name(&self) -> &AttrName {
        &self.attr.name
    }

    pub fn value_type(&self) -> Option<&Arc<ValueType>> {
        self.attr.ty.as_ref()
    }

    pub fn value(&self) -> Option<&Value> {
        self.attr.value.as_ref()
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.attr.value = Some(value.into());
    }

    pub fn has_cast(&self) -> bool {
        self.attr.cast.is_some()
    }

    pub fn set_cast<F>(&mut self, cast: F)
    where
        F: Fn(Value, &WriteContext, &dyn Model, &str) -> Result<Value, AttrError>
            + Send
            + Sync
            + 'static,
    {
        self.attr.cast = Some(Arc::new(cast));
    }

    pub fn set_is_changed<F>(&mut self, is_changed: F)
    where
        F: Fn(&Value, Option<&Value>) -> bool + Send + Sync + 'static,
    {
        self.attr.is_changed = Arc::new(is_changed);
    }

    /// Add system event handlers, kept apart from user events.
    pub fn add_system_events(&mut self, events: EventMap) {
        self.attr
            .system_events
            .get_or_insert_with(EventMap::new)
            .extend(events);
    }
}
