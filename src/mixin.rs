//! Proxy delegation.
//!
//! An attribute declared with `proxy` exposes members of its nested value
//! directly on the host model. Which members exist is taken from the value
//! kind's declared member list, and the forwarding [`Binding`]s are
//! installed once on the [`ClassSpec`] when the attribute is defined.
//! Every forwarded call looks up the nested value currently stored under
//! the attribute, so replacing the value retargets the bindings.

use crate::attribute::Attribute;
use crate::contract::{Member, MemberKind};
use crate::error::AttrError;
use crate::model::{ClassSpec, Model};
use crate::name::AttrName;
use crate::options::Proxy;
use crate::value::{Call, Nested, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// A forwarding member installed on a host class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Forwards calls to a method of the nested value.
    Method { attribute: AttrName, member: String },
    /// Forwards reads and writes to a property of the nested value.
    Property { attribute: AttrName, member: String },
}

impl Binding {
    fn new(attribute: &AttrName, member: &Member) -> Self {
        let attribute = attribute.clone();
        let member_name = member.name.clone();
        match member.kind {
            MemberKind::Method => Binding::Method {
                attribute,
                member: member_name,
            },
            MemberKind::Property => Binding::Property {
                attribute,
                member: member_name,
            },
        }
    }

    /// Attribute holding the nested value.
    pub fn attribute(&self) -> &AttrName {
        match self {
            Binding::Method { attribute, .. } | Binding::Property { attribute, .. } => attribute,
        }
    }

    pub fn member(&self) -> &str {
        match self {
            Binding::Method { member, .. } | Binding::Property { member, .. } => member,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self, Binding::Method { .. })
    }

    /// Invoke the method on the current nested value.
    pub fn call(&self, model: &dyn Model, args: &[Value]) -> Result<Value, AttrError> {
        let nested = self.nested(model)?;
        nested
            .invoke(self.member(), Call::new(args).with_model(model))
            .unwrap_or_else(|| Err(self.missing()))
    }

    /// Read the property from the current nested value.
    pub fn get(&self, model: &dyn Model) -> Result<Option<Value>, AttrError> {
        Ok(self.nested(model)?.property(self.member()))
    }

    /// Write the property on the current nested value.
    pub fn set(&self, model: &dyn Model, value: Value) -> Result<(), AttrError> {
        self.nested(model)?.set_property(self.member(), value)
    }

    fn nested(&self, model: &dyn Model) -> Result<Arc<dyn Nested>, AttrError> {
        match model.attribute(self.attribute().as_str()) {
            Some(Value::Object(nested)) => Ok(nested.clone()),
            _ => Err(self.missing()),
        }
    }

    fn missing(&self) -> AttrError {
        AttrError::MissingMember {
            attribute: self.attribute().to_string(),
            member: self.member().to_string(),
        }
    }
}

impl Attribute {
    /// Install forwarding bindings for the proxied members of this
    /// attribute's value kind.
    ///
    /// Names the class already defines are left alone. Allow-listed names
    /// the value kind does not declare are skipped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use attrkit::contract::ValueType;
    /// use attrkit::model::ClassSpec;
    /// use std::sync::Arc;
    ///
    /// let cart = Arc::new(ValueType::new("Cart").with_method("total").with_property("size"));
    /// let class = ClassSpec::new("Order")
    ///     .with_member("total")
    ///     .with_attribute(cart.has().proxy(true).create_attribute("cart"));
    ///
    /// assert!(class.binding("total").is_none());
    /// assert!(class.binding("size").is_some());
    /// ```
    pub fn attach_mixins(&self, spec: &mut ClassSpec) {
        let (Some(ty), Some(proxy)) = (self.value_type(), self.proxy()) else {
            return;
        };

        let members: Vec<&Member> = match proxy {
            Proxy::All => ty.members().iter().collect(),
            Proxy::Members(names) => names
                .iter()
                .filter_map(|name| {
                    let member = ty.member(name);
                    if member.is_none() {
                        warn!(
                            attribute = %self.name(),
                            kind = ty.name(),
                            member = %name,
                            "proxied member is not declared by the value kind"
                        );
                    }
                    member
                })
                .collect(),
        };

        let mut installed = 0;
        for member in members {
            if spec.defines(&member.name) {
                continue;
            }
            spec.bindings
                .insert(member.name.clone(), Binding::new(self.name(), member));
            installed += 1;
        }

        debug!(
            attribute = %self.name(),
            class = spec.name(),
            installed,
            "installed proxy bindings"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ValueType;
    use crate::model::Record;
    use crate::options::Options;
    use std::sync::Mutex;

    struct Cart {
        items: Mutex<Vec<f64>>,
        label: Mutex<String>,
    }

    impl Cart {
        fn with(items: &[f64]) -> Self {
            Self {
                items: Mutex::new(items.to_vec()),
                label: Mutex::new(String::new()),
            }
        }
    }

    impl Nested for Cart {
        fn kind(&self) -> &str {
            "Cart"
        }

        fn property(&self, name: &str) -> Option<Value> {
            match name {
                "size" => Some(Value::from(self.items.lock().unwrap().len() as u64)),
                "label" => Some(Value::from(self.label.lock().unwrap().clone())),
                _ => None,
            }
        }

        fn set_property(&self, name: &str, value: Value) -> Result<(), AttrError> {
            match name {
                "label" => {
                    *self.label.lock().unwrap() = value.as_str().unwrap_or_default().to_string();
                    Ok(())
                }
                _ => Err(AttrError::MissingMember {
                    attribute: "Cart".into(),
                    member: name.into(),
                }),
            }
        }

        fn invoke(&self, method: &str, call: Call<'_>) -> Option<Result<Value, AttrError>> {
            match method {
                "total" => Some(Ok(Value::from(self.items.lock().unwrap().iter().sum::<f64>()))),
                "add" => {
                    let n = call.arg(0).and_then(Value::as_f64).unwrap_or(0.0);
                    self.items.lock().unwrap().push(n);
                    Some(Ok(Value::null()))
                }
                _ => None,
            }
        }
    }

    fn cart_type() -> Arc<ValueType> {
        Arc::new(
            ValueType::new("Cart")
                .with_method("total")
                .with_method("add")
                .with_property("size")
                .with_property("label"),
        )
    }

    #[test]
    fn test_proxy_all_installs_every_member() {
        let class = ClassSpec::new("Order")
            .with_attribute(cart_type().has().proxy(true).create_attribute("cart"));

        for name in ["total", "add", "size", "label"] {
            assert!(class.binding(name).is_some(), "missing binding for {name}");
        }
        assert!(class.binding("total").unwrap().is_method());
        assert!(!class.binding("size").unwrap().is_method());
    }

    #[test]
    fn test_proxy_allow_list_skips_undeclared() {
        let class = ClassSpec::new("Order").with_attribute(
            cart_type()
                .has()
                .proxy("total ghost")
                .create_attribute("cart"),
        );
        assert!(class.binding("total").is_some());
        assert!(class.binding("ghost").is_none());
        assert!(class.binding("size").is_none());
    }

    #[test]
    fn test_host_members_win() {
        let class = ClassSpec::new("Order")
            .with_method("total", |_: &mut dyn Model, _: &[Value]| Ok(Value::from("own")))
            .with_attribute(cart_type().has().proxy(true).create_attribute("cart"));
        assert!(class.binding("total").is_none());

        let mut order = Record::new(Arc::new(class));
        order.store("cart", Value::object(Cart::with(&[1.0, 2.0])));
        assert_eq!(order.call("total", &[]).unwrap(), Value::from("own"));
    }

    #[test]
    fn test_untyped_proxy_is_ignored() {
        let class = ClassSpec::new("Order")
            .with_attribute(Options::new().proxy(true).create_attribute("cart"));
        assert!(class.binding("total").is_none());
    }

    #[test]
    fn test_forwarding_follows_current_value() {
        let class = ClassSpec::new("Order")
            .with_attribute(cart_type().has().proxy(true).create_attribute("cart"));
        let mut order = Record::new(Arc::new(class));

        order.store("cart", Value::object(Cart::with(&[1.0, 2.0])));
        order.call("add", &[Value::from(3)]).unwrap();
        assert_eq!(order.call("total", &[]).unwrap(), Value::from(6.0));
        assert_eq!(order.proxied("size").unwrap(), Some(Value::from(3u64)));

        order.set_proxied("label", Value::from("gifts")).unwrap();
        assert_eq!(order.proxied("label").unwrap(), Some(Value::from("gifts")));

        order.store("cart", Value::object(Cart::with(&[10.0])));
        assert_eq!(order.call("total", &[]).unwrap(), Value::from(10.0));
    }

    #[test]
    fn test_absent_nested_value_errors() {
        let class = ClassSpec::new("Order")
            .with_attribute(cart_type().has().proxy(true).create_attribute("cart"));
        let mut order = Record::new(Arc::new(class));
        order.store("cart", Value::null());

        let err = order.call("total", &[]).unwrap_err();
        assert_eq!(
            err,
            AttrError::MissingMember {
                attribute: "cart".into(),
                member: "total".into()
            }
        );
        assert!(order.proxied("size").is_err());
    }

    #[test]
    fn test_binding_accessors() {
        let binding = Binding::new(&AttrName::new("cart"), &Member::method("total"));
        assert_eq!(binding.attribute().as_str(), "cart");
        assert_eq!(binding.member(), "total");
        assert!(binding.is_method());
    }
}
