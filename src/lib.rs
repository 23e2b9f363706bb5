//! # attrkit - Typed Model Attributes with Compiled Write Pipelines
//!
//! A declaration layer for model attributes that provides:
//! - **Chainable** option builders (`type`, `value`, `cast`, hooks, events, watchers)
//! - **Compiled** write paths chosen once per attribute, never per write
//! - **Change-gated** hooks and event rewiring for nested values
//! - **Proxy** delegation of nested members onto the host model
//!
//! ## Core Concepts
//!
//! ### Write Pipeline
//!
//! Every write goes through one cached transform:
//!
//! ```text
//! raw → [cast] → [isChanged] → [set hook] → [event delegation] → stored
//! ```
//!
//! 1. **Cast** converts raw input into the attribute's value kind
//! 2. **Change detection** gates the write hook and event rewiring
//! 3. **Hooks** run in registration order; `None` keeps the stored value
//! 4. **Event delegation** moves listeners from the old nested value to the new one
//!
//! Attributes with no cast, hook or events get the identity transform.
//!
//! ## Example
//!
//! ```rust
//! use attrkit::*;
//! use std::sync::Arc;
//!
//! let class = ClassSpec::new("Counter")
//!     .with_attribute(
//!         primitives::number()
//!             .value(0)
//!             .set(|_, v: Value, _| Ok(v.as_f64().map(|n| Value::from(n as i64 + 1))))
//!             .create_attribute("count"),
//!     )
//!     .with_attribute(create(Value::from("untitled"), "title"));
//!
//! let mut counter = Record::new(Arc::new(class));
//! counter.set("count", Value::from("5")).unwrap();
//! assert_eq!(counter.get("count").unwrap(), Some(Value::from(6)));
//!
//! // "6" casts to the stored 6, so the hook is skipped.
//! counter.set("count", Value::from("6")).unwrap();
//! assert_eq!(counter.get("count").unwrap(), Some(Value::from(6)));
//! ```
//!
//! ## Modules
//!
//! - [`options`] - Option builder, option table and entry factories
//! - [`attribute`] - Finalized attribute descriptors
//! - [`transform`] - Write pipeline shapes and assembly
//! - [`contract`] - Value-kind capability records and types
//! - [`hooks`] - Read/write hook types and chaining
//! - [`reference`] - Watcher path resolution
//! - [`mixin`] - Proxy delegation onto host classes
//! - [`model`] - Host model contract and in-memory host
//! - [`primitives`] - Built-in string, number and boolean kinds
//! - [`value`] - Dynamic values and nested objects
//! - [`context`] - Write options passed through transforms
//! - [`error`] - Error types

pub mod attribute;
pub mod context;
pub mod contract;
pub mod error;
pub mod hooks;
pub mod mixin;
pub mod model;
pub mod name;
pub mod options;
pub mod primitives;
pub mod reference;
pub mod transform;
pub mod value;

// Re-export main types for convenience
pub use attribute::{Attribute, Setup};
pub use context::WriteContext;
pub use contract::{Contract, Member, MemberKind, ValueType};
pub use error::AttrError;
pub use hooks::{GetHook, HookResult, SetHook};
pub use mixin::Binding;
pub use model::{events, ClassSpec, EventMap, Model, Record};
pub use name::AttrName;
pub use options::{
    create, create_options, Declaration, OptionSpec, OptionValue, Options, Proxy, TypeOrValue,
};
pub use reference::WatcherRef;
pub use transform::Shape;
pub use value::{Call, Nested, Value};
