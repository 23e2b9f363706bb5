//! Write pipeline assembly.
//!
//! Every attribute compiles its write path once, at construction time, into
//! a single [`Transform`] callable. Which of the five [`Shape`]s is installed
//! depends only on whether the attribute has a cast, a write hook and any
//! event mapping; the branch is never re-evaluated per write.
//!
//! Within one write the steps always run in the order
//! cast → change detection → hook → event delegation.

use crate::context::WriteContext;
use crate::contract::{Cast, IsChanged};
use crate::error::AttrError;
use crate::hooks::SetHook;
use crate::model::{EventMap, Model};
use crate::name::AttrName;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Compiled write path: `(raw, ctx, model) -> value to store`.
///
/// A transform always yields a value. When a write hook returns undefined
/// and nothing is stored yet, the result is `null`; the slot cannot be left
/// undefined through a write.
pub type Transform =
    Arc<dyn Fn(Value, &WriteContext, &mut dyn Model) -> Result<Value, AttrError> + Send + Sync>;

/// Shape of an assembled write pipeline.
///
/// # Examples
///
/// ```rust
/// use attrkit::{primitives, Options, Shape};
///
/// assert_eq!(Options::new().create_attribute("a").shape(), Shape::Identity);
/// assert_eq!(primitives::number().has().create_attribute("n").shape(), Shape::Cast);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// No cast, no hook, no events.
    ///
    /// Values pass through untouched and are never compared.
    Identity,

    /// Only a cast.
    Cast,

    /// A write hook, gated by change detection.
    Hook {
        /// Whether the value is cast before comparison.
        cast: bool,
    },

    /// Only event delegation.
    Delegate,

    /// Event delegation layered over a cast and/or hook shape.
    DelegateAndMore {
        cast: bool,
        hook: bool,
    },
}

impl Shape {
    /// Pick the shape for a given set of capabilities.
    pub fn select(cast: bool, hook: bool, events: bool) -> Self {
        match (events, cast, hook) {
            (false, false, false) => Shape::Identity,
            (false, true, false) => Shape::Cast,
            (false, cast, true) => Shape::Hook { cast },
            (true, false, false) => Shape::Delegate,
            (true, cast, hook) => Shape::DelegateAndMore { cast, hook },
        }
    }

    /// Whether writes go through event delegation.
    pub fn delegates(&self) -> bool {
        matches!(self, Shape::Delegate | Shape::DelegateAndMore { .. })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Identity => write!(f, "identity"),
            Shape::Cast => write!(f, "cast"),
            Shape::Hook { cast: true } => write!(f, "hookAndCast"),
            Shape::Hook { cast: false } => write!(f, "hook"),
            Shape::Delegate => write!(f, "delegateEvents"),
            Shape::DelegateAndMore { .. } => write!(f, "delegateAndMore"),
        }
    }
}

/// Everything the write path of one attribute is built from.
pub(crate) struct Parts {
    pub name: AttrName,
    pub cast: Option<Cast>,
    pub set: Option<SetHook>,
    pub is_changed: IsChanged,
    pub events: Option<EventMap>,
    pub system_events: Option<EventMap>,
}

/// Compile the write path for an attribute.
pub(crate) fn assemble(parts: Parts) -> (Shape, Transform) {
    let delegate = parts.events.is_some() || parts.system_events.is_some();
    let shape = Shape::select(parts.cast.is_some(), parts.set.is_some(), delegate);

    let inner = match (&parts.cast, &parts.set) {
        (_, Some(set)) => Some(hook(&parts.name, parts.cast.clone(), set.clone(), &parts.is_changed)),
        (Some(cast), None) => Some(cast_only(&parts.name, cast.clone())),
        (None, None) => None,
    };

    let transform = match (delegate, inner) {
        (false, Some(inner)) => inner,
        (false, None) => identity(),
        (true, inner) => delegate_events(parts, inner),
    };

    (shape, transform)
}

fn identity() -> Transform {
    Arc::new(
        |value: Value, _: &WriteContext, _: &mut dyn Model| -> Result<Value, AttrError> {
            Ok(value)
        },
    )
}

fn cast_only(name: &AttrName, cast: Cast) -> Transform {
    let name = name.clone();
    Arc::new(
        move |raw: Value, ctx: &WriteContext, model: &mut dyn Model| -> Result<Value, AttrError> {
            cast(raw, ctx, &*model, name.as_str())
        },
    )
}

fn hook(name: &AttrName, cast: Option<Cast>, set: SetHook, is_changed: &IsChanged) -> Transform {
    let name = name.clone();
    let is_changed = is_changed.clone();
    Arc::new(
        move |raw: Value, ctx: &WriteContext, model: &mut dyn Model| -> Result<Value, AttrError> {
            let value = match &cast {
                Some(cast) => cast(raw, ctx, &*model, name.as_str())?,
                None => raw,
            };
            let prev = model.attribute(name.as_str()).cloned();

            if !is_changed(&value, prev.as_ref()) {
                return Ok(value);
            }

            match (set(&mut *model, value, name.as_str())?, &cast) {
                (Some(changed), _) => Ok(changed),
                // An undefined hook result keeps the stored value.
                (None, Some(cast)) => match prev {
                    Some(prev) => cast(prev, ctx, &*model, name.as_str()),
                    None => Ok(Value::null()),
                },
                (None, None) => Ok(prev.unwrap_or_else(Value::null)),
            }
        },
    )
}

fn delegate_events(parts: Parts, inner: Option<Transform>) -> Transform {
    let Parts {
        name,
        is_changed,
        events,
        system_events,
        ..
    } = parts;
    let replace = format!("replace:{name}");

    Arc::new(
        move |raw: Value, ctx: &WriteContext, model: &mut dyn Model| -> Result<Value, AttrError> {
            let value = match &inner {
                Some(inner) => inner(raw, ctx, &mut *model)?,
                None => raw,
            };
            let prev = model.attribute(name.as_str()).cloned();

            if !is_changed(&value, prev.as_ref()) {
                return Ok(value);
            }

            if let Some(Value::Object(old)) = &prev {
                if old.is_triggerable() {
                    model.stop_listening(old);
                }
            }

            if let Value::Object(new) = &value {
                if new.is_triggerable() {
                    for map in [&events, &system_events].into_iter().flatten() {
                        model.listen_to(new, map);
                    }
                }
            }

            trace!(attribute = %name, event = %replace, "replacing nested value");
            model.trigger(&replace, &[value.clone(), prev.unwrap_or_else(Value::null)]);
            Ok(value)
        },
    )
}
