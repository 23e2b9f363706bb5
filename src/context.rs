//! Write context passed through attribute transforms.
//!
//! The host runtime hands a `WriteContext` to every transform call (the
//! options of the write that triggered it: `parse`, `silent`, `deep`, ...).
//! The core only interprets `deep`, used by the default `clone`; everything
//! else is passed through to casts and hooks untouched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Options of a single write, as a generic key-value bag.
///
/// # Examples
///
/// ```rust
/// use attrkit::WriteContext;
///
/// let mut ctx = WriteContext::new();
/// ctx.set("parse", true);
/// ctx.set("source", "sync");
///
/// let parse: Option<bool> = ctx.get("parse");
/// assert_eq!(parse, Some(true));
/// assert!(!ctx.deep());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteContext {
    data: HashMap<String, serde_json::Value>,
}

impl WriteContext {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context requesting deep copies from `clone`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use attrkit::WriteContext;
    ///
    /// assert!(WriteContext::deep_copy().deep());
    /// ```
    pub fn deep_copy() -> Self {
        let mut ctx = Self::new();
        ctx.set("deep", true);
        ctx
    }

    /// Record a write option. Values that do not serialize to JSON are
    /// dropped.
    pub fn set(&mut self, key: impl Into<String>, value: impl Serialize) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.data.insert(key, value);
            }
            Err(err) => debug!(option = %key, error = %err, "dropping write option"),
        }
    }

    /// Read a write option as `T`; `None` when absent or of another shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        T::deserialize(self.data.get(key)?).ok()
    }

    /// Whether a deep copy was requested.
    pub fn deep(&self) -> bool {
        self.get("deep").unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_set_get() {
        let mut ctx = WriteContext::new();
        ctx.set("silent", true);

        let silent: Option<bool> = ctx.get("silent");
        assert_eq!(silent, Some(true));
        assert_eq!(ctx.get::<String>("silent"), None);
    }

    #[test]
    fn test_context_missing_key() {
        let ctx = WriteContext::new();
        let value: Option<i32> = ctx.get("missing");
        assert_eq!(value, None);
        assert!(!ctx.deep());
    }

    #[test]
    fn test_deep_flag_wrong_type() {
        let mut ctx = WriteContext::new();
        ctx.set("deep", "yes");
        assert!(!ctx.deep());
    }
}
