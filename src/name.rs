//! Attribute name module.
//!
//! Provides the `AttrName` type, an interned string identifier for
//! attributes. Uses `Arc<str>` so descriptors, bindings and compiled
//! transforms can share one allocation per name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Interned string identifier for attributes.
///
/// # Examples
///
/// ```rust
/// use attrkit::AttrName;
///
/// let count = AttrName::new("count");
/// let count2: AttrName = "count".into();
/// let count3: AttrName = String::from("count").into();
///
/// assert_eq!(count, count2);
/// assert_eq!(count, count3);
/// assert_eq!(count.as_str(), "count");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AttrName(Arc<str>);

impl AttrName {
    pub fn new(name: &str) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AttrName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AttrName {
    fn from(name: String) -> Self {
        Self(name.into())
    }
}

impl From<AttrName> for String {
    fn from(name: AttrName) -> Self {
        name.as_str().to_owned()
    }
}

impl fmt::Display for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_creation() {
        let a = AttrName::new("count");
        let b = AttrName::new("count");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "count");
    }

    #[test]
    fn test_name_serde() {
        let name = AttrName::new("inner");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"inner\"");
        let back: AttrName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }

    #[test]
    fn test_name_ordering() {
        assert!(AttrName::new("alpha") < AttrName::new("beta"));
    }
}
