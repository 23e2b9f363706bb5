//! Error types for attribute declaration and value transforms.
//!
//! Configuration mistakes (bad watcher references, unknown option keys) and
//! failures raised by user-supplied casts and hooks are all represented by
//! the `AttrError` enum. Validation failures are *not* errors: they are
//! returned as data from `Attribute::validate`.

use thiserror::Error;

/// Errors raised while declaring attributes or running their transforms.
///
/// # Examples
///
/// ```rust
/// use attrkit::AttrError;
///
/// let err = AttrError::UnknownOption("colour".to_string());
/// assert_eq!(err.to_string(), "Unknown attribute option: colour");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttrError {
    /// A watcher reference could not be resolved into a hook.
    ///
    /// Contains the offending reference and the reason it was rejected.
    #[error("Wrong watcher '{reference}': {reason}")]
    WrongWatcher { reference: String, reason: String },

    /// An option spec named a key that is not in the option table.
    #[error("Unknown attribute option: {0}")]
    UnknownOption(String),

    /// A recognized option key was given a value of the wrong kind.
    #[error("Option '{option}' expects {expected}")]
    OptionType {
        option: &'static str,
        expected: &'static str,
    },

    /// A cast function refused its input.
    #[error("Cannot cast value for {0}: {1}")]
    Cast(String, String),

    /// A user hook or validator failed.
    #[error("Hook failed for {0}: {1}")]
    Hook(String, String),

    /// A proxied member was used but the nested value is absent or does not
    /// provide it.
    #[error("Member '{member}' is not available on attribute '{attribute}'")]
    MissingMember { attribute: String, member: String },
}

impl AttrError {
    pub(crate) fn wrong_watcher(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        AttrError::WrongWatcher {
            reference: reference.into(),
            reason: reason.into(),
        }
    }
}
