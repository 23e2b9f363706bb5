//! Read and write hooks.
//!
//! Hooks are user callables inserted into the read (`get`) or write (`set`)
//! path of an attribute. They receive the model instance, the current value
//! and the attribute name, and return the value to pass on. Returning
//! `Ok(None)` means "undefined": for write hooks this keeps the previously
//! stored value.
//!
//! Several hooks of one kind are composed into a single callable by
//! [`chain_get_hooks`] / [`chain_set_hooks`] at attribute construction.

use crate::error::AttrError;
use crate::model::Model;
use crate::value::Value;
use std::sync::Arc;

/// Result of a hook invocation. `None` is "undefined".
pub type HookResult = Result<Option<Value>, AttrError>;

/// Read-side hook.
pub type GetHook = Arc<dyn Fn(&dyn Model, Value, &str) -> HookResult + Send + Sync>;

/// Write-side hook.
pub type SetHook = Arc<dyn Fn(&mut dyn Model, Value, &str) -> HookResult + Send + Sync>;

/// Compose read hooks, first element running first.
///
/// An empty list yields `None`, a single hook is returned as is, and longer
/// lists are folded left to right. A hook returning `None` ends the chain.
pub fn chain_get_hooks(mut hooks: Vec<GetHook>) -> Option<GetHook> {
    match hooks.len() {
        0 => None,
        1 => hooks.pop(),
        _ => Some(Arc::new(
            move |model: &dyn Model, value: Value, name: &str| -> HookResult {
                let mut res = value;
                for hook in &hooks {
                    match hook(model, res, name)? {
                        Some(next) => res = next,
                        None => return Ok(None),
                    }
                }
                Ok(Some(res))
            },
        )),
    }
}

/// Compose write hooks, first element running first.
///
/// Same folding rules as [`chain_get_hooks`].
///
/// # Examples
///
/// ```rust
/// use attrkit::hooks::{chain_set_hooks, SetHook};
/// use attrkit::model::{ClassSpec, Model, Record};
/// use attrkit::Value;
/// use std::sync::Arc;
///
/// let double: SetHook = Arc::new(|_: &mut dyn Model, v: Value, _: &str| {
///     Ok(v.as_f64().map(|n| Value::from(n * 2.0)))
/// });
/// let inc: SetHook = Arc::new(|_: &mut dyn Model, v: Value, _: &str| {
///     Ok(v.as_f64().map(|n| Value::from(n + 1.0)))
/// });
///
/// let chained = chain_set_hooks(vec![double, inc]).unwrap();
/// let mut model = Record::new(Arc::new(ClassSpec::new("Counter")));
/// let out = chained(&mut model, Value::from(3.0), "count").unwrap();
/// assert_eq!(out, Some(Value::from(7.0)));
/// ```
pub fn chain_set_hooks(mut hooks: Vec<SetHook>) -> Option<SetHook> {
    match hooks.len() {
        0 => None,
        1 => hooks.pop(),
        _ => Some(Arc::new(
            move |model: &mut dyn Model, value: Value, name: &str| -> HookResult {
                let mut res = value;
                for hook in &hooks {
                    match hook(&mut *model, res, name)? {
                        Some(next) => res = next,
                        None => return Ok(None),
                    }
                }
                Ok(Some(res))
            },
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassSpec, Record};
    use std::sync::Mutex;

    fn record() -> Record {
        Record::new(Arc::new(ClassSpec::new("Test")))
    }

    fn tagging(tag: &'static str, log: Arc<Mutex<Vec<String>>>) -> SetHook {
        Arc::new(move |_: &mut dyn Model, value: Value, name: &str| {
            log.lock().unwrap().push(format!("{tag}:{name}"));
            let s = value.as_str().unwrap_or_default().to_string();
            Ok(Some(Value::from(format!("{s}{tag}"))))
        })
    }

    #[test]
    fn test_empty_chain() {
        assert!(chain_set_hooks(Vec::new()).is_none());
        assert!(chain_get_hooks(Vec::new()).is_none());
    }

    #[test]
    fn test_single_hook_is_used_directly() {
        let hook: SetHook = Arc::new(|_: &mut dyn Model, v: Value, _: &str| Ok(Some(v)));
        let chained = chain_set_hooks(vec![hook.clone()]).unwrap();
        assert!(Arc::ptr_eq(&hook, &chained));
    }

    #[test]
    fn test_fold_order_and_name() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chained = chain_set_hooks(vec![
            tagging("a", log.clone()),
            tagging("b", log.clone()),
        ])
        .unwrap();

        let mut model = record();
        let out = chained(&mut model, Value::from(""), "title").unwrap();
        assert_eq!(out, Some(Value::from("ab")));
        assert_eq!(*log.lock().unwrap(), vec!["a:title", "b:title"]);
    }

    #[test]
    fn test_undefined_ends_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stop: SetHook = Arc::new(|_: &mut dyn Model, _: Value, _: &str| Ok(None));
        let chained = chain_set_hooks(vec![stop, tagging("b", log.clone())]).unwrap();

        let mut model = record();
        assert_eq!(chained(&mut model, Value::from("x"), "title").unwrap(), None);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_error_propagates() {
        let fail: GetHook = Arc::new(|_: &dyn Model, _: Value, name: &str| {
            Err(AttrError::Hook(name.into(), "boom".into()))
        });
        let pass: GetHook = Arc::new(|_: &dyn Model, v: Value, _: &str| Ok(Some(v)));
        let chained = chain_get_hooks(vec![pass, fail]).unwrap();

        let model = record();
        let err = chained(&model, Value::null(), "title").unwrap_err();
        assert_eq!(err, AttrError::Hook("title".into(), "boom".into()));
    }
}
