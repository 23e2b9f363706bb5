//! Watcher reference resolution.
//!
//! A watcher is either a dotted path naming a method reachable from the
//! model (`"^onTitleChange"`, `"editor.refresh"`) or a callable. Both are
//! turned into a write hook that notifies the target and passes the value
//! through unchanged.
//!
//! Path grammar: segments are separated by `.`; each leading `^` of a
//! segment ascends to the current object's owner; the remainder of a
//! segment names a member. The last member is the method to invoke.

use crate::error::AttrError;
use crate::hooks::{HookResult, SetHook};
use crate::model::Model;
use crate::value::{Call, Nested, Value};
use std::fmt;
use std::sync::Arc;

/// Callable watcher, invoked as `(value, model)`.
pub type WatchFn = Arc<dyn Fn(&Value, &mut dyn Model) -> Result<(), AttrError> + Send + Sync>;

/// A declarative watcher reference.
#[derive(Clone)]
pub enum WatcherRef {
    Path(String),
    Callable(WatchFn),
}

impl WatcherRef {
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&Value, &mut dyn Model) -> Result<(), AttrError> + Send + Sync + 'static,
    {
        WatcherRef::Callable(Arc::new(f))
    }
}

impl fmt::Debug for WatcherRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatcherRef::Path(path) => write!(f, "Path({path:?})"),
            WatcherRef::Callable(_) => write!(f, "Callable(<fn>)"),
        }
    }
}

impl From<&str> for WatcherRef {
    fn from(path: &str) -> Self {
        WatcherRef::Path(path.to_string())
    }
}

impl From<String> for WatcherRef {
    fn from(path: String) -> Self {
        WatcherRef::Path(path)
    }
}

/// One traversal step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Ascend to the owning aggregate.
    Owner,
    /// Read a member.
    Member(String),
}

/// A parsed watcher path: traversal steps plus the method to invoke.
///
/// # Examples
///
/// ```rust
/// use attrkit::reference::{RefPath, Step};
///
/// let path = RefPath::parse("^^editor.refresh").unwrap();
/// assert_eq!(
///     path.steps(),
///     &[Step::Owner, Step::Owner, Step::Member("editor".into())]
/// );
/// assert_eq!(path.method(), "refresh");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefPath {
    steps: Vec<Step>,
    method: String,
}

impl RefPath {
    pub fn parse(reference: &str) -> Result<Self, AttrError> {
        if reference.trim().is_empty() {
            return Err(AttrError::wrong_watcher(reference, "empty path"));
        }

        let mut names = Vec::new();
        let mut steps = Vec::new();
        for segment in reference.split('.') {
            let member = segment.trim_start_matches('^');
            let ascents = segment.len() - member.len();

            if ascents == 0 && member.is_empty() {
                return Err(AttrError::wrong_watcher(reference, "empty segment"));
            }
            if member.contains('^') {
                return Err(AttrError::wrong_watcher(
                    reference,
                    "'^' must prefix a segment",
                ));
            }
            if member.chars().any(char::is_whitespace) {
                return Err(AttrError::wrong_watcher(reference, "whitespace in member name"));
            }

            // Flush the member read before ascending from it.
            steps.extend(names.drain(..).map(Step::Member));
            steps.extend(std::iter::repeat(Step::Owner).take(ascents));
            if !member.is_empty() {
                names.push(member.to_string());
            }
        }

        let method = names
            .pop()
            .ok_or_else(|| AttrError::wrong_watcher(reference, "missing method name"))?;
        steps.extend(names.into_iter().map(Step::Member));

        Ok(Self { steps, method })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Invoke the method on the path target, if the target exists and
    /// exposes it. A missing target or method is a no-op.
    pub fn notify(&self, model: &mut dyn Model, value: &Value) -> Result<(), AttrError> {
        let args = std::slice::from_ref(value);
        match self.target(model) {
            Target::Model => match model.invoke(&self.method, args) {
                Some(result) => result.map(drop),
                None => Ok(()),
            },
            Target::Nested(target) => {
                match target.invoke(&self.method, Call::new(args).with_model(&*model)) {
                    Some(result) => result.map(drop),
                    None => Ok(()),
                }
            }
            Target::Missing => Ok(()),
        }
    }

    fn target(&self, model: &dyn Model) -> Target {
        let mut cursor = Target::Model;
        for step in &self.steps {
            cursor = match (cursor, step) {
                (Target::Model, Step::Owner) => model.owner().map_or(Target::Missing, Target::Nested),
                (Target::Model, Step::Member(name)) => object_target(model.property(name)),
                (Target::Nested(nested), Step::Owner) => {
                    nested.owner().map_or(Target::Missing, Target::Nested)
                }
                (Target::Nested(nested), Step::Member(name)) => object_target(nested.property(name)),
                (Target::Missing, _) => return Target::Missing,
            };
        }
        cursor
    }
}

enum Target {
    Model,
    Nested(Arc<dyn Nested>),
    Missing,
}

fn object_target(value: Option<Value>) -> Target {
    match value {
        Some(Value::Object(nested)) => Target::Nested(nested),
        _ => Target::Missing,
    }
}

/// Resolve a watcher reference into a write hook returning its input.
pub fn resolve(reference: WatcherRef) -> Result<SetHook, AttrError> {
    match reference {
        WatcherRef::Path(path) => {
            let path = RefPath::parse(&path)?;
            Ok(Arc::new(
                move |model: &mut dyn Model, value: Value, _name: &str| -> HookResult {
                    path.notify(model, &value)?;
                    Ok(Some(value))
                },
            ))
        }
        WatcherRef::Callable(watch) => Ok(Arc::new(
            move |model: &mut dyn Model, value: Value, _name: &str| -> HookResult {
                watch(&value, model)?;
                Ok(Some(value))
            },
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassSpec, Record};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Owner {
        seen: Mutex<Vec<Value>>,
        parent: Option<Arc<dyn Nested>>,
    }

    impl Nested for Owner {
        fn kind(&self) -> &str {
            "Owner"
        }

        fn owner(&self) -> Option<Arc<dyn Nested>> {
            self.parent.clone()
        }

        fn invoke(&self, method: &str, call: Call<'_>) -> Option<Result<Value, AttrError>> {
            match method {
                "onChange" => {
                    assert!(call.model.is_some());
                    self.seen.lock().unwrap().push(call.args[0].clone());
                    Some(Ok(Value::null()))
                }
                _ => None,
            }
        }
    }

    #[test]
    fn test_parse_member_path() {
        let path = RefPath::parse("editor.view.refresh").unwrap();
        assert_eq!(
            path.steps(),
            &[Step::Member("editor".into()), Step::Member("view".into())]
        );
        assert_eq!(path.method(), "refresh");
    }

    #[test]
    fn test_parse_caret_forms() {
        let plain = RefPath::parse("^onChange").unwrap();
        assert_eq!(plain.steps(), &[Step::Owner]);
        assert_eq!(plain.method(), "onChange");

        let dotted = RefPath::parse("^.onChange").unwrap();
        assert_eq!(dotted, plain);

        let own = RefPath::parse("onChange").unwrap();
        assert!(own.steps().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "  ", "a..b", "a.", "^", "a^b", "a.^", "on change"] {
            let err = RefPath::parse(bad).unwrap_err();
            assert!(
                matches!(err, AttrError::WrongWatcher { .. }),
                "expected failure for {bad:?}"
            );
        }
    }

    #[test]
    fn test_path_hook_calls_owner() {
        let owner = Arc::new(Owner::default());
        let mut model = Record::new(Arc::new(ClassSpec::new("Child")))
            .with_owner(owner.clone() as Arc<dyn Nested>);

        let hook = resolve("^onChange".into()).unwrap();
        let out = hook(&mut model, Value::from(7), "size").unwrap();

        assert_eq!(out, Some(Value::from(7)));
        assert_eq!(*owner.seen.lock().unwrap(), vec![Value::from(7)]);
    }

    #[test]
    fn test_path_hook_ascends_twice() {
        let root = Arc::new(Owner::default());
        let middle = Owner {
            parent: Some(root.clone() as Arc<dyn Nested>),
            ..Owner::default()
        };
        let mut model =
            Record::new(Arc::new(ClassSpec::new("Leaf"))).with_owner(Arc::new(middle));

        let hook = resolve("^^onChange".into()).unwrap();
        hook(&mut model, Value::from("x"), "label").unwrap();
        assert_eq!(root.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_target_is_noop() {
        let mut model = Record::new(Arc::new(ClassSpec::new("Orphan")));
        let hook = resolve("^onChange".into()).unwrap();
        assert_eq!(hook(&mut model, Value::from(1), "n").unwrap(), Some(Value::from(1)));

        let hook = resolve("sibling.onChange".into()).unwrap();
        assert_eq!(hook(&mut model, Value::from(2), "n").unwrap(), Some(Value::from(2)));
    }

    #[test]
    fn test_missing_method_is_noop() {
        let owner: Arc<dyn Nested> = Arc::new(Owner::default());
        let mut model = Record::new(Arc::new(ClassSpec::new("Child"))).with_owner(owner);
        let hook = resolve("^onRemove".into()).unwrap();
        assert_eq!(hook(&mut model, Value::from(1), "n").unwrap(), Some(Value::from(1)));
    }

    #[test]
    fn test_own_method_target() {
        let class = ClassSpec::new("Self").with_method("touch", |model: &mut dyn Model, args: &[Value]| {
            model.store("touched", args[0].clone());
            Ok(Value::null())
        });
        let mut model = Record::new(Arc::new(class));

        let hook = resolve("touch".into()).unwrap();
        hook(&mut model, Value::from(3), "n").unwrap();
        assert_eq!(model.attribute("touched"), Some(&Value::from(3)));
    }

    #[test]
    fn test_callable_watcher() {
        let hook = resolve(WatcherRef::callable(|value: &Value, model: &mut dyn Model| {
            model.store("mirror", value.clone());
            Ok(())
        }))
        .unwrap();

        let mut model = Record::new(Arc::new(ClassSpec::new("Mirror")));
        let out = hook(&mut model, Value::from("v"), "source").unwrap();
        assert_eq!(out, Some(Value::from("v")));
        assert_eq!(model.attribute("mirror"), Some(&Value::from("v")));
    }
}
