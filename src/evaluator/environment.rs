use crate::Error;
use crate::evaluator::Arity;
use crate::value::{BuiltinFn, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Default)]
struct Frame {
    bindings: HashMap<String, Value>,
    parent: Option<Environment>,
}

/// Environment for variable bindings.
///
/// An `Environment` is a shared handle to one frame. Cloning the handle does not copy
/// the frame: closures and child frames that hold a clone all observe later
/// `:=`, `set!` and `del` mutations of it.
#[derive(Clone, Default)]
pub struct Environment {
    frame: Rc<RefCell<Frame>>,
}

impl Environment {
    /// Create a frame with no parent
    pub fn new() -> Self {
        Environment::default()
    }

    /// Create an empty frame whose lookups fall back to `parent`
    pub fn with_parent(parent: &Environment) -> Self {
        Environment {
            frame: Rc::new(RefCell::new(Frame {
                bindings: HashMap::new(),
                parent: Some(parent.clone()),
            })),
        }
    }

    pub fn parent(&self) -> Option<Environment> {
        self.frame.borrow().parent.clone()
    }

    /// Bind `name` in this frame, replacing any existing local binding
    pub fn define(&self, name: impl Into<String>, value: Value) {
        let previous = self.frame.borrow_mut().bindings.insert(name.into(), value);
        // Release the old value only after the frame borrow has ended
        drop(previous);
    }

    /// Look `name` up in this frame, then in each ancestor
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let parent = {
                let frame = current.frame.borrow();
                if let Some(value) = frame.bindings.get(name) {
                    return Some(value.clone());
                }
                frame.parent.clone()
            };
            current = parent?;
        }
    }

    /// Like [`Environment::get`], reporting a missing binding as a name error
    pub fn lookup(&self, name: &str) -> Result<Value, Error> {
        self.get(name)
            .ok_or_else(|| Error::NameError(format!("name '{name}' is not defined")))
    }

    /// Whether this frame itself (not an ancestor) binds `name`
    pub fn contains_local(&self, name: &str) -> bool {
        self.frame.borrow().bindings.contains_key(name)
    }

    /// Remove a binding from this frame only, returning its value
    pub fn remove_local(&self, name: &str) -> Option<Value> {
        self.frame.borrow_mut().bindings.remove(name)
    }

    /// Overwrite `name` in the nearest frame that already binds it
    pub fn set_existing(&self, name: &str, value: Value) -> Result<(), Error> {
        let mut current = self.clone();
        loop {
            if current.contains_local(name) {
                current.define(name, value);
                return Ok(());
            }
            current = current.parent().ok_or_else(|| {
                Error::NameError(format!("cannot set! '{name}': it is not defined"))
            })?;
        }
    }

    /// Register a native procedure in this frame.
    ///
    /// # Arguments
    /// * `name` - The name by which the procedure can be called
    /// * `arity` - Accepted argument counts, checked before every call
    /// * `func` - A function pointer that takes the evaluated arguments
    ///
    /// # Example
    /// ```
    /// use snek::evaluator::{Arity, Environment, create_global_env};
    /// use snek::value::Value;
    /// use snek::{Error, run};
    ///
    /// fn count_args(args: &[Value]) -> Result<Value, Error> {
    ///     Ok(Value::from(args.len() as i64))
    /// }
    ///
    /// let global = create_global_env();
    /// global.register_builtin_function("count-args", Arity::Any, count_args);
    /// let env = Environment::with_parent(&global);
    /// assert_eq!(run("(count-args 1 2 3)", &env).unwrap(), Value::from(3));
    /// ```
    pub fn register_builtin_function(
        &self,
        name: &str,
        arity: Arity,
        func: fn(&[Value]) -> Result<Value, Error>,
    ) {
        self.define(
            name,
            Value::Builtin {
                id: Rc::from(name),
                arity,
                func: BuiltinFn::Simple(func),
            },
        );
    }

    /// Names bound directly in this frame, sorted
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.frame.borrow().bindings.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get all bindings visible from this environment.
    /// Returns a Vec of (name, value) pairs sorted by name; inner bindings shadow outer ones.
    pub fn get_all_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings = HashMap::new();

        // Start with parent bindings (so they can be overridden by local bindings)
        if let Some(parent) = self.parent() {
            for (name, value) in parent.get_all_bindings() {
                bindings.insert(name, value);
            }
        }

        for (name, value) in &self.frame.borrow().bindings {
            bindings.insert(name.clone(), value.clone());
        }

        let mut result: Vec<_> = bindings.into_iter().collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}

impl PartialEq for Environment {
    /// Environments are equal when they are the same frame
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.frame, &other.frame)
    }
}

impl fmt::Debug for Environment {
    // Frames can hold closures that capture the frame itself, so only names are shown
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("bindings", &self.local_names())
            .field("has_parent", &self.frame.borrow().parent.is_some())
            .finish()
    }
}
