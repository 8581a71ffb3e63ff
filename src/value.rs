//! Runtime values produced by the evaluator.
//!
//! [`Value`] is a closed enum covering every first-class Snek value: numbers,
//! booleans, the empty list `Nil`, cons cells, user-defined closures and native
//! builtins. Lists are chains of [`Pair`]s terminated by `Nil`. Pairs are immutable
//! once built and shared through `Rc`, so passing a list around never copies it and
//! no program can observe the sharing.

use crate::Error;
use crate::ast::{Expression, Number};
use crate::evaluator::{Arity, Environment};
use std::fmt;
use std::rc::Rc;

/// Native procedure implementations stored in [`Value::Builtin`]
#[derive(Clone, Copy)]
pub enum BuiltinFn {
    /// Works on its argument values alone
    Simple(fn(&[Value]) -> Result<Value, Error>),
    /// Calls procedures it receives as arguments (`map`, `filter`, `reduce`).
    /// Also receives the current evaluation depth so those calls stay bounded.
    HigherOrder(fn(&[Value], usize) -> Result<Value, Error>),
}

/// A cons cell
pub struct Pair {
    pub car: Value,
    pub cdr: Value,
}

impl Drop for Pair {
    // Unlink the cdr chain iteratively; the default recursive drop would use one
    // stack frame per element of a long list.
    fn drop(&mut self) {
        let mut next = std::mem::replace(&mut self.cdr, Value::Nil);
        while let Value::Pair(rc) = next {
            match Rc::try_unwrap(rc) {
                Ok(mut pair) => next = std::mem::replace(&mut pair.cdr, Value::Nil),
                Err(_) => break,
            }
        }
    }
}

/// A user-defined procedure together with the environment it was defined in.
///
/// A closure bound in the frame it captures (any `:=` function definition) forms an
/// `Rc` cycle, so that frame is never freed.
pub struct Closure {
    pub params: Vec<String>,
    pub body: Expression,
    pub env: Environment,
}

/// Core runtime type of the interpreter
#[derive(Clone)]
pub enum Value {
    Number(Number),
    Bool(bool),
    /// The empty list, also the terminator of every proper list
    Nil,
    Pair(Rc<Pair>),
    Closure(Rc<Closure>),
    /// Native procedure; compared by id
    Builtin {
        id: Rc<str>,
        arity: Arity,
        func: BuiltinFn,
    },
}

impl Value {
    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Pair(Rc::new(Pair { car, cdr }))
    }

    /// Build a proper list holding `items` in order
    pub fn list_from<I>(items: I) -> Value
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(Value::Nil, |tail, item| Value::cons(item, tail))
    }

    pub fn closure(params: Vec<String>, body: Expression, env: Environment) -> Value {
        Value::Closure(Rc::new(Closure { params, body, env }))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Builtin { .. })
    }

    /// `#f`, `nil` and numeric zero are false; everything else is true
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Nil => false,
            Value::Number(n) => !n.is_zero(),
            Value::Pair(_) | Value::Closure(_) | Value::Builtin { .. } => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Nil => "nil",
            Value::Pair(_) => "pair",
            Value::Closure(_) => "function",
            Value::Builtin { .. } => "builtin",
        }
    }

    pub fn as_pair(&self) -> Option<&Pair> {
        match self {
            Value::Pair(pair) => Some(pair),
            _ => None,
        }
    }

    /// Iterate over the elements of a list. Yields an error (once) when the chain
    /// ends in something other than `Nil`, including when `self` is not a list at all.
    pub fn iter_list(&self) -> ListIter<'_> {
        ListIter {
            current: Some(self),
        }
    }

    /// Collect the elements of a proper list
    pub fn list_to_vec(&self) -> Result<Vec<Value>, Error> {
        self.iter_list().map(|item| item.cloned()).collect()
    }
}

/// Iterator over the elements of a cons-cell list, see [`Value::iter_list`]
pub struct ListIter<'a> {
    current: Option<&'a Value>,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = Result<&'a Value, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current.take()? {
            Value::Nil => None,
            Value::Pair(pair) => {
                self.current = Some(&pair.cdr);
                Some(Ok(&pair.car))
            }
            other => Some(Err(Error::type_error(format!(
                "expected a list, found {}",
                other.type_name()
            )))),
        }
    }
}

impl std::iter::FusedIterator for ListIter<'_> {}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Nil => write!(f, "Nil"),
            Value::Pair(pair) => {
                // Walk the cdr chain in a loop so long lists do not recurse per element
                let mut open = 0;
                let mut current = pair;
                loop {
                    write!(f, "Pair({:?}, ", current.car)?;
                    open += 1;
                    match &current.cdr {
                        Value::Pair(next) => current = next,
                        tail => {
                            write!(f, "{tail:?}")?;
                            break;
                        }
                    }
                }
                (0..open).try_for_each(|_| f.write_str(")"))
            }
            // The captured environment may contain this very closure; never print it.
            Value::Closure(closure) => write!(
                f,
                "Closure(params={:?}, body={})",
                closure.params, closure.body
            ),
            Value::Builtin { id, .. } => write!(f, "Builtin({id})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Nil => write!(f, "nil"),
            Value::Pair(pair) => {
                write!(f, "({}", pair.car)?;
                let mut rest = &pair.cdr;
                loop {
                    match rest {
                        Value::Nil => break,
                        Value::Pair(next) => {
                            write!(f, " {}", next.car)?;
                            rest = &next.cdr;
                        }
                        tail => {
                            write!(f, " . {tail}")?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
            Value::Closure(closure) => write!(f, "#<function ({})>", closure.params.join(" ")),
            Value::Builtin { id, .. } => write!(f, "#<builtin {id}>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        let (mut left, mut right) = (self, other);
        // Walk cdr chains in a loop so long lists compare without deep recursion
        loop {
            match (left, right) {
                (Value::Pair(a), Value::Pair(b)) => {
                    if Rc::ptr_eq(a, b) {
                        return true;
                    }
                    if a.car != b.car {
                        return false;
                    }
                    left = &a.cdr;
                    right = &b.cdr;
                }
                (Value::Number(a), Value::Number(b)) => return a == b,
                (Value::Bool(a), Value::Bool(b)) => return a == b,
                (Value::Nil, Value::Nil) => return true,
                (Value::Closure(a), Value::Closure(b)) => return Rc::ptr_eq(a, b),
                (Value::Builtin { id: id1, .. }, Value::Builtin { id: id2, .. }) => {
                    return id1 == id2;
                }
                _ => return false,
            }
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Number::Int(n.into()))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::Int(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(Number::Float(x))
    }
}

// Fallible conversions from `Value` back into primitive Rust types.

impl TryFrom<&Value> for Number {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Number, Error> {
        if let Value::Number(n) = value {
            Ok(*n)
        } else {
            Err(Error::type_error(format!(
                "expected number, found {value}"
            )))
        }
    }
}

/// Helper function for building expected values in tests
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for building proper lists in tests
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn list<T: Into<Value>>(items: Vec<T>) -> Value {
    Value::list_from(items.into_iter().map(Into::into))
}
