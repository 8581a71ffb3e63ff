//! This module defines the parsed program representation and the numeric type shared
//! by programs and runtime values. The main enum, [`Expression`], has exactly three
//! shapes: numbers, symbols and combinations. Combinations share their element storage,
//! so cloning a subtree (for example when a closure captures its body) is cheap and the
//! tree itself is never mutated after parsing. Ergonomic helper functions such as
//! [`num`], [`sym`] and [`combo`] are provided for building trees in tests.

use crate::Error;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Numeric values in Snek: machine integers and floats, nothing wider.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Classify an atom token the way the parser does: integer first, then float.
    pub fn parse(text: &str) -> Option<Number> {
        if let Ok(n) = text.parse::<i64>() {
            return Some(Number::Int(n));
        }
        text.parse::<f64>().ok().map(Number::Float)
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(x) => x == 0.0,
        }
    }

    pub fn checked_add(self, other: Number) -> Result<Number, Error> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map(Number::Int)
                .ok_or_else(|| Error::EvaluationError("Integer overflow in addition".into())),
            (a, b) => Ok(Number::Float(a.as_f64() + b.as_f64())),
        }
    }

    pub fn checked_sub(self, other: Number) -> Result<Number, Error> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_sub(b)
                .map(Number::Int)
                .ok_or_else(|| Error::EvaluationError("Integer overflow in subtraction".into())),
            (a, b) => Ok(Number::Float(a.as_f64() - b.as_f64())),
        }
    }

    pub fn checked_mul(self, other: Number) -> Result<Number, Error> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.checked_mul(b).map(Number::Int).ok_or_else(
                || Error::EvaluationError("Integer overflow in multiplication".into()),
            ),
            (a, b) => Ok(Number::Float(a.as_f64() * b.as_f64())),
        }
    }

    /// True division: the quotient is always a float.
    pub fn checked_div(self, other: Number) -> Result<Number, Error> {
        if other.is_zero() {
            return Err(Error::EvaluationError("Division by zero".into()));
        }
        Ok(Number::Float(self.as_f64() / other.as_f64()))
    }

    pub fn checked_neg(self) -> Result<Number, Error> {
        match self {
            Number::Int(n) => n
                .checked_neg()
                .map(Number::Int)
                .ok_or_else(|| Error::EvaluationError("Integer overflow in negation".into())),
            Number::Float(x) => Ok(Number::Float(-x)),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            // Debug formatting keeps the fractional part: 2.0 prints as "2.0", not "2"
            Number::Float(x) => write!(f, "{x:?}"),
        }
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Number {
            fn from(n: $int_type) -> Self {
                Number::Int(n as i64)
            }
        }
    };
}

impl_from_integer!(i32);
impl_from_integer!(i64);
impl_from_integer!(u32);

impl From<f64> for Number {
    fn from(x: f64) -> Self {
        Number::Float(x)
    }
}

/// Parsed program representation.
///
/// To build a tree by hand, use the helper functions:
/// - `num(42)` / `num(2.5)` for numbers, `sym("name")` for symbols
/// - `combo(vec![sym("+"), num(1), num(2)])` for combinations
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(Number),
    Symbol(String),
    Combination(Rc<[Expression]>),
}

impl Expression {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expression::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// The leading keyword of a combination, if it starts with a symbol
    pub(crate) fn head_symbol(&self) -> Option<&str> {
        match self {
            Expression::Combination(elements) => elements.first().and_then(Expression::as_symbol),
            _ => None,
        }
    }
}

impl From<Vec<Expression>> for Expression {
    fn from(elements: Vec<Expression>) -> Self {
        Expression::Combination(elements.into())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(n) => write!(f, "{n}"),
            Expression::Symbol(s) => write!(f, "{s}"),
            Expression::Combination(elements) => {
                write!(f, "(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Helper function for creating number literals
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn num<N: Into<Number>>(n: N) -> Expression {
    Expression::Number(n.into())
}

/// Helper function for creating symbols
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Expression {
    Expression::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating combinations
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn combo(elements: Vec<Expression>) -> Expression {
    Expression::from(elements)
}

#[cfg(test)]
mod helper_function_tests {
    use super::*;

    #[test]
    fn test_helper_functions_data_driven() {
        let test_cases = vec![
            (num(42), Expression::Number(Number::Int(42))),
            (num(-17), Expression::Number(Number::Int(-17))),
            (num(i64::MAX), Expression::Number(Number::Int(i64::MAX))),
            (num(2.75), Expression::Number(Number::Float(2.75))),
            (sym("elt-at-index"), Expression::Symbol("elt-at-index".to_owned())),
            (sym(String::from(":=")), Expression::Symbol(":=".to_owned())),
            (combo(vec![]), Expression::Combination(Rc::from(Vec::<Expression>::new()))),
            (
                combo(vec![sym("+"), num(1), combo(vec![sym("-"), num(2)])]),
                Expression::Combination(Rc::from(vec![
                    Expression::Symbol("+".to_owned()),
                    Expression::Number(Number::Int(1)),
                    Expression::Combination(Rc::from(vec![
                        Expression::Symbol("-".to_owned()),
                        Expression::Number(Number::Int(2)),
                    ])),
                ])),
            ),
        ];

        for (i, (actual, expected)) in test_cases.iter().enumerate() {
            assert_eq!(actual, expected, "Test case {} failed", i + 1);
        }
    }

    #[test]
    fn test_number_classification() {
        let cases = vec![
            ("5", Some(Number::Int(5))),
            ("-12", Some(Number::Int(-12))),
            ("2.75", Some(Number::Float(2.75))),
            ("-0.5", Some(Number::Float(-0.5))),
            ("1e3", Some(Number::Float(1000.0))),
            ("x", None),
            ("-", None),
            ("+", None),
            ("1-2", None),
            ("elt-at-index", None),
        ];

        for (text, expected) in cases {
            let actual = Number::parse(text);
            match (actual, expected) {
                (Some(Number::Int(a)), Some(Number::Int(b))) => assert_eq!(a, b, "{text}"),
                (Some(Number::Float(a)), Some(Number::Float(b))) => assert_eq!(a, b, "{text}"),
                (None, None) => {}
                (actual, expected) => panic!("{text}: expected {expected:?}, got {actual:?}"),
            }
        }
    }

    #[test]
    #[expect(clippy::unwrap_used)] // test code OK
    fn test_number_arithmetic() {
        let int = Number::Int;
        let float = Number::Float;

        assert_eq!(int(2).checked_add(int(3)).unwrap(), int(5));
        assert!(matches!(int(2).checked_add(float(0.5)).unwrap(), Number::Float(x) if x == 2.5));
        assert_eq!(int(7).checked_sub(int(10)).unwrap(), int(-3));
        assert_eq!(int(6).checked_mul(int(7)).unwrap(), int(42));
        assert!(matches!(int(1).checked_div(int(2)).unwrap(), Number::Float(x) if x == 0.5));
        assert!(matches!(int(6).checked_div(int(3)).unwrap(), Number::Float(x) if x == 2.0));
        assert_eq!(int(5).checked_neg().unwrap(), int(-5));

        assert!(int(1).checked_div(int(0)).is_err());
        assert!(float(1.0).checked_div(float(0.0)).is_err());
        assert!(int(i64::MAX).checked_add(int(1)).is_err());
        assert!(int(i64::MIN).checked_sub(int(1)).is_err());
        assert!(int(i64::MAX).checked_mul(int(2)).is_err());
        assert!(int(i64::MIN).checked_neg().is_err());
    }

    #[test]
    fn test_number_equality_and_ordering_across_kinds() {
        assert_eq!(Number::Int(2), Number::Float(2.0));
        assert_ne!(Number::Int(2), Number::Float(2.5));
        assert!(Number::Int(2) < Number::Float(2.5));
        assert!(Number::Float(-1.0) < Number::Int(0));
        assert!(Number::Int(3) >= Number::Int(3));
    }

    #[test]
    fn test_display() {
        assert_eq!(num(42).to_string(), "42");
        assert_eq!(num(2.0).to_string(), "2.0");
        assert_eq!(num(2.75).to_string(), "2.75");
        assert_eq!(
            combo(vec![sym("foo"), combo(vec![sym("bar"), num(2.75)])]).to_string(),
            "(foo (bar 2.75))"
        );
        assert_eq!(combo(vec![]).to_string(), "()");
    }
}
