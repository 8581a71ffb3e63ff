//! Snek - a small Lisp-flavoured language with a tree-walking interpreter
//!
//! This crate provides the interpreter core for Snek: a tokenizer, a parser that
//! builds an s-expression tree, and an evaluator with lexically scoped environments,
//! user-defined closures and a cons-cell list library.
//!
//! ```text
//! (:= (square x) (* x x))             ; shorthand function definition
//! (map square (list 1 2 3))           ; => (1 4 9)
//! (let ((x 2) (y 3)) (+ x y))         ; => 5
//! (and (=? 1 2) (/ 1 0))              ; => #f, the division is never evaluated
//! ```
//!
//! ## Pipeline
//!
//! Source text flows through three stages, each usable on its own:
//!
//! 1. [`tokenizer::tokenize`] splits text into paren and atom tokens, dropping comments
//! 2. [`parser::parse`] builds an [`ast::Expression`] and checks the shape of `:=` and `function`
//! 3. [`evaluator::evaluate`] runs the tree against an [`evaluator::Environment`]
//!
//! [`parse_source`] and [`run`] chain the stages for the common case.
//!
//! ## Errors
//!
//! Every stage reports failure through [`Error`], which has exactly one variant per
//! error kind: syntax errors come only from the parser, name errors from unbound
//! symbols, and evaluation errors from everything else at runtime.
//!
//! ## Modules
//!
//! - `tokenizer`: source text to tokens
//! - `parser`: tokens to expression trees, special-form validation
//! - `ast`: expression tree and number types
//! - `value`: runtime values, cons cells and closures
//! - `evaluator`: environments, special forms and procedure application
//! - `builtinops`: registry of builtin procedures and special forms

use std::fmt;

/// Maximum nesting depth of combinations accepted by the parser
pub const MAX_PARSE_DEPTH: usize = 100;

/// Maximum evaluation depth before a program is reported as recursing too deeply.
/// Each nested evaluation (argument, branch, procedure body) counts one level, so a
/// recursive Snek procedure uses about three levels per call.
/// Sized so the limit is hit before a 2 MiB thread stack runs out in a debug build
pub const MAX_EVAL_DEPTH: usize = 200;

/// Categorizes the different kinds of syntax errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// No tokens at all
    Empty,
    /// A token that cannot start or appear at this position (lone paren, missing open paren)
    InvalidSyntax,
    /// A `)` with no open group to close
    UnmatchedClose,
    /// Input ended with groups still open
    Incomplete,
    /// A `:=` or `function` form with the wrong shape
    MalformedForm,
    /// Nesting exceeded [`MAX_PARSE_DEPTH`]
    TooDeeplyNested,
}

/// A structured syntax error.
#[derive(Debug, PartialEq, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
        }
    }
}

/// Which of the three error kinds an [`Error`] belongs to
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    Syntax,
    Name,
    Evaluation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Syntax => write!(f, "SyntaxError"),
            ErrorKind::Name => write!(f, "NameError"),
            ErrorKind::Evaluation => write!(f, "EvaluationError"),
        }
    }
}

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Malformed token structure or special-form shape, raised only while parsing
    #[error("SyntaxError: {0}")]
    SyntaxError(ParseError),
    /// A symbol with no binding where one is required
    #[error("NameError: {0}")]
    NameError(String),
    /// Any other runtime failure
    #[error("EvaluationError: {0}")]
    EvaluationError(String),
}

impl Error {
    /// Create a syntax error of the given kind
    pub fn syntax(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Error::SyntaxError(ParseError::new(kind, message))
    }

    /// Create an evaluation error for a call with the wrong number of arguments
    pub fn arity_error(expected: usize, got: usize) -> Self {
        Error::EvaluationError(format!("expected {expected} arguments, got {got}"))
    }

    /// Create an evaluation error for an operand of the wrong type
    pub fn type_error(message: impl fmt::Display) -> Self {
        Error::EvaluationError(format!("type error: {message}"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::SyntaxError(_) => ErrorKind::Syntax,
            Error::NameError(_) => ErrorKind::Name,
            Error::EvaluationError(_) => ErrorKind::Evaluation,
        }
    }
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod parser;
pub mod tokenizer;
pub mod value;

/// Tokenize and parse a complete Snek program.
pub fn parse_source(source: &str) -> Result<ast::Expression, Error> {
    parser::parse(&tokenizer::tokenize(source))
}

/// Tokenize, parse and evaluate `source` in `env`.
pub fn run(source: &str, env: &evaluator::Environment) -> Result<value::Value, Error> {
    let expr = parse_source(source)?;
    evaluator::evaluate(&expr, env)
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::evaluator::{Environment, create_global_env};
    use crate::value::Value;

    #[test]
    fn test_error_kinds_are_distinguishable() {
        let global = create_global_env();
        let env = Environment::with_parent(&global);

        let cases = vec![
            ("(+ 1", ErrorKind::Syntax),
            (")", ErrorKind::Syntax),
            ("(:= 3 4)", ErrorKind::Syntax),
            ("undefined-name", ErrorKind::Name),
            ("(del never-bound)", ErrorKind::Name),
            ("(car 5)", ErrorKind::Evaluation),
            ("(1 2 3)", ErrorKind::Evaluation),
        ];

        for (i, (source, expected)) in cases.into_iter().enumerate() {
            let err = run(source, &env).unwrap_err();
            assert_eq!(err.kind(), expected, "case #{}: {source} gave {err}", i + 1);
        }
    }

    #[test]
    fn test_error_display_names_the_kind() {
        let err = Error::syntax(ParseErrorKind::UnmatchedClose, "extra close paren");
        assert_eq!(format!("{err}"), "SyntaxError: extra close paren");
        assert_eq!(
            format!("{}", Error::NameError("x".into())),
            "NameError: x"
        );
        assert_eq!(
            format!("{}", Error::arity_error(2, 3)),
            "EvaluationError: expected 2 arguments, got 3"
        );
        assert_eq!(ErrorKind::Evaluation.to_string(), "EvaluationError");
    }

    #[test]
    fn test_run_shares_environment_between_calls() {
        let global = create_global_env();
        let env = Environment::with_parent(&global);

        run("(:= (add2 x y) (+ x y))", &env).unwrap();
        run("(:= base 40)", &env).unwrap();
        assert_eq!(run("(add2 base 2)", &env).unwrap(), Value::from(42));
    }
}
