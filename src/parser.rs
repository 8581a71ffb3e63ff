//! Token-stream parser.
//!
//! Builds an [`Expression`] from the output of [`crate::tokenizer::tokenize`] and then
//! checks the shape of the two definition forms, `:=` and `function`, so that malformed
//! definitions are reported as syntax errors before anything runs.

use crate::ast::{Expression, Number};
use crate::{Error, MAX_PARSE_DEPTH, ParseErrorKind};

const OPEN: &str = "(";
const CLOSE: &str = ")";

/// Classify an atom token: integer, then float, else symbol
fn parse_atom(token: &str) -> Expression {
    match Number::parse(token) {
        Some(n) => Expression::Number(n),
        None => Expression::Symbol(token.to_owned()),
    }
}

/// Parse a token sequence into a single expression.
///
/// A single token must be an atom. Longer inputs must start with `(`; when they hold
/// several top-level forms, the forms are returned together as one combination.
pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Expression, Error> {
    log::trace!("parsing {} tokens", tokens.len());

    let expr = match tokens {
        [] => return Err(Error::syntax(ParseErrorKind::Empty, "no tokens to parse")),
        [single] => parse_single(single.as_ref())?,
        [first, ..] if first.as_ref() != OPEN => {
            return Err(Error::syntax(
                ParseErrorKind::InvalidSyntax,
                format!("expression must begin with '(', found '{}'", first.as_ref()),
            ));
        }
        _ => parse_groups(tokens)?,
    };

    if matches!(&expr, Expression::Combination(elements) if elements.is_empty()) {
        return Err(Error::syntax(
            ParseErrorKind::InvalidSyntax,
            "cannot parse an empty combination as a program",
        ));
    }

    validate_special_forms(&expr)?;
    Ok(expr)
}

fn parse_single(token: &str) -> Result<Expression, Error> {
    if token == OPEN || token == CLOSE {
        return Err(Error::syntax(
            ParseErrorKind::InvalidSyntax,
            format!("a single token must be a number or symbol, found '{token}'"),
        ));
    }
    Ok(parse_atom(token))
}

/// Build nested combinations with an explicit stack of open groups
fn parse_groups<S: AsRef<str>>(tokens: &[S]) -> Result<Expression, Error> {
    // The bottom layer collects the top-level forms
    let mut layers: Vec<Vec<Expression>> = vec![Vec::new()];

    for token in tokens {
        match token.as_ref() {
            OPEN => {
                if layers.len() > MAX_PARSE_DEPTH {
                    return Err(Error::syntax(
                        ParseErrorKind::TooDeeplyNested,
                        format!("expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                    ));
                }
                layers.push(Vec::new());
            }
            CLOSE => {
                let group = layers.pop().unwrap_or_default();
                let Some(parent) = layers.last_mut() else {
                    return Err(Error::syntax(
                        ParseErrorKind::UnmatchedClose,
                        "parentheses mismatched: extra close paren",
                    ));
                };
                parent.push(Expression::from(group));
            }
            atom => {
                if let Some(current) = layers.last_mut() {
                    current.push(parse_atom(atom));
                }
            }
        }
    }

    if layers.len() != 1 {
        return Err(Error::syntax(
            ParseErrorKind::Incomplete,
            "parentheses mismatched: extra open paren",
        ));
    }

    let mut top_level = layers.pop().unwrap_or_default();
    if top_level.len() == 1
        && let Some(only) = top_level.pop()
    {
        return Ok(only);
    }
    Ok(Expression::from(top_level))
}

/// Check the shape of a top-level `:=` or `function` form, then recurse into its body.
///
/// Other combinations are not searched: a malformed form elsewhere (a call operand,
/// a `begin` step) is only reported when evaluated, and a `let` binding may use a
/// special-form keyword as its name.
fn validate_special_forms(expr: &Expression) -> Result<(), Error> {
    let Expression::Combination(elements) = expr else {
        return Ok(());
    };

    match expr.head_symbol() {
        Some(":=") => {
            validate_define(expr, elements)?;
            validate_special_forms(&elements[2])
        }
        Some("function") => {
            validate_function(expr, elements)?;
            validate_special_forms(&elements[2])
        }
        _ => Ok(()),
    }
}

fn malformed(expr: &Expression, message: &str) -> Error {
    log::debug!("rejecting malformed form {expr}: {message}");
    Error::syntax(ParseErrorKind::MalformedForm, format!("{message}: {expr}"))
}

fn all_symbols(elements: &[Expression]) -> bool {
    elements
        .iter()
        .all(|e| matches!(e, Expression::Symbol(name) if !name.is_empty()))
}

fn validate_define(expr: &Expression, elements: &[Expression]) -> Result<(), Error> {
    if elements.len() != 3 {
        return Err(malformed(expr, ":= requires a target and a body"));
    }
    match &elements[1] {
        Expression::Symbol(name) if !name.is_empty() => Ok(()),
        Expression::Combination(signature) if !signature.is_empty() => {
            if all_symbols(signature) {
                Ok(())
            } else {
                Err(malformed(
                    expr,
                    ":= function name and parameters must be symbols",
                ))
            }
        }
        _ => Err(malformed(
            expr,
            ":= target must be a name or a non-empty (name params...) list",
        )),
    }
}

fn validate_function(expr: &Expression, elements: &[Expression]) -> Result<(), Error> {
    if elements.len() != 3 {
        return Err(malformed(
            expr,
            "function requires a parameter list and a body",
        ));
    }
    match &elements[1] {
        Expression::Combination(params) if all_symbols(params) => Ok(()),
        Expression::Combination(_) => Err(malformed(expr, "function parameters must be symbols")),
        _ => Err(malformed(expr, "function parameters must be a list")),
    }
}
