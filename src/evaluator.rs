use crate::Error;
use crate::MAX_EVAL_DEPTH;
use crate::ast::Expression;
use crate::builtinops::{OpKind, builtin_constants, find_special_form, get_builtin_ops};
use crate::value::{BuiltinFn, Value};
use std::fmt;
use std::rc::Rc;

mod environment;

pub use environment::Environment;

/// Expected number of arguments for a builtin or special form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly N arguments
    Exact(usize),
    /// At least N arguments
    AtLeast(usize),
    /// Any number of arguments
    Any,
}

impl Arity {
    /// Validate an argument count against this arity
    pub fn validate(self, arg_count: usize) -> Result<(), Error> {
        match self {
            Arity::Exact(expected) if arg_count != expected => {
                Err(Error::arity_error(expected, arg_count))
            }
            Arity::AtLeast(min) if arg_count < min => Err(Error::EvaluationError(format!(
                "expected at least {min} arguments, got {arg_count}"
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "{n} or more"),
            Arity::Any => write!(f, "any"),
        }
    }
}

/// Evaluate an expression in `env` (public API)
pub fn evaluate(expr: &Expression, env: &Environment) -> Result<Value, Error> {
    eval_with_depth_tracking(expr, env, 0)
}

/// Evaluate an expression in a brand-new frame whose parent is a fresh builtin frame
pub fn evaluate_in_fresh_env(expr: &Expression) -> Result<Value, Error> {
    result_and_env(expr, None).map(|(value, _)| value)
}

/// Evaluate an expression and hand back the environment it ran in.
///
/// With `None`, a new top-level frame (child of a fresh builtin frame) is created, so
/// the definitions made by `expr` can be used by later calls:
///
/// ```
/// use snek::evaluator::result_and_env;
/// use snek::parse_source;
/// use snek::value::Value;
///
/// let (_, env) = result_and_env(&parse_source("(:= x 20)").unwrap(), None).unwrap();
/// let (value, _) = result_and_env(&parse_source("(+ x 1)").unwrap(), Some(&env)).unwrap();
/// assert_eq!(value, Value::from(21));
/// ```
pub fn result_and_env(
    expr: &Expression,
    env: Option<&Environment>,
) -> Result<(Value, Environment), Error> {
    let env = match env {
        Some(env) => env.clone(),
        None => Environment::with_parent(&create_global_env()),
    };
    let value = evaluate(expr, &env)?;
    Ok((value, env))
}

/// Evaluate an expression with depth tracking to prevent stack overflow
fn eval_with_depth_tracking(
    expr: &Expression,
    env: &Environment,
    depth: usize,
) -> Result<Value, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(Error::EvaluationError(format!(
            "Evaluation depth limit exceeded (max: {MAX_EVAL_DEPTH})"
        )));
    }
    match expr {
        Expression::Number(n) => Ok(Value::Number(*n)),
        Expression::Symbol(name) => env.lookup(name),
        Expression::Combination(elements) => eval_combination(elements, env, depth),
    }
}

/// Helper function to evaluate a list of argument expressions with depth tracking
fn eval_args(
    args: &[Expression],
    env: &Environment,
    depth: usize,
) -> Result<Vec<Value>, Error> {
    args.iter()
        .map(|arg| eval_with_depth_tracking(arg, env, depth + 1))
        .collect()
}

/// Evaluate a combination: a special form when the head is a keyword, otherwise a call.
///
/// Keywords are matched by spelling before any lookup, so binding a variable named
/// `if` does not change what `(if ...)` means.
fn eval_combination(
    elements: &[Expression],
    env: &Environment,
    depth: usize,
) -> Result<Value, Error> {
    match elements {
        [] => Err(Error::EvaluationError(
            "Cannot evaluate an empty combination".to_owned(),
        )),

        [head, arg_exprs @ ..] => {
            if let Some(keyword) = head.as_symbol()
                && let Some(op) = find_special_form(keyword)
                && let OpKind::SpecialForm(special_form) = op.op_kind
            {
                op.validate_arity(arg_exprs.len())
                    .map_err(|err| add_context(err, keyword))?;
                return special_form(arg_exprs, env, depth);
            }

            let func = eval_with_depth_tracking(head, env, depth + 1)?;
            let args = eval_args(arg_exprs, env, depth)?;
            apply(&func, &args, depth)
        }
    }
}

/// Helper function to name the form or procedure an evaluation error came from
fn add_context(error: Error, name: &str) -> Error {
    match error {
        Error::EvaluationError(msg) => Error::EvaluationError(format!("{name}: {msg}")),
        other => other,
    }
}

/// Call a procedure value with already-evaluated arguments.
///
/// `depth` is the depth of the call site; a closure body runs one level deeper.
pub(crate) fn apply(func: &Value, args: &[Value], depth: usize) -> Result<Value, Error> {
    match func {
        Value::Builtin { id, arity, func } => {
            log::trace!("calling builtin {id} with {} arguments", args.len());
            arity.validate(args.len()).map_err(|err| add_context(err, id))?;
            match func {
                BuiltinFn::Simple(f) => f(args),
                BuiltinFn::HigherOrder(f) => f(args, depth),
            }
            .map_err(|err| add_context(err, id))
        }
        Value::Closure(closure) => {
            log::trace!(
                "calling function ({}) with {} arguments",
                closure.params.join(" "),
                args.len()
            );
            if closure.params.len() != args.len() {
                return Err(Error::arity_error(closure.params.len(), args.len()));
            }

            // Parameters live in a new frame whose parent is the defining environment
            let frame = Environment::with_parent(&closure.env);
            for (param, arg) in closure.params.iter().zip(args) {
                frame.define(param.as_str(), arg.clone());
            }

            eval_with_depth_tracking(&closure.body, &frame, depth + 1)
        }
        other => Err(Error::EvaluationError(format!(
            "Cannot call non-function: {other}"
        ))),
    }
}

/// Collect parameter names from a `function` parameter list or `:=` shorthand target
fn param_names(params: &[Expression]) -> Result<Vec<String>, Error> {
    params
        .iter()
        .map(|param| {
            param.as_symbol().map(str::to_owned).ok_or_else(|| {
                Error::EvaluationError(format!("parameter must be a name, found {param}"))
            })
        })
        .collect()
}

/// Evaluate function special form
pub(crate) fn eval_function(
    args: &[Expression],
    env: &Environment,
    _depth: usize,
) -> Result<Value, Error> {
    match args {
        [Expression::Combination(params), body] => Ok(Value::closure(
            param_names(params)?,
            body.clone(),
            env.clone(),
        )),
        [_, _] => Err(Error::EvaluationError(
            "function parameters must be a list".to_owned(),
        )),
        _ => Err(Error::arity_error(2, args.len())),
    }
}

/// Evaluate := special form, including the `(:= (name params...) body)` shorthand
pub(crate) fn eval_define(
    args: &[Expression],
    env: &Environment,
    depth: usize,
) -> Result<Value, Error> {
    let (name, value) = match args {
        [Expression::Symbol(name), expr] => {
            (name, eval_with_depth_tracking(expr, env, depth + 1)?)
        }
        [Expression::Combination(target), body] => match &target[..] {
            [Expression::Symbol(name), params @ ..] => (
                name,
                Value::closure(param_names(params)?, body.clone(), env.clone()),
            ),
            _ => {
                return Err(Error::EvaluationError(
                    ":= shorthand requires a function name".to_owned(),
                ));
            }
        },
        [_, _] => {
            return Err(Error::EvaluationError(
                ":= requires a name to bind".to_owned(),
            ));
        }
        _ => return Err(Error::arity_error(2, args.len())),
    };

    log::debug!("define {name} = {value}");
    env.define(name.as_str(), value.clone());
    Ok(value)
}

/// Evaluate if special form
pub(crate) fn eval_if(
    args: &[Expression],
    env: &Environment,
    depth: usize,
) -> Result<Value, Error> {
    match args {
        [condition_expr, then_expr, else_expr] => {
            let condition = eval_with_depth_tracking(condition_expr, env, depth + 1)?;
            if condition.is_truthy() {
                eval_with_depth_tracking(then_expr, env, depth + 1)
            } else {
                eval_with_depth_tracking(else_expr, env, depth + 1)
            }
        }
        _ => Err(Error::arity_error(3, args.len())),
    }
}

macro_rules! boolean_logic_op {
    ($name:ident, $short_circuit:literal, $default:literal) => {
        pub(crate) fn $name(
            args: &[Expression],
            env: &Environment,
            depth: usize,
        ) -> Result<Value, Error> {
            // Left to right, stopping at the first deciding operand
            for arg in args {
                let result = eval_with_depth_tracking(arg, env, depth + 1)?;
                if result.is_truthy() == $short_circuit {
                    return Ok(Value::Bool($short_circuit));
                }
            }

            Ok(Value::Bool($default))
        }
    };
}

// Generate boolean logic functions
boolean_logic_op!(eval_and, false, true);
boolean_logic_op!(eval_or, true, false);

/// Evaluate cons special form
pub(crate) fn eval_cons(
    args: &[Expression],
    env: &Environment,
    depth: usize,
) -> Result<Value, Error> {
    match args {
        [car_expr, cdr_expr] => {
            let car = eval_with_depth_tracking(car_expr, env, depth + 1)?;
            let cdr = eval_with_depth_tracking(cdr_expr, env, depth + 1)?;
            Ok(Value::cons(car, cdr))
        }
        _ => Err(Error::arity_error(2, args.len())),
    }
}

/// Evaluate begin special form
pub(crate) fn eval_begin(
    args: &[Expression],
    env: &Environment,
    depth: usize,
) -> Result<Value, Error> {
    let mut result = Err(Error::EvaluationError(
        "begin requires at least one expression".to_owned(),
    ));
    for expr in args {
        result = Ok(eval_with_depth_tracking(expr, env, depth + 1)?);
    }
    result
}

/// Evaluate del special form
pub(crate) fn eval_del(
    args: &[Expression],
    env: &Environment,
    _depth: usize,
) -> Result<Value, Error> {
    match args {
        [Expression::Symbol(name)] => {
            let value = env.remove_local(name).ok_or_else(|| {
                Error::NameError(format!("cannot del '{name}': not bound in this frame"))
            })?;
            log::debug!("del {name}");
            Ok(value)
        }
        [_] => Err(Error::EvaluationError("del requires a name".to_owned())),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

/// Evaluate let special form
pub(crate) fn eval_let(
    args: &[Expression],
    env: &Environment,
    depth: usize,
) -> Result<Value, Error> {
    let [Expression::Combination(bindings), body] = args else {
        return match args {
            [_, _] => Err(Error::EvaluationError(
                "let bindings must be a list".to_owned(),
            )),
            _ => Err(Error::arity_error(2, args.len())),
        };
    };

    // Every value is computed in the enclosing environment before any name is bound
    let mut values = Vec::with_capacity(bindings.len());
    for binding in bindings.iter() {
        match binding {
            Expression::Combination(pair) => match &pair[..] {
                [Expression::Symbol(name), expr] => {
                    values.push((name, eval_with_depth_tracking(expr, env, depth + 1)?));
                }
                _ => {
                    return Err(Error::EvaluationError(format!(
                        "let binding must be (name expression), found {binding}"
                    )));
                }
            },
            _ => {
                return Err(Error::EvaluationError(format!(
                    "let binding must be (name expression), found {binding}"
                )));
            }
        }
    }

    let frame = Environment::with_parent(env);
    for (name, value) in values {
        frame.define(name.as_str(), value);
    }
    eval_with_depth_tracking(body, &frame, depth + 1)
}

/// Evaluate set! special form
pub(crate) fn eval_set(
    args: &[Expression],
    env: &Environment,
    depth: usize,
) -> Result<Value, Error> {
    match args {
        [Expression::Symbol(name), expr] => {
            let value = eval_with_depth_tracking(expr, env, depth + 1)?;
            env.set_existing(name, value.clone())?;
            log::debug!("set! {name} = {value}");
            Ok(value)
        }
        [_, _] => Err(Error::EvaluationError("set! requires a name".to_owned())),
        _ => Err(Error::arity_error(2, args.len())),
    }
}

/// Create a global environment with built-in functions and constants
pub fn create_global_env() -> Environment {
    let env = Environment::new();

    // Add all regular functions from the registry
    for builtin_op in get_builtin_ops() {
        if let OpKind::Function(func) = builtin_op.op_kind {
            env.define(
                builtin_op.id,
                Value::Builtin {
                    id: Rc::from(builtin_op.id),
                    arity: builtin_op.arity,
                    func,
                },
            );
        }
    }

    for (name, value) in builtin_constants() {
        env.define(name, value);
    }

    env
}
