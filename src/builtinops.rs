//! Built-in operations registry.
//!
//! Every builtin procedure and special form is defined once in a static registry
//! that records its name, its implementation and how many arguments it accepts.
//!
//! ```text
//! (+ 1 2 3)                       ; procedure: arguments evaluated first
//! (if (> x 0) x (- x))            ; special form: controls evaluation of its operands
//! (map (function (x) (* x x)) xs) ; higher-order procedure: calls back into the evaluator
//! ```
//!
//! ## Functions vs Special Forms
//!
//! - **Functions**: Evaluate all arguments before application (e.g. `+`, `not`, `car`).
//!   They are bound as ordinary names in the builtin frame, so programs may rebind them.
//! - **Special Forms**: Receive their operands unevaluated (e.g. `if`, `and`, `:=`).
//!   They are recognized by keyword before any name lookup and are never bound as values.
//!
//! ## Error Handling
//!
//! - **Truthiness**: `not`, `if`, `and`, `or` and `filter` treat `#f`, `nil` and zero as false
//! - **Numeric operands**: arithmetic and ordering reject non-numbers
//! - **Overflow Detection**: integer arithmetic reports overflow instead of wrapping
//! - **Arity Checking**: argument counts are validated before every call
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** with signature `fn(&[Value]) -> Result<Value, Error>`,
//!    or `fn(&[Value], usize)` if it needs to call procedures it was given
//! 2. **Add to BUILTIN_OPS** with its identifier and arity
//! 3. **Add tests** covering edge cases and error conditions

use crate::Error;
use crate::ast::{Expression, Number};
use crate::evaluator::{
    Arity, Environment, apply, eval_and, eval_begin, eval_cons, eval_define, eval_del,
    eval_function, eval_if, eval_let, eval_or, eval_set,
};
use crate::value::{BuiltinFn, Pair, Value};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Signature shared by all special forms: unevaluated operands, the current
/// environment and the current evaluation depth
pub type SpecialFormFn = fn(&[Expression], &Environment, usize) -> Result<Value, Error>;

/// Represents the implementation of a built-in expression (function or special form)
#[derive(Clone, Copy)]
pub enum OpKind {
    /// Regular function that takes evaluated arguments and returns a value
    Function(BuiltinFn),
    /// Special form that requires access to the environment, unevaluated arguments and current evaluation stack depth
    SpecialForm(SpecialFormFn),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Function(_) => write!(f, "Function(<fn>)"),
            OpKind::SpecialForm(_) => write!(f, "SpecialForm(<fn>)"),
        }
    }
}

/// Definition of a built-in operation
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    /// The Snek identifier for this operation
    pub id: &'static str,
    /// The implementation of this operation (function or special form)
    pub op_kind: OpKind,
    /// Expected number of arguments
    pub arity: Arity,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        // Identifiers are unique within the registry
        self.id == other.id
    }
}

impl BuiltinOp {
    /// Check if this operation is a special form
    pub fn is_special_form(&self) -> bool {
        matches!(self.op_kind, OpKind::SpecialForm(_))
    }

    /// Check if the given number of arguments is valid for this operation
    pub(crate) fn validate_arity(&self, arg_count: usize) -> Result<(), Error> {
        self.arity.validate(arg_count)
    }
}

//
// Builtin Function Implementations
//

/// Convert every argument to a number, failing on the first non-number
fn numbers(args: &[Value]) -> Result<Vec<Number>, Error> {
    args.iter().map(Number::try_from).collect()
}

fn builtin_add(args: &[Value]) -> Result<Value, Error> {
    let mut sum = Number::Int(0);
    for n in numbers(args)? {
        sum = sum.checked_add(n)?;
    }
    Ok(Value::Number(sum))
}

fn builtin_sub(args: &[Value]) -> Result<Value, Error> {
    let nums = numbers(args)?;
    let [first, rest @ ..] = nums.as_slice() else {
        return Err(Error::arity_error(1, 0));
    };

    if rest.is_empty() {
        return first.checked_neg().map(Value::Number);
    }

    // The first operand minus the sum of the rest
    let mut subtrahend = Number::Int(0);
    for n in rest {
        subtrahend = subtrahend.checked_add(*n)?;
    }
    first.checked_sub(subtrahend).map(Value::Number)
}

fn builtin_mul(args: &[Value]) -> Result<Value, Error> {
    let nums = numbers(args)?;
    let [first, rest @ ..] = nums.as_slice() else {
        return Err(Error::arity_error(1, 0));
    };

    let mut product = *first;
    for n in rest {
        product = product.checked_mul(*n)?;
    }
    Ok(Value::Number(product))
}

fn builtin_div(args: &[Value]) -> Result<Value, Error> {
    let nums = numbers(args)?;
    let [first, rest @ ..] = nums.as_slice() else {
        return Err(Error::arity_error(1, 0));
    };

    // Successive true division; a lone operand still yields a float
    let mut quotient = Number::Float(first.as_f64());
    for n in rest {
        quotient = quotient.checked_div(*n)?;
    }
    Ok(Value::Number(quotient))
}

fn builtin_equal(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(match args {
        [first, rest @ ..] => rest.iter().all(|arg| arg == first),
        [] => true,
    }))
}

// Macro to generate numeric comparison functions
macro_rules! numeric_comparison {
    ($name:ident, $op:tt) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            // Every operand must be a number even when fewer than two are given
            let nums = numbers(args)?;

            // Chain comparisons: all adjacent pairs must satisfy the comparison
            Ok(Value::Bool(nums.windows(2).all(|pair| pair[0] $op pair[1])))
        }
    };
}

// Generate all comparison functions
numeric_comparison!(builtin_gt, >);
numeric_comparison!(builtin_ge, >=);
numeric_comparison!(builtin_lt, <);
numeric_comparison!(builtin_le, <=);

fn builtin_not(args: &[Value]) -> Result<Value, Error> {
    match args {
        [value] => Ok(Value::Bool(!value.is_truthy())),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

/// The single argument of `car`/`cdr`, which must be a cons cell
fn pair_arg<'a>(name: &str, args: &'a [Value]) -> Result<&'a Pair, Error> {
    match args {
        [value] => value
            .as_pair()
            .ok_or_else(|| Error::type_error(format!("{name} requires a pair, found {value}"))),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn builtin_car(args: &[Value]) -> Result<Value, Error> {
    pair_arg("car", args).map(|pair| pair.car.clone())
}

fn builtin_cdr(args: &[Value]) -> Result<Value, Error> {
    pair_arg("cdr", args).map(|pair| pair.cdr.clone())
}

fn builtin_list(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::list_from(args.iter().cloned()))
}

fn builtin_length(args: &[Value]) -> Result<Value, Error> {
    let [list] = args else {
        return Err(Error::arity_error(1, args.len()));
    };

    let mut count: i64 = 0;
    for item in list.iter_list() {
        item?;
        count += 1;
    }
    Ok(Value::from(count))
}

fn builtin_elt_at_index(args: &[Value]) -> Result<Value, Error> {
    let [list, index] = args else {
        return Err(Error::arity_error(2, args.len()));
    };

    let Some(mut pair) = list.as_pair() else {
        return Err(Error::type_error(format!(
            "elt-at-index requires a non-empty list, found {list}"
        )));
    };
    let index = match index {
        Value::Number(Number::Int(i)) => usize::try_from(*i).map_err(|_| {
            Error::EvaluationError(format!("index must not be negative, got {i}"))
        })?,
        other => {
            return Err(Error::type_error(format!(
                "index must be an integer, found {other}"
            )));
        }
    };

    for _ in 0..index {
        pair = pair.cdr.as_pair().ok_or_else(|| {
            Error::EvaluationError(format!("index {index} is out of range"))
        })?;
    }
    Ok(pair.car.clone())
}

fn builtin_concat(args: &[Value]) -> Result<Value, Error> {
    let mut items = Vec::new();
    for list in args {
        for item in list.iter_list() {
            items.push(item?.clone());
        }
    }
    Ok(Value::list_from(items))
}

fn builtin_map(args: &[Value], depth: usize) -> Result<Value, Error> {
    let [func, list] = args else {
        return Err(Error::arity_error(2, args.len()));
    };

    let mut results = Vec::new();
    for item in list.iter_list() {
        results.push(apply(func, &[item?.clone()], depth)?);
    }
    Ok(Value::list_from(results))
}

fn builtin_filter(args: &[Value], depth: usize) -> Result<Value, Error> {
    let [func, list] = args else {
        return Err(Error::arity_error(2, args.len()));
    };

    let mut kept = Vec::new();
    for item in list.iter_list() {
        let item = item?;
        if apply(func, std::slice::from_ref(item), depth)?.is_truthy() {
            kept.push(item.clone());
        }
    }
    Ok(Value::list_from(kept))
}

fn builtin_reduce(args: &[Value], depth: usize) -> Result<Value, Error> {
    let [func, list, initial] = args else {
        return Err(Error::arity_error(3, args.len()));
    };

    let mut accumulator = initial.clone();
    for item in list.iter_list() {
        accumulator = apply(func, &[accumulator, item?.clone()], depth)?;
    }
    Ok(accumulator)
}

/// Registry of all builtin operations.
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    use BuiltinFn::{HigherOrder, Simple};

    vec![
        // Arithmetic
        BuiltinOp {
            id: "+",
            op_kind: OpKind::Function(Simple(builtin_add)),
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "-",
            op_kind: OpKind::Function(Simple(builtin_sub)),
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            id: "*",
            op_kind: OpKind::Function(Simple(builtin_mul)),
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            id: "/",
            op_kind: OpKind::Function(Simple(builtin_div)),
            arity: Arity::AtLeast(1),
        },
        // Comparison
        BuiltinOp {
            id: "=?",
            op_kind: OpKind::Function(Simple(builtin_equal)),
            arity: Arity::Any,
        },
        BuiltinOp {
            id: ">",
            op_kind: OpKind::Function(Simple(builtin_gt)),
            arity: Arity::Any,
        },
        BuiltinOp {
            id: ">=",
            op_kind: OpKind::Function(Simple(builtin_ge)),
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "<",
            op_kind: OpKind::Function(Simple(builtin_lt)),
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "<=",
            op_kind: OpKind::Function(Simple(builtin_le)),
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "not",
            op_kind: OpKind::Function(Simple(builtin_not)),
            arity: Arity::Exact(1),
        },
        // Lists
        BuiltinOp {
            id: "car",
            op_kind: OpKind::Function(Simple(builtin_car)),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            id: "cdr",
            op_kind: OpKind::Function(Simple(builtin_cdr)),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            id: "list",
            op_kind: OpKind::Function(Simple(builtin_list)),
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "length",
            op_kind: OpKind::Function(Simple(builtin_length)),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            id: "elt-at-index",
            op_kind: OpKind::Function(Simple(builtin_elt_at_index)),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            id: "concat",
            op_kind: OpKind::Function(Simple(builtin_concat)),
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "map",
            op_kind: OpKind::Function(HigherOrder(builtin_map)),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            id: "filter",
            op_kind: OpKind::Function(HigherOrder(builtin_filter)),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            id: "reduce",
            op_kind: OpKind::Function(HigherOrder(builtin_reduce)),
            arity: Arity::Exact(3),
        },
        // Special forms
        BuiltinOp {
            id: ":=",
            op_kind: OpKind::SpecialForm(eval_define),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            id: "function",
            op_kind: OpKind::SpecialForm(eval_function),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            id: "if",
            op_kind: OpKind::SpecialForm(eval_if),
            arity: Arity::Exact(3),
        },
        BuiltinOp {
            id: "and",
            op_kind: OpKind::SpecialForm(eval_and),
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "or",
            op_kind: OpKind::SpecialForm(eval_or),
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "cons",
            op_kind: OpKind::SpecialForm(eval_cons),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            id: "begin",
            op_kind: OpKind::SpecialForm(eval_begin),
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            id: "del",
            op_kind: OpKind::SpecialForm(eval_del),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            id: "let",
            op_kind: OpKind::SpecialForm(eval_let),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            id: "set!",
            op_kind: OpKind::SpecialForm(eval_set),
            arity: Arity::Exact(2),
        },
    ]
});

/// Lazy static map from id to BuiltinOp (private - use find_builtin_op)
static BUILTIN_INDEX: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| {
        let ops: &'static [BuiltinOp] = BUILTIN_OPS.as_slice();
        ops.iter().map(|op| (op.id, op)).collect()
    });

/// Get all builtin operations (for internal use by evaluator)
pub fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS.as_slice()
}

/// Find a builtin operation by its identifier
pub fn find_builtin_op(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_INDEX.get(id).copied()
}

/// Find a special form by keyword; procedures with this name are not returned
pub fn find_special_form(id: &str) -> Option<&'static BuiltinOp> {
    find_builtin_op(id).filter(|op| op.is_special_form())
}

/// Names bound to constant values in the builtin frame
pub fn builtin_constants() -> Vec<(&'static str, Value)> {
    vec![
        ("#t", Value::Bool(true)),
        ("#f", Value::Bool(false)),
        ("nil", Value::Nil),
    ]
}

#[cfg(test)]
#[expect(clippy::unwrap_used, clippy::expect_used)] // test code OK
mod tests {
    use super::*;
    use crate::evaluator::create_global_env;
    use crate::value::{list, val};

    /// Micro-helper for success cases in comprehensive tests
    fn success<T: Into<Value>>(value: T) -> Option<Value> {
        Some(val(value))
    }

    /// Helper to invoke a builtin through the public registry, checking arity the
    /// way the evaluator does before the call.
    fn call_builtin(name: &str, args: &[Value]) -> Result<Value, Error> {
        let op = find_builtin_op(name).expect("builtin not found");
        op.validate_arity(args.len())?;
        match op.op_kind {
            OpKind::Function(BuiltinFn::Simple(func)) => func(args),
            OpKind::Function(BuiltinFn::HigherOrder(func)) => func(args, 0),
            OpKind::SpecialForm(_) => {
                panic!("expected function builtin in tests, got special form: {name}")
            }
        }
    }

    /// A builtin procedure as a first-class value, for higher-order tests
    fn procedure(name: &str) -> Value {
        create_global_env().get(name).expect("builtin not bound")
    }

    #[test]
    fn test_builtin_ops_registry() {
        let not_op = find_builtin_op("not").unwrap();
        assert_eq!(not_op.arity, Arity::Exact(1));
        assert!(!not_op.is_special_form());

        let add_op = find_builtin_op("+").unwrap();
        assert_eq!(add_op.arity, Arity::Any);
        if let OpKind::Function(BuiltinFn::Simple(func)) = add_op.op_kind {
            assert_eq!(func(&[val(1), val(2)]).unwrap(), val(3));
        } else {
            panic!("Expected simple Function variant");
        }

        // Special forms are found by keyword, procedures are not
        let if_op = find_special_form("if").unwrap();
        assert!(if_op.is_special_form());
        assert_eq!(if_op.arity, Arity::Exact(3));
        assert!(find_special_form("+").is_none());
        assert!(find_special_form("unknown").is_none());
        assert!(find_builtin_op("unknown").is_none());

        for keyword in [":=", "function", "if", "and", "or", "cons", "begin", "del", "let", "set!"] {
            assert!(find_special_form(keyword).is_some(), "{keyword}");
        }

        // Identifiers are unique
        let all_ops = get_builtin_ops();
        let index_size = BUILTIN_INDEX.len();
        assert_eq!(all_ops.len(), index_size);
    }

    #[test]
    fn test_global_env_binds_procedures_and_constants_only() {
        let env = create_global_env();
        for op in get_builtin_ops() {
            assert_eq!(env.contains_local(op.id), !op.is_special_form(), "{}", op.id);
        }
        assert_eq!(env.get("#t"), Some(val(true)));
        assert_eq!(env.get("#f"), Some(val(false)));
        assert_eq!(env.get("nil"), Some(Value::Nil));
    }

    /// Macro to create test cases, invoking builtins via the registry.
    macro_rules! test {
        ($name:expr, $args:expr, $expected:expr) => {
            ($name, call_builtin($name, $args), $expected)
        };
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_builtin_function_implementations() {
        type TestCase = (&'static str, Result<Value, Error>, Option<Value>);

        let int_list = list(vec![1, 2, 3]);
        let dotted = Value::cons(val(1), val(2));
        let many_ones: Vec<Value> = (0..100).map(|_| val(1)).collect();
        let negate = procedure("-");
        let add = procedure("+");

        let test_cases: Vec<TestCase> = vec![
            // =================================================================
            // ARITHMETIC
            // =================================================================
            test!("+", &[val(1), val(2), val(3)], success(6)),
            test!("+", &[], success(0)),
            test!("+", &many_ones, success(100)),
            test!("+", &[val(1), val(0.5)], success(1.5)),
            test!("+", &[val(i64::MAX), val(1)], None),
            test!("+", &[val(true)], None),
            test!("-", &[val(10), val(3), val(2)], success(5)),
            test!("-", &[val(4)], success(-4)),
            test!("-", &[val(2.5)], success(-2.5)),
            test!("-", &[], None),
            test!("-", &[val(i64::MIN)], None),
            test!("*", &[val(2), val(3), val(4)], success(24)),
            test!("*", &[val(2), val(0.25)], success(0.5)),
            test!("*", &[val(i64::MAX), val(2)], None),
            test!("*", &[], None),
            test!("/", &[val(7), val(2)], success(3.5)),
            test!("/", &[val(100), val(5), val(2)], success(10.0)),
            test!("/", &[val(3)], success(3.0)),
            test!("/", &[val(1), val(0)], None),
            test!("/", &[val(1), val(0.0)], None),
            test!("/", &[], None),
            // =================================================================
            // COMPARISON
            // =================================================================
            test!("=?", &[val(1), val(1), val(1.0)], success(true)),
            test!("=?", &[val(1), val(1), val(2)], success(false)),
            test!("=?", &[], success(true)),
            test!("=?", &[Value::Nil, Value::Nil], success(true)),
            test!("=?", &[val(false), Value::Nil], success(false)),
            test!("=?", &[val(0), val(false)], success(false)),
            test!("=?", &[val(1), val(true)], success(false)),
            test!("=?", &[int_list.clone(), list(vec![1, 2, 3])], success(true)),
            test!("=?", &[int_list.clone(), list(vec![1, 2])], success(false)),
            test!("=?", &[add.clone(), procedure("+")], success(true)),
            test!("=?", &[add.clone(), negate.clone()], success(false)),
            test!(">", &[val(3), val(2), val(1)], success(true)),
            test!(">", &[val(3), val(2), val(2)], success(false)),
            test!(">", &[val(5)], success(true)),
            test!(">", &[], success(true)),
            test!(">", &[val(1), val(true)], None),
            test!(">", &[val(true)], None),
            test!(">=", &[val(3), val(3), val(2.5)], success(true)),
            test!(">=", &[val(1), val(2)], success(false)),
            test!("<", &[val(1), val(1.5), val(2)], success(true)),
            test!("<", &[val(1), val(1)], success(false)),
            test!("<=", &[val(1), val(1), val(2)], success(true)),
            test!("<=", &[val(2), val(1)], success(false)),
            test!("not", &[val(true)], success(false)),
            test!("not", &[val(false)], success(true)),
            test!("not", &[val(0)], success(true)),
            test!("not", &[int_list.clone()], success(false)),
            test!("not", &[], None),
            test!("not", &[val(1), val(2)], None),
            // =================================================================
            // LISTS
            // =================================================================
            test!("car", &[int_list.clone()], success(1)),
            test!("car", &[dotted.clone()], success(1)),
            test!("car", &[Value::Nil], None),
            test!("car", &[val(1)], None),
            test!("cdr", &[int_list.clone()], Some(list(vec![2, 3]))),
            test!("cdr", &[dotted.clone()], success(2)),
            test!("cdr", &[list(vec![1])], Some(Value::Nil)),
            test!("cdr", &[Value::Nil], None),
            test!("list", &[], Some(Value::Nil)),
            test!("list", &[val(1), val(2), val(3)], Some(int_list.clone())),
            test!("length", &[int_list.clone()], success(3)),
            test!("length", &[Value::Nil], success(0)),
            test!("length", &[dotted.clone()], None),
            test!("length", &[val(5)], None),
            test!("elt-at-index", &[int_list.clone(), val(0)], success(1)),
            test!("elt-at-index", &[int_list.clone(), val(2)], success(3)),
            test!("elt-at-index", &[int_list.clone(), val(3)], None),
            test!("elt-at-index", &[int_list.clone(), val(-1)], None),
            test!("elt-at-index", &[int_list.clone(), val(1.0)], None),
            test!("elt-at-index", &[Value::Nil, val(0)], None),
            test!("elt-at-index", &[dotted.clone(), val(0)], success(1)),
            test!("elt-at-index", &[dotted.clone(), val(1)], None),
            test!("concat", &[], Some(Value::Nil)),
            test!("concat", &[Value::Nil, Value::Nil], Some(Value::Nil)),
            test!(
                "concat",
                &[list(vec![1]), Value::Nil, list(vec![2, 3])],
                Some(int_list.clone())
            ),
            test!("concat", &[int_list.clone()], Some(int_list.clone())),
            test!("concat", &[int_list.clone(), dotted.clone()], None),
            test!("concat", &[val(1)], None),
            // =================================================================
            // HIGHER-ORDER
            // =================================================================
            test!("map", &[negate.clone(), int_list.clone()], Some(list(vec![-1, -2, -3]))),
            test!("map", &[negate.clone(), Value::Nil], Some(Value::Nil)),
            test!("map", &[negate.clone(), dotted.clone()], None),
            test!("map", &[val(1), int_list.clone()], None),
            test!("map", &[negate.clone()], None),
            test!("filter", &[procedure("not"), list(vec![0, 1, 0, 2])], Some(list(vec![0, 0]))),
            test!("filter", &[procedure("not"), Value::Nil], Some(Value::Nil)),
            test!("filter", &[procedure("not"), val(3)], None),
            test!("reduce", &[add.clone(), int_list.clone(), val(10)], success(16)),
            test!("reduce", &[add.clone(), Value::Nil, val(10)], success(10)),
            test!("reduce", &[negate.clone(), int_list.clone(), val(0)], success(-6)),
            test!("reduce", &[add.clone(), int_list.clone()], None),
        ];

        for (i, (name, actual, expected)) in test_cases.into_iter().enumerate() {
            match (actual, expected) {
                (Ok(actual), Some(expected)) => {
                    assert_eq!(actual, expected, "case #{}: {name}", i + 1);
                }
                (Err(err), None) => {
                    assert_eq!(
                        err.kind(),
                        crate::ErrorKind::Evaluation,
                        "case #{}: {name}",
                        i + 1
                    );
                }
                (Ok(actual), None) => panic!("case #{}: {name} expected error, got {actual}", i + 1),
                (Err(err), Some(expected)) => {
                    panic!("case #{}: {name} expected {expected}, got error {err}", i + 1)
                }
            }
        }
    }

    #[test]
    fn test_division_always_produces_float() {
        let result = call_builtin("/", &[val(6), val(3)]).unwrap();
        assert!(matches!(result, Value::Number(Number::Float(x)) if x == 2.0));
        assert_eq!(result.to_string(), "2.0");
    }

    #[test]
    fn test_concat_leaves_inputs_unchanged() {
        let first = list(vec![1, 2]);
        let second = list(vec![3]);
        let joined = call_builtin("concat", &[first.clone(), second.clone()]).unwrap();
        assert_eq!(joined, list(vec![1, 2, 3]));
        assert_eq!(first, list(vec![1, 2]));
        assert_eq!(second, list(vec![3]));
    }
}
