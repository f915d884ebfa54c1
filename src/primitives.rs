use crate::env::Environment;
use crate::error::{Result, SchemeError};
use crate::expr::Expr;
use crate::procedure;
use crate::reader::analyzer;
use crate::trampoline;
use crate::value::{PrimitiveProc, Value};
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

/// A numeric tower of exactly the three shapes `Value` can hold, used
/// internally by the arithmetic primitives to promote mixed-type operands
/// the way the core's own `eval_step` never does (SPEC_FULL.md §4.5: "the
/// core does not coerce numeric types across kinds; primitives may").
#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
    Complex(f64, f64),
}

fn as_number(value: &Value) -> Result<Number> {
    match value {
        Value::Integer(n) => Ok(Number::Int(*n)),
        Value::Float(x) => Ok(Number::Float(*x)),
        Value::Complex(re, im) => Ok(Number::Complex(*re, *im)),
        other => Err(Value::type_error("number", other)),
    }
}

fn as_value(number: Number) -> Value {
    match number {
        Number::Int(n) => Value::Integer(n),
        Number::Float(x) => Value::Float(x),
        Number::Complex(re, im) => Value::Complex(re, im),
    }
}

fn to_complex(n: Number) -> (f64, f64) {
    match n {
        Number::Int(i) => (i as f64, 0.0),
        Number::Float(f) => (f, 0.0),
        Number::Complex(re, im) => (re, im),
    }
}

fn to_float(n: Number) -> f64 {
    match n {
        Number::Int(i) => i as f64,
        Number::Float(f) => f,
        Number::Complex(re, _) => re,
    }
}

/// Promotes a pair to the narrowest shared representation: Complex beats
/// Float beats Int.
fn promote(a: Number, b: Number) -> (Number, Number) {
    match (a, b) {
        (Number::Complex(..), _) | (_, Number::Complex(..)) => {
            let (ar, ai) = to_complex(a);
            let (br, bi) = to_complex(b);
            (Number::Complex(ar, ai), Number::Complex(br, bi))
        }
        (Number::Float(_), _) | (_, Number::Float(_)) => {
            (Number::Float(to_float(a)), Number::Float(to_float(b)))
        }
        _ => (a, b),
    }
}

fn add2(a: Number, b: Number) -> Number {
    match promote(a, b) {
        (Number::Int(x), Number::Int(y)) => Number::Int(x + y),
        (Number::Float(x), Number::Float(y)) => Number::Float(x + y),
        (Number::Complex(xr, xi), Number::Complex(yr, yi)) => Number::Complex(xr + yr, xi + yi),
        _ => unreachable!("promote always returns a matching pair"),
    }
}

fn sub2(a: Number, b: Number) -> Number {
    match promote(a, b) {
        (Number::Int(x), Number::Int(y)) => Number::Int(x - y),
        (Number::Float(x), Number::Float(y)) => Number::Float(x - y),
        (Number::Complex(xr, xi), Number::Complex(yr, yi)) => Number::Complex(xr - yr, xi - yi),
        _ => unreachable!("promote always returns a matching pair"),
    }
}

fn mul2(a: Number, b: Number) -> Number {
    match promote(a, b) {
        (Number::Int(x), Number::Int(y)) => Number::Int(x * y),
        (Number::Float(x), Number::Float(y)) => Number::Float(x * y),
        (Number::Complex(xr, xi), Number::Complex(yr, yi)) => {
            Number::Complex(xr * yr - xi * yi, xr * yi + xi * yr)
        }
        _ => unreachable!("promote always returns a matching pair"),
    }
}

fn div2(a: Number, b: Number) -> Result<Number> {
    match promote(a, b) {
        (Number::Int(x), Number::Int(y)) => {
            if y == 0 {
                return Err(SchemeError::Eval("division by zero".to_string()));
            }
            if x % y == 0 {
                Ok(Number::Int(x / y))
            } else {
                Ok(Number::Float(x as f64 / y as f64))
            }
        }
        (Number::Float(x), Number::Float(y)) => {
            if y == 0.0 {
                return Err(SchemeError::Eval("division by zero".to_string()));
            }
            Ok(Number::Float(x / y))
        }
        (Number::Complex(xr, xi), Number::Complex(yr, yi)) => {
            let denom = yr * yr + yi * yi;
            if denom == 0.0 {
                return Err(SchemeError::Eval("division by zero".to_string()));
            }
            Ok(Number::Complex(
                (xr * yr + xi * yi) / denom,
                (xi * yr - xr * yi) / denom,
            ))
        }
        _ => unreachable!("promote always returns a matching pair"),
    }
}

/// Reduces `args` over `op`, seeded with `identity`, matching the reduce
/// phrasing in SPEC_FULL.md §4.5 ("sum/product seeded with identity").
fn reduce(args: &[Value], identity: Number, op: fn(Number, Number) -> Number) -> Result<Value> {
    let mut acc = identity;
    for arg in args {
        acc = op(acc, as_number(arg)?);
    }
    Ok(as_value(acc))
}

fn add(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    reduce(args, Number::Int(0), add2)
}

fn mul(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    reduce(args, Number::Int(1), mul2)
}

/// `(- x)` negates; `(- x y ...)` subtracts the rest from the first.
fn sub(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    match args {
        [] => Err(SchemeError::ArityMismatch {
            expected: "at least 1".to_string(),
            got: 0,
        }),
        [single] => Ok(as_value(sub2(Number::Int(0), as_number(single)?))),
        [first, rest @ ..] => {
            let mut acc = as_number(first)?;
            for arg in rest {
                acc = sub2(acc, as_number(arg)?);
            }
            Ok(as_value(acc))
        }
    }
}

/// `(/ x)` inverts; `(/ x y ...)` divides the first by the rest.
fn div(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    match args {
        [] => Err(SchemeError::ArityMismatch {
            expected: "at least 1".to_string(),
            got: 0,
        }),
        [single] => Ok(as_value(div2(Number::Int(1), as_number(single)?)?)),
        [first, rest @ ..] => {
            let mut acc = as_number(first)?;
            for arg in rest {
                acc = div2(acc, as_number(arg)?)?;
            }
            Ok(as_value(acc))
        }
    }
}

/// Walks `args` pairwise, applying `rel` to each adjacent pair, per
/// SPEC_FULL.md §4.5 ("return true iff the relation holds pairwise between
/// adjacent operands"). Short-circuits to `#f` on the first failing pair.
/// Fewer than two operands is vacuously true, matching
/// `original_source/schemepy/backend/primitives.py`'s `_cmp`
/// (`all(... for i in range(len - 1))`, trivially `True` when `len < 2`).
fn pairwise_chain(args: &[Value], rel: fn(f64, f64) -> bool) -> Result<Value> {
    for window in args.windows(2) {
        let a = to_float(as_number(&window[0])?);
        let b = to_float(as_number(&window[1])?);
        if !rel(a, b) {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

/// `=`/`!=` compare the full numeric value, including the imaginary
/// component, rather than coercing through `to_float` like the ordering
/// comparisons do: `equal`/`not_equal` in
/// `original_source/schemepy/backend/primitives.py` compare via Python's
/// `operator.eq`, which on a `complex` compares both parts.
fn numbers_equal(a: &Value, b: &Value) -> Result<bool> {
    match promote(as_number(a)?, as_number(b)?) {
        (Number::Int(x), Number::Int(y)) => Ok(x == y),
        (Number::Float(x), Number::Float(y)) => Ok(x == y),
        (Number::Complex(xr, xi), Number::Complex(yr, yi)) => Ok(xr == yr && xi == yi),
        _ => unreachable!("promote always returns a matching pair"),
    }
}

/// Vacuously true for fewer than two operands, matching `pairwise_chain`.
fn num_eq(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    for window in args.windows(2) {
        if !numbers_equal(&window[0], &window[1])? {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

/// Mirrors `_cmp(operands, operator.ne)`: true iff every adjacent pair
/// differs, not merely "some pair differs".
fn num_ne(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    for window in args.windows(2) {
        if numbers_equal(&window[0], &window[1])? {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

fn less_than(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    pairwise_chain(args, |a, b| a < b)
}

fn less_equal(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    pairwise_chain(args, |a, b| a <= b)
}

fn greater_than(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    pairwise_chain(args, |a, b| a > b)
}

fn greater_equal(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    pairwise_chain(args, |a, b| a >= b)
}

/// `cons` preserves the list/pair duality from SPEC_FULL.md §3: consing
/// onto a `List` yields a longer `List`; consing onto anything else yields
/// an improper `Pair`.
fn cons(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    let [head, tail] = args else {
        return Err(SchemeError::ArityMismatch {
            expected: "2".to_string(),
            got: args.len(),
        });
    };
    match tail {
        Value::List(items) => {
            let mut items = items.clone();
            items.insert(0, head.clone());
            Ok(Value::List(items))
        }
        other => Ok(Value::Pair(Box::new(head.clone()), Box::new(other.clone()))),
    }
}

fn car(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    match args.first() {
        Some(Value::Pair(car, _)) => Ok((**car).clone()),
        Some(Value::List(items)) if !items.is_empty() => Ok(items[0].clone()),
        Some(other) => Err(Value::type_error("pair", other)),
        None => Err(SchemeError::ArityMismatch {
            expected: "1".to_string(),
            got: 0,
        }),
    }
}

fn cdr(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    match args.first() {
        Some(Value::Pair(_, cdr)) => Ok((**cdr).clone()),
        Some(Value::List(items)) if !items.is_empty() => Ok(Value::List(items[1..].to_vec())),
        Some(other) => Err(Value::type_error("pair", other)),
        None => Err(SchemeError::ArityMismatch {
            expected: "1".to_string(),
            got: 0,
        }),
    }
}

fn list(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    Ok(Value::List(args.to_vec()))
}

fn append(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    let [a, b] = args else {
        return Err(SchemeError::ArityMismatch {
            expected: "2".to_string(),
            got: args.len(),
        });
    };
    match (a, b) {
        (Value::List(left), Value::List(right)) => {
            let mut items = left.clone();
            items.extend(right.iter().cloned());
            Ok(Value::List(items))
        }
        (Value::List(_), other) => Err(Value::type_error("list", other)),
        (other, _) => Err(Value::type_error("list", other)),
    }
}

fn is_null(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    Ok(Value::Boolean(args.first().is_some_and(Value::is_null)))
}

fn is_boolean(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::Boolean(_)))))
}

fn is_symbol(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::Symbol(_)))))
}

fn is_string(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::String(_)))))
}

fn is_pair(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::Pair(..)))))
}

fn is_procedure(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    Ok(Value::Boolean(
        args.first().is_some_and(Value::is_procedure),
    ))
}

fn is_equal(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    let [a, b] = args else {
        return Err(SchemeError::ArityMismatch {
            expected: "2".to_string(),
            got: args.len(),
        });
    };
    Ok(Value::Boolean(a == b))
}

fn not(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::Boolean(false)))))
}

/// Prints the external representation (SPEC_FULL.md §6.1/§4.7) to stdout
/// and returns the unspecified value.
fn display(args: &[Value], _env: Rc<RefCell<Environment>>) -> Result<Value> {
    if let Some(value) = args.first() {
        print!("{}", value);
    }
    Ok(Value::Boolean(false))
}

/// Re-enters the evaluator with its argument treated as a datum
/// (SPEC_FULL.md §4.5): analyze the value as source, then evaluate it in
/// the calling environment.
fn eval(args: &[Value], env: Rc<RefCell<Environment>>) -> Result<Value> {
    let datum = args.first().ok_or(SchemeError::ArityMismatch {
        expected: "1".to_string(),
        got: 0,
    })?;
    debug!("eval primitive re-entering core with datum: {}", datum);
    let expr = analyzer::analyze(datum)?;
    trampoline::evaluate(&expr, env)
}

/// Applies `args[0]` to the already-evaluated list `args[1]`, rewrapping
/// each element as a `SelfEvaluating` expression so `Strict`/`Lazy`/
/// `LazyMemo` parameter binding still runs exactly as for a direct call
/// (SPEC_FULL.md §4.5).
fn apply(args: &[Value], env: Rc<RefCell<Environment>>) -> Result<Value> {
    let proc_value = args.first().ok_or(SchemeError::ArityMismatch {
        expected: "2".to_string(),
        got: args.len(),
    })?;
    let operand_list = match args.get(1) {
        Some(Value::List(items)) => items.clone(),
        Some(other) => return Err(Value::type_error("list", other)),
        None => {
            return Err(SchemeError::ArityMismatch {
                expected: "2".to_string(),
                got: args.len(),
            })
        }
    };
    let operand_exprs: Vec<Rc<Expr>> = operand_list
        .into_iter()
        .map(|value| Rc::new(Expr::SelfEvaluating(value)))
        .collect();
    procedure::apply_procedure(proc_value, &operand_exprs, env)
}

fn define_primitive(env: &Rc<RefCell<Environment>>, name: &str, func: crate::value::BuiltinFn) {
    env.borrow_mut().define(
        name.to_string(),
        Value::Primitive(Rc::new(PrimitiveProc {
            name: name.to_string(),
            func,
        })),
    );
}

/// Builds a fresh global environment populated per SPEC_FULL.md §6.2:
/// the constant bindings `#t`/`#f`/`null`, plus every primitive procedure.
pub fn global_env() -> Rc<RefCell<Environment>> {
    let env = Rc::new(RefCell::new(Environment::new()));
    env.borrow_mut().define("#t".to_string(), Value::Boolean(true));
    env.borrow_mut().define("#f".to_string(), Value::Boolean(false));
    env.borrow_mut().define("null".to_string(), Value::nil());

    define_primitive(&env, "+", add);
    define_primitive(&env, "-", sub);
    define_primitive(&env, "*", mul);
    define_primitive(&env, "/", div);
    define_primitive(&env, "=", num_eq);
    define_primitive(&env, "!=", num_ne);
    define_primitive(&env, "<", less_than);
    define_primitive(&env, "<=", less_equal);
    define_primitive(&env, ">", greater_than);
    define_primitive(&env, ">=", greater_equal);

    define_primitive(&env, "cons", cons);
    define_primitive(&env, "car", car);
    define_primitive(&env, "cdr", cdr);
    define_primitive(&env, "list", list);
    define_primitive(&env, "append", append);
    define_primitive(&env, "null?", is_null);

    define_primitive(&env, "boolean?", is_boolean);
    define_primitive(&env, "symbol?", is_symbol);
    define_primitive(&env, "string?", is_string);
    define_primitive(&env, "pair?", is_pair);
    define_primitive(&env, "procedure?", is_procedure);
    define_primitive(&env, "equal?", is_equal);
    define_primitive(&env, "not", not);

    define_primitive(&env, "display", display);
    define_primitive(&env, "eval", eval);
    define_primitive(&env, "apply", apply);

    env
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Rc<RefCell<Environment>> {
        global_env()
    }

    #[test]
    fn arithmetic_promotes_mixed_numeric_kinds() {
        let e = env();
        let result = add(&[Value::Integer(1), Value::Float(2.5)], e).unwrap();
        assert_eq!(result, Value::Float(3.5));
    }

    #[test]
    fn integer_division_stays_exact_when_possible() {
        let e = env();
        assert_eq!(
            div(&[Value::Integer(6), Value::Integer(3)], Rc::clone(&e)).unwrap(),
            Value::Integer(2)
        );
        assert_eq!(
            div(&[Value::Integer(1), Value::Integer(3)], e).unwrap(),
            Value::Float(1.0 / 3.0)
        );
    }

    #[test]
    fn division_by_zero_is_an_eval_error() {
        let e = env();
        let err = div(&[Value::Integer(1), Value::Integer(0)], e).unwrap_err();
        assert!(matches!(err, SchemeError::Eval(_)));
    }

    #[test]
    fn cons_onto_a_list_stays_a_list_cons_onto_anything_else_is_a_pair() {
        let e = env();
        assert_eq!(
            cons(&[Value::Integer(1), Value::nil()], Rc::clone(&e)).unwrap(),
            Value::List(vec![Value::Integer(1)])
        );
        assert_eq!(
            cons(&[Value::Integer(1), Value::Integer(2)], e).unwrap(),
            Value::Pair(Box::new(Value::Integer(1)), Box::new(Value::Integer(2)))
        );
    }

    #[test]
    fn car_and_cdr_work_on_lists_and_pairs() {
        let e = env();
        let list = Value::List(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(car(&[list.clone()], Rc::clone(&e)).unwrap(), Value::Integer(1));
        assert_eq!(
            cdr(&[list], Rc::clone(&e)).unwrap(),
            Value::List(vec![Value::Integer(2)])
        );
        let pair = Value::Pair(Box::new(Value::Integer(1)), Box::new(Value::Integer(2)));
        assert_eq!(car(&[pair.clone()], Rc::clone(&e)).unwrap(), Value::Integer(1));
        assert_eq!(cdr(&[pair], e).unwrap(), Value::Integer(2));
    }

    #[test]
    fn comparisons_hold_pairwise_across_more_than_two_operands() {
        let e = env();
        assert_eq!(
            less_than(&[Value::Integer(1), Value::Integer(2), Value::Integer(3)], Rc::clone(&e))
                .unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            less_than(&[Value::Integer(1), Value::Integer(3), Value::Integer(2)], Rc::clone(&e))
                .unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            less_equal(&[Value::Integer(1), Value::Integer(1), Value::Integer(2)], Rc::clone(&e))
                .unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            num_ne(&[Value::Integer(1), Value::Integer(2)], e).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn fewer_than_two_operands_is_vacuously_true() {
        let e = env();
        assert_eq!(less_than(&[], Rc::clone(&e)).unwrap(), Value::Boolean(true));
        assert_eq!(
            less_than(&[Value::Integer(5)], Rc::clone(&e)).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(num_eq(&[Value::Integer(5)], Rc::clone(&e)).unwrap(), Value::Boolean(true));
        assert_eq!(num_ne(&[], e).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn numeric_equality_compares_the_full_complex_value() {
        let e = env();
        assert_eq!(
            num_eq(&[Value::Complex(1.0, 2.0), Value::Complex(1.0, 5.0)], Rc::clone(&e)).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            num_ne(&[Value::Complex(1.0, 2.0), Value::Complex(1.0, 5.0)], Rc::clone(&e)).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            num_eq(&[Value::Complex(1.0, 2.0), Value::Complex(1.0, 2.0)], e).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn equal_is_structural_and_not_inverts_only_false() {
        let e = env();
        assert_eq!(
            is_equal(&[Value::Integer(1), Value::Integer(1)], Rc::clone(&e)).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(not(&[Value::Boolean(false)], Rc::clone(&e)).unwrap(), Value::Boolean(true));
        assert_eq!(not(&[Value::Integer(0)], e).unwrap(), Value::Boolean(false));
    }
}
