use crate::env::Environment;
use crate::error::{Result, SchemeError};
use crate::expr::{self, Expr};
use crate::thunk::Thunk;
use crate::trampoline;
use crate::value::{CompoundProc, PrimitiveProc, Strategy, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Dispatches `apply` to whichever procedure kind `proc_value` is
/// (SPEC_FULL.md §4.4). Operands are passed unevaluated; each procedure
/// kind decides for itself when and how to evaluate them.
pub fn apply_procedure(
    proc_value: &Value,
    operands: &[Rc<Expr>],
    env: Rc<RefCell<Environment>>,
) -> Result<Value> {
    match proc_value {
        Value::Primitive(primitive) => apply_primitive(primitive, operands, env),
        Value::Compound(compound) => apply_compound(compound, operands, env),
        other => Err(SchemeError::Apply(format!("{}", other))),
    }
}

/// Forces every operand left-to-right, then invokes the host callable.
/// Primitives are always terminal: the result is a plain value, not a
/// tail-call thunk.
fn apply_primitive(
    primitive: &Rc<PrimitiveProc>,
    operands: &[Rc<Expr>],
    env: Rc<RefCell<Environment>>,
) -> Result<Value> {
    let mut args = Vec::with_capacity(operands.len());
    for operand in operands {
        args.push(trampoline::evaluate(operand, Rc::clone(&env))?);
    }
    (primitive.func)(&args, env)
}

/// Binds each operand per its parameter's strategy, extends the captured
/// environment, and evaluates the body in tail position with respect to
/// the caller.
fn apply_compound(
    compound: &Rc<CompoundProc>,
    operands: &[Rc<Expr>],
    caller_env: Rc<RefCell<Environment>>,
) -> Result<Value> {
    if compound.parameters.len() != operands.len() {
        return Err(SchemeError::ArityMismatch {
            expected: compound.parameters.len().to_string(),
            got: operands.len(),
        });
    }
    let names: Vec<String> = compound.parameters.iter().map(|p| p.name.clone()).collect();
    let mut values = Vec::with_capacity(operands.len());
    for (param, operand) in compound.parameters.iter().zip(operands) {
        let bound = match param.strategy {
            Strategy::Strict => trampoline::evaluate(operand, Rc::clone(&caller_env))?,
            Strategy::Lazy => {
                Value::Thunk(Thunk::pending(Rc::clone(operand), Rc::clone(&caller_env)))
            }
            Strategy::LazyMemo => {
                Value::Thunk(Thunk::memo(Rc::clone(operand), Rc::clone(&caller_env)))
            }
        };
        values.push(bound);
    }
    let new_env = Environment::extend(Rc::clone(&compound.env), &names, values)?;
    expr::eval_sequence_tail(&compound.body, Rc::new(RefCell::new(new_env)))
}
