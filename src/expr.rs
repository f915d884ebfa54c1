use crate::env::Environment;
use crate::error::Result;
use crate::procedure;
use crate::trampoline;
use crate::value::{CompoundProc, Parameter, Value};
use log::trace;
use std::cell::RefCell;
use std::rc::Rc;

/// The expression (AST) algebra the reader produces and the evaluator
/// consumes. Deliberately a type distinct from `Value`: `Quote` embeds a
/// `Value` datum, but everything else here describes *how* to compute one.
pub enum Expr {
    SelfEvaluating(Value),
    Identifier(String),
    Quote(Value),
    Definition(String, Rc<Expr>),
    Assignment(String, Rc<Expr>),
    If(Rc<Expr>, Rc<Expr>, Option<Rc<Expr>>),
    Lambda(Vec<Parameter>, Vec<Rc<Expr>>),
    Begin(Vec<Rc<Expr>>),
    Application(Rc<Expr>, Vec<Rc<Expr>>),
}

impl Expr {
    /// Variant name for diagnostics (logging, test failure messages). Not
    /// used by the evaluator itself.
    pub fn type_name(&self) -> &'static str {
        match self {
            Expr::SelfEvaluating(_) => "self-evaluating",
            Expr::Identifier(_) => "identifier",
            Expr::Quote(_) => "quote",
            Expr::Definition(..) => "definition",
            Expr::Assignment(..) => "assignment",
            Expr::If(..) => "if",
            Expr::Lambda(..) => "lambda",
            Expr::Begin(_) => "begin",
            Expr::Application(..) => "application",
        }
    }
}

/// The bare evaluator (SPEC_FULL.md §4.3). Tail positions return a
/// `Value::Thunk` rather than recursing; the trampoline in `trampoline.rs`
/// is the only caller allowed to force the result of this function more
/// than zero times without being a tail position itself.
pub fn eval_step(expr: &Expr, env: Rc<RefCell<Environment>>) -> Result<Value> {
    trace!("eval_step: {}", expr.type_name());
    match expr {
        Expr::SelfEvaluating(value) => Ok(value.clone()),
        Expr::Identifier(name) => env.borrow().lookup(name),
        Expr::Quote(datum) => Ok(datum.clone()),
        Expr::Definition(name, value_expr) => {
            let value = trampoline::evaluate(value_expr, Rc::clone(&env))?;
            env.borrow_mut().define(name.clone(), value);
            Ok(Value::Symbol(name.clone()))
        }
        Expr::Assignment(name, value_expr) => {
            let value = trampoline::evaluate(value_expr, Rc::clone(&env))?;
            env.borrow_mut().assign(name, value)?;
            Ok(Value::Symbol(name.clone()))
        }
        Expr::If(predicate, consequent, alternative) => {
            let test = trampoline::evaluate(predicate, Rc::clone(&env))?;
            let branch = match test {
                Value::Boolean(false) => alternative.clone(),
                _ => Some(Rc::clone(consequent)),
            };
            match branch {
                Some(branch_expr) => Ok(trampoline::tail_call(branch_expr, env)),
                None => Ok(Value::Boolean(false)),
            }
        }
        Expr::Lambda(parameters, body) => Ok(Value::Compound(Rc::new(CompoundProc {
            parameters: parameters.clone(),
            body: body.clone(),
            env,
        }))),
        Expr::Begin(sequence) => eval_sequence_tail(sequence, env),
        Expr::Application(operator, operands) => {
            let proc_value = trampoline::evaluate(operator, Rc::clone(&env))?;
            procedure::apply_procedure(&proc_value, operands, env)
        }
    }
}

/// Evaluates every expression but the last for effect, then returns the
/// last as a tail call. Shared by `Begin` and by a `Compound` procedure's
/// body (SPEC_FULL.md §4.3/§4.4). An empty sequence yields the crate's
/// unspecified-value convention, `Boolean(false)`.
pub fn eval_sequence_tail(sequence: &[Rc<Expr>], env: Rc<RefCell<Environment>>) -> Result<Value> {
    match sequence.split_last() {
        None => Ok(Value::Boolean(false)),
        Some((last, init)) => {
            for expr in init {
                trampoline::evaluate(expr, Rc::clone(&env))?;
            }
            Ok(trampoline::tail_call(Rc::clone(last), env))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Strategy;

    fn env() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::new()))
    }

    #[test]
    fn self_evaluating_returns_embedded_value() {
        let result = eval_step(&Expr::SelfEvaluating(Value::Integer(5)), env()).unwrap();
        assert_eq!(result, Value::Integer(5));
    }

    #[test]
    fn quote_returns_datum_unevaluated() {
        let datum = Value::Symbol("abc".to_string());
        let result = eval_step(&Expr::Quote(datum.clone()), env()).unwrap();
        assert_eq!(result, datum);
    }

    #[test]
    fn definition_binds_in_current_frame_and_returns_symbol() {
        let e = env();
        let result = eval_step(
            &Expr::Definition(
                "x".to_string(),
                Rc::new(Expr::SelfEvaluating(Value::Integer(10))),
            ),
            Rc::clone(&e),
        )
        .unwrap();
        assert_eq!(result, Value::Symbol("x".to_string()));
        assert_eq!(e.borrow().lookup("x").unwrap(), Value::Integer(10));
    }

    #[test]
    fn assignment_to_undefined_name_fails() {
        let err = eval_step(
            &Expr::Assignment(
                "missing".to_string(),
                Rc::new(Expr::SelfEvaluating(Value::Integer(1))),
            ),
            env(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::error::SchemeError::UndefinedIdentifier(_)
        ));
    }

    #[test]
    fn if_without_alternative_and_false_predicate_yields_false() {
        let result = trampoline::evaluate(
            &Expr::If(
                Rc::new(Expr::SelfEvaluating(Value::Boolean(false))),
                Rc::new(Expr::SelfEvaluating(Value::Integer(1))),
                None,
            ),
            env(),
        )
        .unwrap();
        assert_eq!(result, Value::Boolean(false));
    }

    #[test]
    fn lambda_captures_defining_environment() {
        let e = env();
        e.borrow_mut().define("x".to_string(), Value::Integer(99));
        let lambda = eval_step(
            &Expr::Lambda(
                vec![],
                vec![Rc::new(Expr::Identifier("x".to_string()))],
            ),
            Rc::clone(&e),
        )
        .unwrap();
        match lambda {
            Value::Compound(c) => {
                assert_eq!(c.env.borrow().lookup("x").unwrap(), Value::Integer(99));
                assert!(c.parameters.is_empty());
            }
            _ => panic!("expected a compound procedure"),
        }
    }

    #[test]
    fn parameter_default_strategy_is_strict() {
        let params = vec![Parameter {
            name: "x".to_string(),
            strategy: Strategy::Strict,
        }];
        assert_eq!(params[0].strategy, Strategy::Strict);
    }
}
