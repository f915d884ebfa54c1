use crate::env::Environment;
use crate::error::Result;
use crate::expr::{self, Expr};
use crate::thunk::{self, Thunk};
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// The core's single public evaluation entry point (SPEC_FULL.md §4.2):
/// run the bare evaluator once, then drive the force loop until a
/// non-thunk value comes out. This is the only place host recursion is
/// traded for an explicit loop; everywhere else in the evaluator, a tail
/// position hands back a thunk instead of calling back into `evaluate`.
pub fn evaluate(expr: &Expr, env: Rc<RefCell<Environment>>) -> Result<Value> {
    thunk::force(expr::eval_step(expr, env)?)
}

/// Packages `expr`/`env` as a plain (non-memoizing) thunk. Used from tail
/// positions (`If`, `Begin`, a compound procedure's body) so the caller's
/// force loop, not a fresh stack frame, drives the continuation. Must
/// never call `evaluate` itself — only `force_once` on the resulting thunk
/// reaches the bare evaluator, which is what keeps the loop iterative.
pub fn tail_call(expr: Rc<Expr>, env: Rc<RefCell<Environment>>) -> Value {
    Value::Thunk(Thunk::pending(expr, env))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Parameter, Strategy};

    fn env() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::new()))
    }

    /// `(define (loop n) (if (= n 0) 'done (loop (- n 1))))` run as raw
    /// `Expr`s, exercising tail-call boundedness (SPEC_FULL.md §8 invariant 2)
    /// without going through the reader.
    #[test]
    fn self_tail_recursive_loop_does_not_grow_the_host_stack() {
        let global = env();
        global.borrow_mut().define(
            "=".to_string(),
            Value::Primitive(Rc::new(crate::value::PrimitiveProc {
                name: "=".to_string(),
                func: |args, _env| match (&args[0], &args[1]) {
                    (Value::Integer(a), Value::Integer(b)) => Ok(Value::Boolean(a == b)),
                    _ => Err(crate::error::SchemeError::Type {
                        expected: "integer".to_string(),
                        found: "other".to_string(),
                    }),
                },
            })),
        );
        global.borrow_mut().define(
            "-".to_string(),
            Value::Primitive(Rc::new(crate::value::PrimitiveProc {
                name: "-".to_string(),
                func: |args, _env| match (&args[0], &args[1]) {
                    (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a - b)),
                    _ => Err(crate::error::SchemeError::Type {
                        expected: "integer".to_string(),
                        found: "other".to_string(),
                    }),
                },
            })),
        );

        let body = Rc::new(Expr::If(
            Rc::new(Expr::Application(
                Rc::new(Expr::Identifier("=".to_string())),
                vec![
                    Rc::new(Expr::Identifier("n".to_string())),
                    Rc::new(Expr::SelfEvaluating(Value::Integer(0))),
                ],
            )),
            Rc::new(Expr::Quote(Value::Symbol("done".to_string()))),
            Some(Rc::new(Expr::Application(
                Rc::new(Expr::Identifier("loop".to_string())),
                vec![Rc::new(Expr::Application(
                    Rc::new(Expr::Identifier("-".to_string())),
                    vec![
                        Rc::new(Expr::Identifier("n".to_string())),
                        Rc::new(Expr::SelfEvaluating(Value::Integer(1))),
                    ],
                ))],
            ))),
        ));
        let lambda = Expr::Lambda(
            vec![Parameter {
                name: "n".to_string(),
                strategy: Strategy::Strict,
            }],
            vec![body],
        );
        let proc_value = expr::eval_step(&lambda, Rc::clone(&global)).unwrap();
        global.borrow_mut().define("loop".to_string(), proc_value);

        const ITERATIONS: i64 = 300_000;
        let call = Expr::Application(
            Rc::new(Expr::Identifier("loop".to_string())),
            vec![Rc::new(Expr::SelfEvaluating(Value::Integer(ITERATIONS)))],
        );
        let result = evaluate(&call, global).unwrap();
        assert_eq!(result, Value::Symbol("done".to_string()));
    }

    #[test]
    fn lexical_scoping_ignores_later_shadowing() {
        // ((lambda (x) (lambda (y) x)) 'a) applied to 'b must yield 'a.
        let outer = Expr::Application(
            Rc::new(Expr::Lambda(
                vec![Parameter {
                    name: "x".to_string(),
                    strategy: Strategy::Strict,
                }],
                vec![Rc::new(Expr::Lambda(
                    vec![Parameter {
                        name: "y".to_string(),
                        strategy: Strategy::Strict,
                    }],
                    vec![Rc::new(Expr::Identifier("x".to_string()))],
                ))],
            )),
            vec![Rc::new(Expr::Quote(Value::Symbol("a".to_string())))],
        );
        let inner_proc = evaluate(&outer, env()).unwrap();
        let apply_to_b = match &inner_proc {
            Value::Compound(_) => Expr::Application(
                Rc::new(Expr::SelfEvaluating(inner_proc.clone())),
                vec![Rc::new(Expr::Quote(Value::Symbol("b".to_string())))],
            ),
            _ => panic!("expected compound procedure"),
        };
        let result = evaluate(&apply_to_b, env()).unwrap();
        assert_eq!(result, Value::Symbol("a".to_string()));
    }
}
