use crate::env::Environment;
use crate::error::Result;
use crate::expr::{self, Expr};
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// A deferred evaluation: an expression plus the environment it should be
/// evaluated in, forced on demand. Doubles as the trampoline's tail-call
/// marker (a non-memoizing thunk created by `tail_call`) and as the binding
/// a `Lazy`/`LazyMemo` parameter gets in the callee's frame.
#[derive(Clone)]
pub struct Thunk(Rc<RefCell<ThunkState>>);

enum ThunkState {
    Pending {
        expr: Rc<Expr>,
        env: Rc<RefCell<Environment>>,
        memo: bool,
    },
    Forced(Value),
}

impl Thunk {
    /// A plain thunk: re-evaluates `expr` in `env` on every force.
    pub fn pending(expr: Rc<Expr>, env: Rc<RefCell<Environment>>) -> Thunk {
        Thunk(Rc::new(RefCell::new(ThunkState::Pending {
            expr,
            env,
            memo: false,
        })))
    }

    /// A memoizing thunk: evaluates `expr` in `env` once, then caches the
    /// result and drops the captured expression/environment.
    pub fn memo(expr: Rc<Expr>, env: Rc<RefCell<Environment>>) -> Thunk {
        Thunk(Rc::new(RefCell::new(ThunkState::Pending {
            expr,
            env,
            memo: true,
        })))
    }

    /// Invokes the callable exactly once per call (re-running for plain
    /// thunks, replaying the cache for memo thunks after the first call).
    /// The underlying evaluation step, not the trampoline wrapper, is
    /// invoked here, so a chain of tail-call thunks unwinds in the caller's
    /// force loop rather than recursing back through `evaluate`.
    pub fn force_once(&self) -> Result<Value> {
        let (expr, env, memo) = match &*self.0.borrow() {
            ThunkState::Forced(value) => return Ok(value.clone()),
            ThunkState::Pending { expr, env, memo } => (Rc::clone(expr), Rc::clone(env), *memo),
        };
        let value = expr::eval_step(&expr, env)?;
        if memo {
            *self.0.borrow_mut() = ThunkState::Forced(value.clone());
        }
        Ok(value)
    }
}

/// Iteratively unwraps nested thunks until a non-thunk value is produced.
/// This loop, not host recursion, is what bounds tail-call depth.
pub fn force(mut value: Value) -> Result<Value> {
    while let Value::Thunk(thunk) = value {
        value = thunk.force_once()?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use std::cell::Cell;
    use std::rc::Rc;

    thread_local! {
        static CALLS: Cell<u32> = Cell::new(0);
    }

    fn counting_env() -> Rc<RefCell<Environment>> {
        let env = Rc::new(RefCell::new(Environment::new()));
        env.borrow_mut().define(
            "count!".to_string(),
            Value::Primitive(Rc::new(crate::value::PrimitiveProc {
                name: "count!".to_string(),
                func: |_args, _env| {
                    CALLS.with(|c| c.set(c.get() + 1));
                    Ok(Value::Integer(0))
                },
            })),
        );
        env
    }

    fn call_expr() -> Rc<Expr> {
        Rc::new(Expr::Application(
            Rc::new(Expr::Identifier("count!".to_string())),
            Vec::new(),
        ))
    }

    #[test]
    fn plain_thunk_reruns_every_force() {
        CALLS.with(|c| c.set(0));
        let env = counting_env();
        let thunk = Thunk::pending(call_expr(), env);
        thunk.force_once().unwrap();
        thunk.force_once().unwrap();
        thunk.force_once().unwrap();
        assert_eq!(CALLS.with(|c| c.get()), 3);
    }

    #[test]
    fn memo_thunk_runs_exactly_once() {
        CALLS.with(|c| c.set(0));
        let env = counting_env();
        let thunk = Thunk::memo(call_expr(), env);
        thunk.force_once().unwrap();
        thunk.force_once().unwrap();
        thunk.force_once().unwrap();
        assert_eq!(CALLS.with(|c| c.get()), 1);
    }

    #[test]
    fn force_unwraps_nested_thunks() {
        let env = Rc::new(RefCell::new(Environment::new()));
        let inner = Value::Thunk(Thunk::pending(
            Rc::new(Expr::SelfEvaluating(Value::Integer(7))),
            Rc::clone(&env),
        ));
        let outer_expr = Rc::new(Expr::SelfEvaluating(inner));
        let outer = Value::Thunk(Thunk::pending(outer_expr, env));
        assert_eq!(force(outer).unwrap(), Value::Integer(7));
    }
}
