use crate::env::Environment;
use crate::error::SchemeError;
use crate::expr::Expr;
use crate::thunk::Thunk;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Signature of a host-implemented primitive: forced arguments plus the
/// environment the call is happening in, producing a value or a failure.
pub type BuiltinFn = fn(&[Value], Rc<RefCell<Environment>>) -> crate::error::Result<Value>;

/// A host-implemented procedure. Keeps its name for `display`/diagnostics;
/// the external representation itself is just `#<primitive procedure>`.
pub struct PrimitiveProc {
    pub name: String,
    pub func: BuiltinFn,
}

/// Per-parameter evaluation strategy (SPEC_FULL.md §3 "Parameters").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Strict,
    Lazy,
    LazyMemo,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub strategy: Strategy,
}

/// A user-defined closure: its parameter list (with strategies), its body
/// sequence, and the frame it was defined in.
pub struct CompoundProc {
    pub parameters: Vec<Parameter>,
    pub body: Vec<Rc<Expr>>,
    pub env: Rc<RefCell<Environment>>,
}

/// A Scheme value. `Thunk` is a value in its own right, not just an
/// internal control-flow detail: lazy parameter bindings live in
/// environment frames exactly like any other value, and the trampoline's
/// tail-call continuations are built from the same mechanism.
#[derive(Clone)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Complex(f64, f64),
    String(String),
    Symbol(String),
    Pair(Box<Value>, Box<Value>),
    List(Vec<Value>),
    Primitive(Rc<PrimitiveProc>),
    Compound(Rc<CompoundProc>),
    Thunk(Thunk),
}

impl Value {
    pub fn nil() -> Value {
        Value::List(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::List(items) if items.is_empty())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Complex(..) => "complex",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Pair(..) => "pair",
            Value::List(_) => "list",
            Value::Primitive(_) => "procedure",
            Value::Compound(_) => "procedure",
            Value::Thunk(_) => "thunk",
        }
    }

    pub fn type_error(expected: &str, found: &Value) -> SchemeError {
        SchemeError::Type {
            expected: expected.to_string(),
            found: found.type_name().to_string(),
        }
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Value::Primitive(_) | Value::Compound(_))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// The external representation from SPEC_FULL.md §6.1.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(true) => write!(f, "#t"),
            Value::Boolean(false) => write!(f, "#f"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Complex(re, im) => {
                if *im < 0.0 {
                    write!(f, "{}{}i", re, im)
                } else {
                    write!(f, "{}+{}i", re, im)
                }
            }
            Value::Symbol(s) => write!(f, "{}", s),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Pair(car, cdr) => write!(f, "({} . {})", car, cdr),
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", rendered.join(" "))
            }
            Value::Primitive(_) => write!(f, "#<primitive procedure>"),
            Value::Compound(_) => write!(f, "#<compound procedure>"),
            Value::Thunk(_) => write!(f, "#<thunk>"),
        }
    }
}

/// Structural equality for `equal?`. Procedures and thunks have no
/// counterpart in the distilled spec's equality rules (§8 invariant 5 only
/// talks about scalars/pairs/lists), so two procedures are never equal here.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Complex(a, b), Value::Complex(c, d)) => a == c && b == d,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Pair(a1, a2), Value::Pair(b1, b2)) => a1 == b1 && a2 == b2,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}
