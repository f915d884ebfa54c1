use crate::error::{Result, SchemeError};
use crate::expr::Expr;
use crate::value::{Parameter, Strategy, Value};
use log::debug;
use std::rc::Rc;

/// Converts a datum (already-typed `Value` tree, produced by `super::datum`
/// or handed in directly by the `eval` primitive) into the `Expr` algebra
/// the evaluator consumes. Mirrors the original source's analyzer, except
/// it operates on typed `Value`s instead of untyped token trees, so there is
/// no separate "quote vs. number vs. symbol" dispatch left to do: a quoted
/// sub-datum is simply cloned, never re-analyzed.
pub fn analyze(datum: &Value) -> Result<Expr> {
    debug!("analyzing datum: {}", datum);
    match datum {
        Value::Boolean(_)
        | Value::Integer(_)
        | Value::Float(_)
        | Value::Complex(..)
        | Value::String(_) => Ok(Expr::SelfEvaluating(datum.clone())),
        Value::Symbol(name) => Ok(Expr::Identifier(name.clone())),
        Value::List(items) if items.is_empty() => Ok(Expr::SelfEvaluating(Value::nil())),
        Value::List(items) => analyze_form(items),
        other => Err(SchemeError::Syntax(format!(
            "{} cannot appear as source code",
            other.type_name()
        ))),
    }
}

fn analyze_form(items: &[Value]) -> Result<Expr> {
    if let Value::Symbol(head) = &items[0] {
        match head.as_str() {
            "quote" => return analyze_quote(&items[1..]),
            "if" => return analyze_if(&items[1..]),
            "define" => return analyze_define(&items[1..]),
            "set!" => return analyze_set(&items[1..]),
            "lambda" => return analyze_lambda(&items[1..]),
            "begin" => return analyze_begin(&items[1..]),
            "cond" => return analyze_cond(&items[1..]),
            _ => {}
        }
    }
    analyze_application(items)
}

fn analyze_quote(args: &[Value]) -> Result<Expr> {
    match args {
        [datum] => Ok(Expr::Quote(datum.clone())),
        _ => Err(SchemeError::Syntax("quote takes exactly one datum".to_string())),
    }
}

fn analyze_if(args: &[Value]) -> Result<Expr> {
    match args {
        [predicate, consequent] => Ok(Expr::If(
            Rc::new(analyze(predicate)?),
            Rc::new(analyze(consequent)?),
            None,
        )),
        [predicate, consequent, alternative] => Ok(Expr::If(
            Rc::new(analyze(predicate)?),
            Rc::new(analyze(consequent)?),
            Some(Rc::new(analyze(alternative)?)),
        )),
        _ => Err(SchemeError::Syntax(
            "if takes a predicate, a consequent, and an optional alternative".to_string(),
        )),
    }
}

fn analyze_define(args: &[Value]) -> Result<Expr> {
    match args {
        [Value::Symbol(name), value] => {
            Ok(Expr::Definition(name.clone(), Rc::new(analyze(value)?)))
        }
        [Value::List(header), body @ ..] => {
            let (name, params) = header.split_first().ok_or_else(|| {
                SchemeError::Syntax("define's procedure header needs a name".to_string())
            })?;
            let Value::Symbol(name) = name else {
                return Err(SchemeError::Syntax(
                    "define's procedure header must start with a name".to_string(),
                ));
            };
            let parameters = analyze_parameter_list(params)?;
            let body = analyze_body(body)?;
            Ok(Expr::Definition(
                name.clone(),
                Rc::new(Expr::Lambda(parameters, body)),
            ))
        }
        _ => Err(SchemeError::Syntax(
            "define takes a name and a value, or a procedure header and a body".to_string(),
        )),
    }
}

fn analyze_set(args: &[Value]) -> Result<Expr> {
    match args {
        [Value::Symbol(name), value] => Ok(Expr::Assignment(name.clone(), Rc::new(analyze(value)?))),
        _ => Err(SchemeError::Syntax("set! takes a name and a value".to_string())),
    }
}

fn analyze_lambda(args: &[Value]) -> Result<Expr> {
    match args {
        [Value::List(params), body @ ..] => {
            let parameters = analyze_parameter_list(params)?;
            Ok(Expr::Lambda(parameters, analyze_body(body)?))
        }
        _ => Err(SchemeError::Syntax(
            "lambda takes a parameter list and a body".to_string(),
        )),
    }
}

fn analyze_begin(args: &[Value]) -> Result<Expr> {
    Ok(Expr::Begin(analyze_body(args)?))
}

fn analyze_body(body: &[Value]) -> Result<Vec<Rc<Expr>>> {
    body.iter().map(|e| analyze(e).map(Rc::new)).collect()
}

/// Desugars `cond` into nested `If`s (and `begin`s for multi-expression
/// clauses), matching the original source's `analyze_cond`. An `else`
/// clause becomes the final branch rather than an `If` test.
fn analyze_cond(clauses: &[Value]) -> Result<Expr> {
    match clauses.split_first() {
        None => Ok(Expr::SelfEvaluating(Value::Boolean(false))),
        Some((clause, rest)) => {
            let Value::List(parts) = clause else {
                return Err(SchemeError::Syntax("a cond clause must be a list".to_string()));
            };
            let (test, body) = parts.split_first().ok_or_else(|| {
                SchemeError::Syntax("a cond clause needs a test".to_string())
            })?;
            if matches!(test, Value::Symbol(s) if s == "else") {
                return Ok(Expr::Begin(analyze_body(body)?));
            }
            let consequent = Expr::Begin(analyze_body(body)?);
            let alternative = analyze_cond(rest)?;
            Ok(Expr::If(
                Rc::new(analyze(test)?),
                Rc::new(consequent),
                Some(Rc::new(alternative)),
            ))
        }
    }
}

fn analyze_application(items: &[Value]) -> Result<Expr> {
    let (operator, operands) = items
        .split_first()
        .expect("empty applications are handled by analyze before reaching here");
    Ok(Expr::Application(
        Rc::new(analyze(operator)?),
        operands.iter().map(|e| analyze(e).map(Rc::new)).collect::<Result<Vec<_>>>()?,
    ))
}

/// A parameter form is either a bare symbol (defaulting to `Strict`) or a
/// two-element list `(name tag)` where `tag` is one of `s`/`l`/`m`
/// (SPEC_FULL.md §3 "Parameters").
fn analyze_parameter_list(params: &[Value]) -> Result<Vec<Parameter>> {
    params.iter().map(analyze_parameter).collect()
}

fn analyze_parameter(param: &Value) -> Result<Parameter> {
    match param {
        Value::Symbol(name) => Ok(Parameter {
            name: name.clone(),
            strategy: Strategy::Strict,
        }),
        Value::List(parts) => match parts.as_slice() {
            [Value::Symbol(name), Value::Symbol(tag)] => Ok(Parameter {
                name: name.clone(),
                strategy: parse_strategy_tag(tag)?,
            }),
            _ => Err(SchemeError::Syntax(
                "a tagged parameter is (name tag)".to_string(),
            )),
        },
        other => Err(SchemeError::Syntax(format!(
            "{} is not a valid parameter form",
            other.type_name()
        ))),
    }
}

fn parse_strategy_tag(tag: &str) -> Result<Strategy> {
    match tag {
        "s" => Ok(Strategy::Strict),
        "l" => Ok(Strategy::Lazy),
        "m" => Ok(Strategy::LazyMemo),
        other => Err(SchemeError::Syntax(format!(
            "unknown parameter strategy tag '{}'",
            other
        ))),
    }
}
