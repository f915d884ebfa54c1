use super::tokenizer::{self, Token};
use crate::error::{Result, SchemeError};
use crate::value::Value;

/// Reads every top-level datum out of `input` (used by the script runner,
/// which may see several top-level forms in one file).
pub fn read_all(input: &str) -> Result<Vec<Value>> {
    let tokens = tokenizer::tokenize(input)?;
    let mut pos = 0;
    let mut datums = Vec::new();
    while pos < tokens.len() {
        let (datum, next) = parse_datum(&tokens, pos)?;
        datums.push(datum);
        pos = next;
    }
    Ok(datums)
}

/// Reads a single top-level datum, for the REPL's one-form-per-line use.
/// Returns `Ok(None)` for blank or comment-only input.
pub fn read_one(input: &str) -> Result<Option<Value>> {
    let tokens = tokenizer::tokenize(input)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    let (datum, next) = parse_datum(&tokens, 0)?;
    if next != tokens.len() {
        return Err(SchemeError::Syntax(
            "trailing input after a complete form".to_string(),
        ));
    }
    Ok(Some(datum))
}

fn parse_datum(tokens: &[Token], pos: usize) -> Result<(Value, usize)> {
    match tokens.get(pos) {
        None => Err(SchemeError::Syntax("unexpected end of input".to_string())),
        Some(Token::RParen) => Err(SchemeError::Syntax("unexpected ')'".to_string())),
        Some(Token::LParen) => parse_list(tokens, pos + 1),
        Some(Token::Quote) => {
            let (inner, next) = parse_datum(tokens, pos + 1)?;
            Ok((
                Value::List(vec![Value::Symbol("quote".to_string()), inner]),
                next,
            ))
        }
        Some(Token::Symbol(s)) => Ok((Value::Symbol(s.clone()), pos + 1)),
        Some(Token::Integer(n)) => Ok((Value::Integer(*n), pos + 1)),
        Some(Token::Float(x)) => Ok((Value::Float(*x), pos + 1)),
        Some(Token::Complex(re, im)) => Ok((Value::Complex(*re, *im), pos + 1)),
        Some(Token::Bool(b)) => Ok((Value::Boolean(*b), pos + 1)),
        Some(Token::Str(s)) => Ok((Value::String(s.clone()), pos + 1)),
    }
}

fn parse_list(tokens: &[Token], mut pos: usize) -> Result<(Value, usize)> {
    let mut items = Vec::new();
    loop {
        match tokens.get(pos) {
            None => return Err(SchemeError::Syntax("unterminated list".to_string())),
            Some(Token::RParen) => return Ok((Value::List(items), pos + 1)),
            _ => {
                let (item, next) = parse_datum(tokens, pos)?;
                items.push(item);
                pos = next;
            }
        }
    }
}
