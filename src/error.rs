use thiserror::Error;

/// Unified failure surface for the reader, the evaluator, and the primitives.
///
/// The core never prints an error; callers (the REPL, the script runner, `eval`'s
/// caller) decide whether a given variant is recoverable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemeError {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Undefined identifier: {0}")]
    UndefinedIdentifier(String),

    #[error("Arity mismatch: expected {expected}, got {got}")]
    ArityMismatch { expected: String, got: usize },

    #[error("Type error: expected {expected}, found {found}")]
    Type { expected: String, found: String },

    #[error("Eval error: {0}")]
    Eval(String),

    #[error("Apply error: not a procedure: {0}")]
    Apply(String),

    #[error("Conversion error: {0}")]
    Conversion(String),
}

pub type Result<T> = std::result::Result<T, SchemeError>;
