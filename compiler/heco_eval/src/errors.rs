//! Evaluation errors.
//!
//! `EvalErrorKind` is the category callers match on; the message carries
//! the construct, the operator where relevant and the rendered snippet.
//! Build errors through the factory functions below rather than by hand.

use thiserror::Error;

use heco_ir::{IrError, Operator, ScopeError};

/// Error category.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EvalErrorKind {
    /// The tree does not have the shape this stage requires.
    Structural,
    /// A construct or operator that cannot run, typically because an
    /// operand is secret.
    Unsupported,
    /// Identifier lookup failed.
    Unresolved,
    /// The ciphertext backend refused an operation.
    Backend,
    /// A cleartext computation failed (division by zero, overflow, bad
    /// index, type mismatch).
    Arithmetic,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        EvalError {
            kind,
            message: message.into(),
        }
    }
}

impl From<IrError> for EvalError {
    fn from(err: IrError) -> Self {
        EvalError::new(EvalErrorKind::Structural, err.to_string())
    }
}

impl From<ScopeError> for EvalError {
    fn from(err: ScopeError) -> Self {
        let kind = match err {
            ScopeError::Unresolved(_) => EvalErrorKind::Unresolved,
            ScopeError::Redeclared { .. } | ScopeError::ExitRoot => EvalErrorKind::Structural,
        };
        EvalError::new(kind, err.to_string())
    }
}

// Structural

pub fn structural(message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::Structural, message)
}

pub fn invalid_inputs(rendered: &str) -> EvalError {
    structural(format!(
        "inputs must be a Block of VariableDeclarations, found `{rendered}`"
    ))
}

pub fn invalid_outputs(rendered: &str) -> EvalError {
    structural(format!("outputs must be a Block of Assignments, found `{rendered}`"))
}

pub fn invalid_assignment_target(rendered: &str) -> EvalError {
    structural(format!(
        "assignment target must be a Variable or IndexAccess, found `{rendered}`"
    ))
}

pub fn nested_index_access(rendered: &str) -> EvalError {
    structural(format!("nested index access is not supported: `{rendered}`"))
}

pub fn not_live(name: &str) -> EvalError {
    structural(format!("`{name}` is declared but has no value"))
}

pub fn ciphertext_into_cleartext(name: &str) -> EvalError {
    structural(format!("cannot store a ciphertext in non-secret `{name}`"))
}

// Unsupported

pub fn unsupported(message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::Unsupported, message)
}

pub fn unsupported_ciphertext_operation(operator: Operator, rendered: &str) -> EvalError {
    unsupported(format!(
        "unsupported ciphertext operation: {} in `{rendered}`",
        operator.name()
    ))
}

pub fn unknown_unary_operator(operator: Operator) -> EvalError {
    unsupported(format!("unknown unary operator `{operator}`"))
}

pub fn secret_condition(construct: &str, rendered: &str) -> EvalError {
    unsupported(format!(
        "{construct} with a secret condition reached evaluation: `{rendered}`"
    ))
}

pub fn unsupported_construct(construct: &str, rendered: &str) -> EvalError {
    unsupported(format!("{construct} cannot be evaluated: `{rendered}`"))
}

// Unresolved

pub fn unresolved(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::Unresolved, format!("undeclared identifier `{name}`"))
}

// Backend

pub fn backend(message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::Backend, message)
}

// Arithmetic

pub fn division_by_zero() -> EvalError {
    EvalError::new(EvalErrorKind::Arithmetic, "division by zero")
}

pub fn modulo_by_zero() -> EvalError {
    EvalError::new(EvalErrorKind::Arithmetic, "modulo by zero")
}

pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::Arithmetic,
        format!("integer overflow in {operation}"),
    )
}

pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::Arithmetic,
        format!("type mismatch: expected {expected}, got {got}"),
    )
}

pub fn invalid_operator_for(operator: Operator, type_name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::Arithmetic,
        format!("{} is not defined for {type_name}", operator.name()),
    )
}

pub fn length_mismatch(left: usize, right: usize) -> EvalError {
    EvalError::new(
        EvalErrorKind::Arithmetic,
        format!("vector length mismatch: {left} vs {right}"),
    )
}

pub fn index_out_of_bounds(index: i64, len: usize) -> EvalError {
    EvalError::new(
        EvalErrorKind::Arithmetic,
        format!("index {index} out of bounds for length {len}"),
    )
}
