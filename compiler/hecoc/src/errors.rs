//! Execution errors.

use thiserror::Error;

use heco_eval::EvalError;
use heco_ir::IrError;
use heco_rewrite::RewriteError;
use heco_taint::TaintError;

/// Anything that can stop a program run, from reading files to evaluation.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("cannot read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid inputs: {0}")]
    InputJson(#[from] serde_json::Error),

    #[error("invalid input `{name}`: {reason}")]
    InvalidInput { name: String, reason: String },

    #[error("program root must be a statement, found {0}")]
    ExpressionRoot(&'static str),

    #[error(transparent)]
    Ir(#[from] IrError),

    #[error(transparent)]
    Taint(#[from] TaintError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl ExecError {
    pub(crate) fn invalid_input(name: &str, reason: impl Into<String>) -> Self {
        ExecError::InvalidInput {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
