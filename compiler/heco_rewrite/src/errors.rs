use thiserror::Error;

use heco_ir::IrError;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// An unsupported shape survived every rule.
    #[error("no rewrite rule applies to {construct}: `{rendered}`")]
    NoApplicableRule {
        construct: &'static str,
        rendered: String,
    },

    /// A non-homomorphic operator has a secret operand.
    #[error("unsupported ciphertext operation: {operator} in `{rendered}`")]
    UnsupportedOperator {
        operator: &'static str,
        rendered: String,
    },

    #[error("rewrite limit of {limit} rule applications exceeded at `{rendered}`")]
    IterationLimit { limit: usize, rendered: String },

    #[error(transparent)]
    Ir(#[from] IrError),
}
