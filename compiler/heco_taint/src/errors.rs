use thiserror::Error;

use heco_ir::{IrError, ScopeError};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TaintError {
    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Ir(#[from] IrError),

    /// A secret value would flow into a cleartext store.
    #[error("cannot assign secret value `{value}` to non-secret `{target}`")]
    SecretToCleartext { target: String, value: String },

    #[error("assignment target must be a Variable or IndexAccess, found `{0}`")]
    InvalidTarget(String),
}
