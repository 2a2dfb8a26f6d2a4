//! IR-level errors: null child access, tree surgery and JSON decoding.

use thiserror::Error;

use crate::NodeId;

/// Errors raised by the node model and its JSON codec.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IrError {
    /// An optional child slot was read while unset.
    #[error("cannot get null {slot} of {node}")]
    MissingChild {
        node: &'static str,
        slot: &'static str,
    },

    /// `replace_child` was given an id that is not a direct child.
    #[error("node {parent} has no direct child {child}")]
    NoSuchChild { parent: NodeId, child: NodeId },

    /// A statement was offered for an expression slot or vice versa.
    #[error("{node} expects {expected} in this slot, got {found}")]
    SlotKindMismatch {
        node: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),

    #[error("{node}: missing field `{field}`")]
    MissingField { node: String, field: &'static str },

    #[error("{node}: invalid field `{field}`: {reason}")]
    InvalidField {
        node: String,
        field: &'static str,
        reason: String,
    },

    #[error("unknown operator `{0}`")]
    UnknownOperator(String),

    #[error("invalid datatype `{0}`")]
    InvalidDatatype(String),

    #[error("invalid JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for IrError {
    fn from(err: serde_json::Error) -> Self {
        IrError::Json(err.to_string())
    }
}
