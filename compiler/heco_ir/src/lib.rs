//! heco IR - the abstract syntax tree of the heco language.
//!
//! This crate contains the data structures every phase works on:
//! - `NodeId` for process-unique node identities
//! - `Expr` / `Stmt` / `Node` for the owned tree (parent links are plain ids)
//! - `Operator` and `Datatype` for the closed operator and type sets
//! - `Visitor` for double-dispatched tree walks
//! - `ScopeTree` / `ScopedIdentifier` for lexical resolution
//! - JSON encoding and decoding, source-like rendering
//!
//! # Design Philosophy
//!
//! - **Own the tree**: every node owns its children through `Box`/`Vec`;
//!   the parent link is a `NodeId`, never a pointer.
//! - **Closed sums**: node variants are enums, so adding a variant forces
//!   every `Visitor::accept` dispatch and every evaluator match to handle it.
//! - **Ids are identity**: per-node facts (secret taint) are keyed by
//!   `NodeId`, which survives structural rewrites and is refreshed by
//!   `clone_tree(false)` before a template is executed again.

pub mod ast;
mod datatype;
mod errors;
pub mod json;
mod node_id;
mod operators;
pub mod render;
pub mod scope;
pub mod visitor;

pub use ast::{
    Assignment, BinaryExpression, Block, Call, Expr, ExprKind, ExpressionList, For, Function,
    FunctionParameter, If, IndexAccess, Literal, Node, NodeRef, OperatorExpression, Return, Stmt,
    StmtKind, UnaryExpression, Variable, VariableDeclaration, While,
};
pub use datatype::{Datatype, PrimitiveKind};
pub use errors::IrError;
pub use node_id::NodeId;
pub use operators::Operator;
pub use render::TreePrinter;
pub use scope::{ScopeError, ScopeId, ScopeTree, ScopedIdentifier};
pub use visitor::Visitor;
