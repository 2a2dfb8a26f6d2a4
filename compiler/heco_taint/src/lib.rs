//! Secret-taint analysis.
//!
//! Computes, for every node, whether its result must be kept encrypted.
//! The answer is keyed by `NodeId` so it survives rewriting as long as the
//! rewritten nodes keep their ids.
//!
//! # Fixed point
//!
//! A variable's taint is its declared secret flag, not the taint of the
//! values that flowed into it, and assigning a secret value to a cleartext
//! variable is rejected. Every fact therefore depends only on declarations
//! that precede it and on the node's own children, so a single post-order
//! pass already reaches the fixed point; loops need no second iteration.

mod analysis;
mod errors;
mod map;

pub use analysis::{analyze_program, TaintAnalysis};
pub use errors::TaintError;
pub use map::SecretTaintMap;
