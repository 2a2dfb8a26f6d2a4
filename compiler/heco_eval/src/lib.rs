//! heco evaluation: runs a rewritten program over cleartexts and
//! ciphertexts.
//!
//! - `Cleartext` / `Value` for runtime values
//! - `Ciphertext` / `CiphertextFactory` for the encrypted-data capability
//!   supplied by the caller, with `DummyCiphertextFactory` as a simulated
//!   backend
//! - `Evaluator` for the runtime visitor, built with `EvaluatorBuilder`
//!
//! Evaluation expects the shape produced by taint analysis and rewriting:
//! no secret conditions, no secret indices, and secret operands only under
//! `+`, `-` and `*`. Anything else fails with an [`EvalError`] carrying the
//! offending snippet.

pub mod backend;
mod errors;
mod interpreter;
pub mod value;

pub use backend::{Ciphertext, CiphertextFactory, DummyCiphertext, DummyCiphertextFactory};
pub use errors::{EvalError, EvalErrorKind};
pub use interpreter::{Evaluator, EvaluatorBuilder, Output};
pub use value::{Cleartext, Value};
