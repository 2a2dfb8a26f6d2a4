//! Control-flow rewriting.
//!
//! Turns shapes the evaluator cannot run under encryption into equivalent
//! shapes it can, driven by the secret-taint map:
//!
//! - `FheOperatorLowering`: `+ - *` with a secret operand become their
//!   homomorphic variants.
//! - `SecretBranchElimination`: `if (c) { x = a; } else { x = b; }` with a
//!   secret `c` becomes `x = c * a + (1 - c) * b`.
//!
//! Rules are trait objects collected in a [`RuleSet`]; the [`Rewriter`]
//! folds the tree bottom-up, offers every node to every rule, and fails if
//! an unsupported shape survives.

mod driver;
mod errors;
mod rule;
mod rules;

pub use driver::{rewrite_program, RewriteOptions, Rewriter};
pub use errors::RewriteError;
pub use rule::{RewriteContext, RewriteOutcome, RewriteRule, RuleSet};
pub use rules::{FheOperatorLowering, SecretBranchElimination};
