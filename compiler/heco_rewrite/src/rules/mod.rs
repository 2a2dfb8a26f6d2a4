//! Built-in rules.

mod branch;
mod lowering;

pub use branch::SecretBranchElimination;
pub use lowering::FheOperatorLowering;

#[cfg(test)]
mod tests;
