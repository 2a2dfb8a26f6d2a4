//! Ciphertext backend boundary.
//!
//! The evaluator never computes on encrypted data itself; it hands
//! ciphertexts to a [`CiphertextFactory`] supplied by the caller. The
//! receiver of every binary operation is the ciphertext, which is why the
//! evaluator swaps commutative operands when only the right one is secret.

mod dummy;

use std::any::Any;
use std::fmt;

use crate::errors::EvalError;
use crate::value::Cleartext;

pub use dummy::{DummyCiphertext, DummyCiphertextFactory};

/// One encrypted vector of packed slots.
pub trait Ciphertext: fmt::Debug + Send + Sync {
    /// Independent copy owning its own state.
    fn clone_ciphertext(&self) -> Box<dyn Ciphertext>;

    /// Cyclic left shift of the slots by `steps` (right for negative).
    fn rotate_rows_inplace(&mut self, steps: i64) -> Result<(), EvalError>;

    fn add_inplace(&mut self, other: &dyn Ciphertext) -> Result<(), EvalError>;

    fn subtract_inplace(&mut self, other: &dyn Ciphertext) -> Result<(), EvalError>;

    fn multiply_inplace(&mut self, other: &dyn Ciphertext) -> Result<(), EvalError>;

    fn add_plain_inplace(&mut self, plain: &Cleartext) -> Result<(), EvalError>;

    fn subtract_plain_inplace(&mut self, plain: &Cleartext) -> Result<(), EvalError>;

    fn multiply_plain_inplace(&mut self, plain: &Cleartext) -> Result<(), EvalError>;

    /// Concrete type access for backends combining two of their own
    /// ciphertexts.
    fn as_any(&self) -> &dyn Any;

    /// Rotated copy; `self` is unchanged.
    fn rotate_rows(&self, steps: i64) -> Result<Box<dyn Ciphertext>, EvalError> {
        let mut copy = self.clone_ciphertext();
        copy.rotate_rows_inplace(steps)?;
        Ok(copy)
    }

    fn add(&self, other: &dyn Ciphertext) -> Result<Box<dyn Ciphertext>, EvalError> {
        let mut copy = self.clone_ciphertext();
        copy.add_inplace(other)?;
        Ok(copy)
    }

    fn subtract(&self, other: &dyn Ciphertext) -> Result<Box<dyn Ciphertext>, EvalError> {
        let mut copy = self.clone_ciphertext();
        copy.subtract_inplace(other)?;
        Ok(copy)
    }

    fn multiply(&self, other: &dyn Ciphertext) -> Result<Box<dyn Ciphertext>, EvalError> {
        let mut copy = self.clone_ciphertext();
        copy.multiply_inplace(other)?;
        Ok(copy)
    }
}

/// Creates, decrypts and renders ciphertexts of one backend.
pub trait CiphertextFactory: Sync {
    /// Encrypt `plain`; a scalar is replicated into every slot.
    fn create_ciphertext(&self, plain: &Cleartext) -> Result<Box<dyn Ciphertext>, EvalError>;

    fn decrypt(&self, ciphertext: &dyn Ciphertext) -> Result<Cleartext, EvalError>;

    /// Number of packed slots per ciphertext.
    fn slot_count(&self) -> usize;

    /// Decrypted display form.
    fn render(&self, ciphertext: &dyn Ciphertext) -> Result<String, EvalError> {
        Ok(self.decrypt(ciphertext)?.to_string())
    }
}

#[cfg(test)]
mod tests;
