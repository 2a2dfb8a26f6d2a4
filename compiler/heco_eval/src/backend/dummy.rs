//! Simulated backend: slots are held in the clear.
//!
//! Integer-like kinds (`bool`, `int`) pack into `i64` slots with wrapping
//! arithmetic, `float` and `double` into `f64` slots. A scalar fills every
//! slot and decrypts back to a scalar; a vector is zero padded and decrypts
//! to the full slot vector.

use std::any::Any;

use heco_ir::PrimitiveKind;

use super::{Ciphertext, CiphertextFactory};
use crate::errors::{backend, EvalError};
use crate::value::{rotation_offset, Cleartext};

/// Slot count used when none is configured.
const DEFAULT_SLOT_COUNT: usize = 16;

#[derive(Clone, Debug, PartialEq)]
enum Slots {
    Int(Vec<i64>),
    Real(Vec<f64>),
}

impl Slots {
    fn len(&self) -> usize {
        match self {
            Slots::Int(v) => v.len(),
            Slots::Real(v) => v.len(),
        }
    }

    #[allow(clippy::cast_precision_loss, reason = "mixed int/real slots compute in f64")]
    fn into_real(self) -> Vec<f64> {
        match self {
            Slots::Int(v) => v.into_iter().map(|x| x as f64).collect(),
            Slots::Real(v) => v,
        }
    }

    fn rotate_left(&mut self, shift: usize) {
        match self {
            Slots::Int(v) => v.rotate_left(shift),
            Slots::Real(v) => v.rotate_left(shift),
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum SlotOp {
    Add,
    Sub,
    Mul,
}

impl SlotOp {
    fn int(self, a: i64, b: i64) -> i64 {
        match self {
            SlotOp::Add => a.wrapping_add(b),
            SlotOp::Sub => a.wrapping_sub(b),
            SlotOp::Mul => a.wrapping_mul(b),
        }
    }

    fn real(self, a: f64, b: f64) -> f64 {
        match self {
            SlotOp::Add => a + b,
            SlotOp::Sub => a - b,
            SlotOp::Mul => a * b,
        }
    }
}

/// Ciphertext of the simulated backend.
#[derive(Clone, Debug, PartialEq)]
pub struct DummyCiphertext {
    slots: Slots,
    kind: PrimitiveKind,
    /// Every slot holds the same scalar.
    broadcast: bool,
}

impl DummyCiphertext {
    fn encode(plain: &Cleartext, slot_count: usize) -> Result<Self, EvalError> {
        let len = plain.len();
        if len == 0 {
            return Err(backend("cannot encrypt an empty vector"));
        }
        if len > slot_count {
            return Err(backend(format!(
                "a vector of {len} elements does not fit in {slot_count} slots"
            )));
        }
        let slots = match plain {
            Cleartext::Bool(v) => Slots::Int(fill(v.iter().map(|&b| i64::from(b)), len, slot_count)),
            Cleartext::Int(v) => Slots::Int(fill(v.iter().copied(), len, slot_count)),
            Cleartext::Float(v) => Slots::Real(fill(v.iter().map(|&x| f64::from(x)), len, slot_count)),
            Cleartext::Double(v) => Slots::Real(fill(v.iter().copied(), len, slot_count)),
            Cleartext::Char(_) | Cleartext::String(_) => {
                return Err(backend(format!(
                    "cannot encrypt a {} value",
                    plain.type_name()
                )));
            }
        };
        Ok(DummyCiphertext {
            slots,
            kind: plain.kind(),
            broadcast: len == 1,
        })
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn downcast(ciphertext: &dyn Ciphertext) -> Result<&DummyCiphertext, EvalError> {
        ciphertext
            .as_any()
            .downcast_ref::<DummyCiphertext>()
            .ok_or_else(|| backend("ciphertext belongs to a different backend"))
    }

    fn combine(&mut self, other: &DummyCiphertext, op: SlotOp) -> Result<(), EvalError> {
        if self.slot_count() != other.slot_count() {
            return Err(backend(format!(
                "slot count mismatch: {} vs {}",
                self.slot_count(),
                other.slot_count()
            )));
        }
        let slots = std::mem::replace(&mut self.slots, Slots::Int(Vec::new()));
        self.slots = match (slots, &other.slots) {
            (Slots::Int(mut a), Slots::Int(b)) => {
                for (x, &y) in a.iter_mut().zip(b) {
                    *x = op.int(*x, y);
                }
                Slots::Int(a)
            }
            (a, b) => {
                let mut a = a.into_real();
                let b = b.clone().into_real();
                for (x, y) in a.iter_mut().zip(b) {
                    *x = op.real(*x, y);
                }
                Slots::Real(a)
            }
        };
        self.kind = wider(self.kind, other.kind);
        self.broadcast &= other.broadcast;
        Ok(())
    }

    fn combine_plain(&mut self, plain: &Cleartext, op: SlotOp) -> Result<(), EvalError> {
        let encoded = DummyCiphertext::encode(plain, self.slot_count())?;
        self.combine(&encoded, op)
    }
}

fn fill<T: Copy + Default>(values: impl Iterator<Item = T>, len: usize, slot_count: usize) -> Vec<T> {
    let mut slots: Vec<T> = values.collect();
    if len == 1 {
        vec![slots[0]; slot_count]
    } else {
        slots.resize(slot_count, T::default());
        slots
    }
}

fn wider(a: PrimitiveKind, b: PrimitiveKind) -> PrimitiveKind {
    let rank = |kind: PrimitiveKind| match kind {
        PrimitiveKind::Bool => 0,
        PrimitiveKind::Int => 1,
        PrimitiveKind::Float => 2,
        _ => 3,
    };
    if rank(a) >= rank(b) {
        a
    } else {
        b
    }
}

impl Ciphertext for DummyCiphertext {
    fn clone_ciphertext(&self) -> Box<dyn Ciphertext> {
        Box::new(self.clone())
    }

    fn rotate_rows_inplace(&mut self, steps: i64) -> Result<(), EvalError> {
        let shift = rotation_offset(steps, self.slot_count());
        self.slots.rotate_left(shift);
        Ok(())
    }

    fn add_inplace(&mut self, other: &dyn Ciphertext) -> Result<(), EvalError> {
        let other = DummyCiphertext::downcast(other)?;
        self.combine(other, SlotOp::Add)
    }

    fn subtract_inplace(&mut self, other: &dyn Ciphertext) -> Result<(), EvalError> {
        let other = DummyCiphertext::downcast(other)?;
        self.combine(other, SlotOp::Sub)
    }

    fn multiply_inplace(&mut self, other: &dyn Ciphertext) -> Result<(), EvalError> {
        let other = DummyCiphertext::downcast(other)?;
        self.combine(other, SlotOp::Mul)
    }

    fn add_plain_inplace(&mut self, plain: &Cleartext) -> Result<(), EvalError> {
        self.combine_plain(plain, SlotOp::Add)
    }

    fn subtract_plain_inplace(&mut self, plain: &Cleartext) -> Result<(), EvalError> {
        self.combine_plain(plain, SlotOp::Sub)
    }

    fn multiply_plain_inplace(&mut self, plain: &Cleartext) -> Result<(), EvalError> {
        self.combine_plain(plain, SlotOp::Mul)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Factory of [`DummyCiphertext`]s with a fixed slot count.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DummyCiphertextFactory {
    slot_count: usize,
}

impl DummyCiphertextFactory {
    /// A factory packing `slot_count` slots (at least one).
    pub fn new(slot_count: usize) -> Self {
        DummyCiphertextFactory {
            slot_count: slot_count.max(1),
        }
    }
}

impl Default for DummyCiphertextFactory {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_COUNT)
    }
}

impl CiphertextFactory for DummyCiphertextFactory {
    fn create_ciphertext(&self, plain: &Cleartext) -> Result<Box<dyn Ciphertext>, EvalError> {
        Ok(Box::new(DummyCiphertext::encode(plain, self.slot_count)?))
    }

    #[allow(clippy::cast_possible_truncation, reason = "float slots were widened from f32")]
    fn decrypt(&self, ciphertext: &dyn Ciphertext) -> Result<Cleartext, EvalError> {
        let ciphertext = DummyCiphertext::downcast(ciphertext)?;
        let take = if ciphertext.broadcast {
            1
        } else {
            ciphertext.slot_count()
        };
        Ok(match (&ciphertext.slots, ciphertext.kind) {
            (Slots::Int(v), PrimitiveKind::Bool) => {
                Cleartext::Bool(v.iter().take(take).map(|&x| x != 0).collect())
            }
            (Slots::Int(v), _) => Cleartext::Int(v.iter().take(take).copied().collect()),
            (Slots::Real(v), PrimitiveKind::Float) => {
                Cleartext::Float(v.iter().take(take).map(|&x| x as f32).collect())
            }
            (Slots::Real(v), _) => Cleartext::Double(v.iter().take(take).copied().collect()),
        })
    }

    fn slot_count(&self) -> usize {
        self.slot_count
    }
}
