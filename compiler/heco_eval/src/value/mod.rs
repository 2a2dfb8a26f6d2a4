//! Runtime values.
//!
//! Two disjoint domains flow through evaluation: [`Cleartext`] values the
//! evaluator computes on directly, and ciphertexts it can only hand to the
//! backend. Every cleartext is a vector; a scalar is a vector of length one
//! and broadcasts against longer operands.

mod ops;

use std::fmt;

use heco_ir::{Literal, PrimitiveKind};

use crate::backend::Ciphertext;
use crate::errors::{index_out_of_bounds, type_mismatch, EvalError};

pub use ops::{evaluate_binary, evaluate_unary};

/// Longest vector an element write may grow a cleartext to.
pub const MAX_VECTOR_LEN: usize = 1 << 16;

/// A plain value: a homogeneous vector of one primitive kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Cleartext {
    Bool(Vec<bool>),
    Char(Vec<char>),
    Int(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    String(Vec<String>),
}

/// Apply a type-agnostic expression to the element vector, keeping the
/// variant.
macro_rules! map_elements {
    ($value:expr, $v:ident => $body:expr) => {
        match $value {
            Cleartext::Bool($v) => Cleartext::Bool($body),
            Cleartext::Char($v) => Cleartext::Char($body),
            Cleartext::Int($v) => Cleartext::Int($body),
            Cleartext::Float($v) => Cleartext::Float($body),
            Cleartext::Double($v) => Cleartext::Double($body),
            Cleartext::String($v) => Cleartext::String($body),
        }
    };
}

/// Evaluate a type-agnostic expression over the element vector.
macro_rules! with_elements {
    ($value:expr, $v:ident => $body:expr) => {
        match $value {
            Cleartext::Bool($v) => $body,
            Cleartext::Char($v) => $body,
            Cleartext::Int($v) => $body,
            Cleartext::Float($v) => $body,
            Cleartext::Double($v) => $body,
            Cleartext::String($v) => $body,
        }
    };
}

impl Cleartext {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Cleartext::Bool(_) => PrimitiveKind::Bool,
            Cleartext::Char(_) => PrimitiveKind::Char,
            Cleartext::Int(_) => PrimitiveKind::Int,
            Cleartext::Float(_) => PrimitiveKind::Float,
            Cleartext::Double(_) => PrimitiveKind::Double,
            Cleartext::String(_) => PrimitiveKind::String,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn len(&self) -> usize {
        with_elements!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scalar(&self) -> bool {
        self.len() == 1
    }

    /// An empty vector of `kind`.
    pub fn empty(kind: PrimitiveKind) -> Self {
        Self::zeros(kind, 0)
    }

    /// `len` default elements (`0`, `false`, `""`) of `kind`.
    pub fn zeros(kind: PrimitiveKind, len: usize) -> Self {
        match kind {
            PrimitiveKind::Bool => Cleartext::Bool(vec![false; len]),
            PrimitiveKind::Char => Cleartext::Char(vec!['\0'; len]),
            PrimitiveKind::Int => Cleartext::Int(vec![0; len]),
            PrimitiveKind::Float => Cleartext::Float(vec![0.0; len]),
            PrimitiveKind::Double => Cleartext::Double(vec![0.0; len]),
            PrimitiveKind::String => Cleartext::String(vec![String::new(); len]),
        }
    }

    /// The value of a scalar `bool`.
    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Cleartext::Bool(v) if v.len() == 1 => Ok(v[0]),
            other => Err(type_mismatch("bool", &other.describe())),
        }
    }

    /// The value of a scalar `int`, for indices and rotation steps.
    pub fn as_int(&self) -> Result<i64, EvalError> {
        match self {
            Cleartext::Int(v) if v.len() == 1 => Ok(v[0]),
            other => Err(type_mismatch("int", &other.describe())),
        }
    }

    /// Element `index` as a scalar.
    pub fn get(&self, index: i64) -> Result<Cleartext, EvalError> {
        let len = self.len();
        let i = checked_index(index, len)?;
        Ok(map_elements!(self, v => vec![v[i].clone()]))
    }

    /// Overwrite element `index` with the scalar `value`, growing the
    /// vector with default elements if needed, up to [`MAX_VECTOR_LEN`].
    pub fn set(&mut self, index: i64, value: Cleartext) -> Result<(), EvalError> {
        let i = usize::try_from(index)
            .ok()
            .filter(|&i| i < self.len().max(MAX_VECTOR_LEN))
            .ok_or_else(|| index_out_of_bounds(index, self.len()))?;
        if !value.is_scalar() {
            return Err(type_mismatch("a scalar", &value.describe()));
        }
        let value = value.coerce_to(self.kind())?;
        if i >= self.len() {
            self.resize(i + 1);
        }
        match (self, value) {
            (Cleartext::Bool(v), Cleartext::Bool(x)) => v[i] = x[0],
            (Cleartext::Char(v), Cleartext::Char(x)) => v[i] = x[0],
            (Cleartext::Int(v), Cleartext::Int(x)) => v[i] = x[0],
            (Cleartext::Float(v), Cleartext::Float(x)) => v[i] = x[0],
            (Cleartext::Double(v), Cleartext::Double(x)) => v[i] = x[0],
            (Cleartext::String(v), Cleartext::String(mut x)) => v[i] = std::mem::take(&mut x[0]),
            (target, value) => return Err(type_mismatch(target.type_name(), value.type_name())),
        }
        Ok(())
    }

    /// Append `other`, which must have the same kind.
    pub fn extend(&mut self, other: Cleartext) -> Result<(), EvalError> {
        match (self, other) {
            (Cleartext::Bool(v), Cleartext::Bool(x)) => v.extend(x),
            (Cleartext::Char(v), Cleartext::Char(x)) => v.extend(x),
            (Cleartext::Int(v), Cleartext::Int(x)) => v.extend(x),
            (Cleartext::Float(v), Cleartext::Float(x)) => v.extend(x),
            (Cleartext::Double(v), Cleartext::Double(x)) => v.extend(x),
            (Cleartext::String(v), Cleartext::String(x)) => v.extend(x),
            (target, other) => return Err(type_mismatch(target.type_name(), other.type_name())),
        }
        Ok(())
    }

    /// Cyclic shift left by `steps` (right for negative steps).
    #[must_use]
    pub fn rotate(&self, steps: i64) -> Cleartext {
        let len = self.len();
        let shift = rotation_offset(steps, len);
        map_elements!(self, v => {
            let mut out = v.clone();
            out.rotate_left(shift);
            out
        })
    }

    /// Convert to `kind` where the conversion is lossless in intent:
    /// `int` widens to `float`/`double`, `float` to `double`, `bool` to
    /// `int`.
    #[allow(clippy::cast_precision_loss, reason = "int literals widen to floating point")]
    pub fn coerce_to(self, kind: PrimitiveKind) -> Result<Cleartext, EvalError> {
        if self.kind() == kind {
            return Ok(self);
        }
        match (self, kind) {
            (Cleartext::Int(v), PrimitiveKind::Float) => {
                Ok(Cleartext::Float(v.into_iter().map(|x| x as f32).collect()))
            }
            (Cleartext::Int(v), PrimitiveKind::Double) => {
                Ok(Cleartext::Double(v.into_iter().map(|x| x as f64).collect()))
            }
            (Cleartext::Float(v), PrimitiveKind::Double) => {
                Ok(Cleartext::Double(v.into_iter().map(f64::from).collect()))
            }
            (Cleartext::Bool(v), PrimitiveKind::Int) => {
                Ok(Cleartext::Int(v.into_iter().map(i64::from).collect()))
            }
            (other, kind) => Err(type_mismatch(kind.as_str(), other.type_name())),
        }
    }

    fn resize(&mut self, len: usize) {
        match self {
            Cleartext::Bool(v) => v.resize(len, false),
            Cleartext::Char(v) => v.resize(len, '\0'),
            Cleartext::Int(v) => v.resize(len, 0),
            Cleartext::Float(v) => v.resize(len, 0.0),
            Cleartext::Double(v) => v.resize(len, 0.0),
            Cleartext::String(v) => v.resize(len, String::new()),
        }
    }

    /// `int` or `int[3]`, for messages.
    fn describe(&self) -> String {
        if self.is_scalar() {
            self.type_name().to_string()
        } else {
            format!("{}[{}]", self.type_name(), self.len())
        }
    }
}

/// Bounds-checked conversion of a signed index.
fn checked_index(index: i64, len: usize) -> Result<usize, EvalError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| index_out_of_bounds(index, len))
}

/// `steps` reduced into `0..len` for a left rotation.
pub(crate) fn rotation_offset(steps: i64, len: usize) -> usize {
    match i64::try_from(len) {
        Ok(len) if len > 0 => usize::try_from(steps.rem_euclid(len)).unwrap_or(0),
        _ => 0,
    }
}

impl fmt::Display for Cleartext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            if let [single] = items {
                return write!(f, "{single}");
            }
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            f.write_str("]")
        }
        with_elements!(self, v => list(f, v))
    }
}

impl From<&Literal> for Cleartext {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Bool(v) => Cleartext::Bool(vec![*v]),
            Literal::Char(v) => Cleartext::Char(vec![*v]),
            Literal::Int(v) => Cleartext::Int(vec![*v]),
            Literal::Float(v) => Cleartext::Float(vec![*v]),
            Literal::Double(v) => Cleartext::Double(vec![*v]),
            Literal::String(v) => Cleartext::String(vec![v.clone()]),
        }
    }
}

impl From<bool> for Cleartext {
    fn from(v: bool) -> Self {
        Cleartext::Bool(vec![v])
    }
}

impl From<i64> for Cleartext {
    fn from(v: i64) -> Self {
        Cleartext::Int(vec![v])
    }
}

impl From<i32> for Cleartext {
    fn from(v: i32) -> Self {
        Cleartext::Int(vec![i64::from(v)])
    }
}

impl From<f64> for Cleartext {
    fn from(v: f64) -> Self {
        Cleartext::Double(vec![v])
    }
}

impl From<Vec<i64>> for Cleartext {
    fn from(v: Vec<i64>) -> Self {
        Cleartext::Int(v)
    }
}

impl From<Vec<f64>> for Cleartext {
    fn from(v: Vec<f64>) -> Self {
        Cleartext::Double(v)
    }
}

impl From<Vec<bool>> for Cleartext {
    fn from(v: Vec<bool>) -> Self {
        Cleartext::Bool(v)
    }
}

/// A value on the evaluation stack or in a store.
#[derive(Debug)]
pub enum Value {
    Cleartext(Cleartext),
    Ciphertext(Box<dyn Ciphertext>),
}

impl Value {
    pub fn is_ciphertext(&self) -> bool {
        matches!(self, Value::Ciphertext(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Cleartext(cleartext) => cleartext.type_name(),
            Value::Ciphertext(_) => "ciphertext",
        }
    }

    pub fn as_cleartext(&self) -> Option<&Cleartext> {
        match self {
            Value::Cleartext(cleartext) => Some(cleartext),
            Value::Ciphertext(_) => None,
        }
    }

    pub fn as_ciphertext(&self) -> Option<&dyn Ciphertext> {
        match self {
            Value::Ciphertext(ciphertext) => Some(ciphertext.as_ref()),
            Value::Cleartext(_) => None,
        }
    }

    pub fn into_cleartext(self) -> Option<Cleartext> {
        match self {
            Value::Cleartext(cleartext) => Some(cleartext),
            Value::Ciphertext(_) => None,
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Cleartext(cleartext) => Value::Cleartext(cleartext.clone()),
            Value::Ciphertext(ciphertext) => Value::Ciphertext(ciphertext.clone_ciphertext()),
        }
    }
}

impl From<Cleartext> for Value {
    fn from(cleartext: Cleartext) -> Self {
        Value::Cleartext(cleartext)
    }
}

impl From<Box<dyn Ciphertext>> for Value {
    fn from(ciphertext: Box<dyn Ciphertext>) -> Self {
        Value::Ciphertext(ciphertext)
    }
}
