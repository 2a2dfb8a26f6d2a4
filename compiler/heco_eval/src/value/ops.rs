//! Cleartext operator semantics.
//!
//! Operations are element-wise; a scalar operand broadcasts against a
//! vector. Mixed numeric operands promote along `bool < int < float <
//! double`. Integer arithmetic is checked.

use std::ops::{Add, Div, Mul, Rem, Sub};

use heco_ir::{Operator, PrimitiveKind};

use super::Cleartext;
use crate::errors::{
    division_by_zero, integer_overflow, invalid_operator_for, length_mismatch, modulo_by_zero,
    type_mismatch, unknown_unary_operator, EvalError,
};

/// Apply a binary operator to two cleartexts.
///
/// Homomorphic operators compute the same values as their plain
/// counterparts.
pub fn evaluate_binary(
    operator: Operator,
    left: &Cleartext,
    right: &Cleartext,
) -> Result<Cleartext, EvalError> {
    let operator = operator.to_plain();
    let len = broadcast_len(left.len(), right.len())?;
    match (left, right) {
        (Cleartext::Bool(l), Cleartext::Bool(r))
            if !is_arithmetic(operator) && !is_ordering(operator) =>
        {
            bool_op(operator, l, r, len)
        }
        (Cleartext::Char(l), Cleartext::Char(r)) => {
            if is_comparison(operator) {
                Ok(Cleartext::Bool(zip_with(l, r, len, |a, b| Ok(compare(operator, a, b)))?))
            } else {
                Err(invalid_operator_for(operator, "char"))
            }
        }
        (Cleartext::String(l), Cleartext::String(r)) => string_op(operator, l, r, len),
        _ => {
            let kind = numeric_target(left.kind(), right.kind())?;
            let left = promote(left.clone(), kind)?;
            let right = promote(right.clone(), kind)?;
            match (&left, &right) {
                (Cleartext::Int(l), Cleartext::Int(r)) => int_op(operator, l, r, len),
                (Cleartext::Float(l), Cleartext::Float(r)) => {
                    float_op(operator, l, r, len, "float", Cleartext::Float)
                }
                (Cleartext::Double(l), Cleartext::Double(r)) => {
                    float_op(operator, l, r, len, "double", Cleartext::Double)
                }
                _ => Err(type_mismatch(left.type_name(), right.type_name())),
            }
        }
    }
}

/// Apply a unary operator: `!` on bools, `~` on ints and bools.
pub fn evaluate_unary(operator: Operator, operand: &Cleartext) -> Result<Cleartext, EvalError> {
    match (operator, operand) {
        (Operator::LogicalNot | Operator::BitwiseNot, Cleartext::Bool(v)) => {
            Ok(Cleartext::Bool(v.iter().map(|b| !b).collect()))
        }
        (Operator::BitwiseNot, Cleartext::Int(v)) => {
            Ok(Cleartext::Int(v.iter().map(|x| !x).collect()))
        }
        (op, other) if op.is_unary() => Err(invalid_operator_for(op, other.type_name())),
        (op, _) => Err(unknown_unary_operator(op)),
    }
}

fn is_arithmetic(operator: Operator) -> bool {
    matches!(
        operator,
        Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Mod
    )
}

fn is_ordering(operator: Operator) -> bool {
    matches!(
        operator,
        Operator::Less | Operator::LessEqual | Operator::Greater | Operator::GreaterEqual
    )
}

fn is_comparison(operator: Operator) -> bool {
    is_ordering(operator) || matches!(operator, Operator::Equal | Operator::NotEqual)
}

/// Result length of an element-wise operation.
fn broadcast_len(left: usize, right: usize) -> Result<usize, EvalError> {
    match (left, right) {
        (l, r) if l == r => Ok(l),
        (1, r) => Ok(r),
        (l, 1) => Ok(l),
        (l, r) => Err(length_mismatch(l, r)),
    }
}

fn pick<T>(values: &[T], i: usize) -> &T {
    if values.len() == 1 {
        &values[0]
    } else {
        &values[i]
    }
}

fn zip_with<T, U>(
    left: &[T],
    right: &[T],
    len: usize,
    mut f: impl FnMut(&T, &T) -> Result<U, EvalError>,
) -> Result<Vec<U>, EvalError> {
    (0..len).map(|i| f(pick(left, i), pick(right, i))).collect()
}

fn compare<T: PartialOrd>(operator: Operator, a: &T, b: &T) -> bool {
    match operator {
        Operator::Less => a < b,
        Operator::LessEqual => a <= b,
        Operator::Greater => a > b,
        Operator::GreaterEqual => a >= b,
        Operator::Equal => a == b,
        Operator::NotEqual => a != b,
        _ => false,
    }
}

fn rank(kind: PrimitiveKind) -> Option<u8> {
    match kind {
        PrimitiveKind::Bool => Some(0),
        PrimitiveKind::Int => Some(1),
        PrimitiveKind::Float => Some(2),
        PrimitiveKind::Double => Some(3),
        PrimitiveKind::Char | PrimitiveKind::String => None,
    }
}

/// Common kind for two numeric operands; two bools meet at `int`.
fn numeric_target(left: PrimitiveKind, right: PrimitiveKind) -> Result<PrimitiveKind, EvalError> {
    match (rank(left), rank(right)) {
        (Some(l), Some(r)) => {
            let widest = if l >= r { left } else { right };
            Ok(if widest == PrimitiveKind::Bool {
                PrimitiveKind::Int
            } else {
                widest
            })
        }
        _ => Err(type_mismatch(left.as_str(), right.as_str())),
    }
}

fn promote(value: Cleartext, kind: PrimitiveKind) -> Result<Cleartext, EvalError> {
    if value.kind() == PrimitiveKind::Bool && kind != PrimitiveKind::Bool {
        value.coerce_to(PrimitiveKind::Int)?.coerce_to(kind)
    } else {
        value.coerce_to(kind)
    }
}

fn bool_op(operator: Operator, l: &[bool], r: &[bool], len: usize) -> Result<Cleartext, EvalError> {
    let f: fn(bool, bool) -> bool = match operator {
        Operator::LogicalAnd | Operator::BitwiseAnd => |a, b| a && b,
        Operator::LogicalOr | Operator::BitwiseOr => |a, b| a || b,
        Operator::BitwiseXor | Operator::NotEqual => |a, b| a != b,
        Operator::Equal => |a, b| a == b,
        other => return Err(invalid_operator_for(other, "bool")),
    };
    Ok(Cleartext::Bool(zip_with(l, r, len, |&a, &b| Ok(f(a, b)))?))
}

fn int_op(operator: Operator, l: &[i64], r: &[i64], len: usize) -> Result<Cleartext, EvalError> {
    if is_comparison(operator) {
        return Ok(Cleartext::Bool(zip_with(l, r, len, |a, b| {
            Ok(compare(operator, a, b))
        })?));
    }
    let name = operator.name();
    let overflow = || integer_overflow(name);
    let values = match operator {
        Operator::Add => zip_with(l, r, len, |a, b| a.checked_add(*b).ok_or_else(overflow))?,
        Operator::Sub => zip_with(l, r, len, |a, b| a.checked_sub(*b).ok_or_else(overflow))?,
        Operator::Mul => zip_with(l, r, len, |a, b| a.checked_mul(*b).ok_or_else(overflow))?,
        Operator::Div => zip_with(l, r, len, |a, b| {
            if *b == 0 {
                return Err(division_by_zero());
            }
            a.checked_div(*b).ok_or_else(overflow)
        })?,
        Operator::Mod => zip_with(l, r, len, |a, b| {
            if *b == 0 {
                return Err(modulo_by_zero());
            }
            a.checked_rem(*b).ok_or_else(overflow)
        })?,
        Operator::BitwiseAnd => zip_with(l, r, len, |a, b| Ok(a & b))?,
        Operator::BitwiseOr => zip_with(l, r, len, |a, b| Ok(a | b))?,
        Operator::BitwiseXor => zip_with(l, r, len, |a, b| Ok(a ^ b))?,
        other => return Err(invalid_operator_for(other, "int")),
    };
    Ok(Cleartext::Int(values))
}

fn float_op<T>(
    operator: Operator,
    l: &[T],
    r: &[T],
    len: usize,
    type_name: &str,
    wrap: fn(Vec<T>) -> Cleartext,
) -> Result<Cleartext, EvalError>
where
    T: Copy
        + Default
        + PartialOrd
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<Output = T>
        + Div<Output = T>
        + Rem<Output = T>,
{
    if is_comparison(operator) {
        return Ok(Cleartext::Bool(zip_with(l, r, len, |a, b| {
            Ok(compare(operator, a, b))
        })?));
    }
    let zero = T::default();
    let values = match operator {
        Operator::Add => zip_with(l, r, len, |&a, &b| Ok(a + b))?,
        Operator::Sub => zip_with(l, r, len, |&a, &b| Ok(a - b))?,
        Operator::Mul => zip_with(l, r, len, |&a, &b| Ok(a * b))?,
        Operator::Div => zip_with(l, r, len, |&a, &b| {
            if b == zero {
                Err(division_by_zero())
            } else {
                Ok(a / b)
            }
        })?,
        Operator::Mod => zip_with(l, r, len, |&a, &b| {
            if b == zero {
                Err(modulo_by_zero())
            } else {
                Ok(a % b)
            }
        })?,
        other => return Err(invalid_operator_for(other, type_name)),
    };
    Ok(wrap(values))
}

fn string_op(operator: Operator, l: &[String], r: &[String], len: usize) -> Result<Cleartext, EvalError> {
    if is_comparison(operator) {
        return Ok(Cleartext::Bool(zip_with(l, r, len, |a, b| {
            Ok(compare(operator, a, b))
        })?));
    }
    match operator {
        Operator::Add => Ok(Cleartext::String(zip_with(l, r, len, |a, b| {
            Ok(format!("{a}{b}"))
        })?)),
        other => Err(invalid_operator_for(other, "string")),
    }
}
