//! Operators
//!
//! One closed enumeration shared by `BinaryExpression`, `UnaryExpression`
//! and `OperatorExpression`. Which operators are legal in which position is
//! checked where the operator is used (the evaluator rejects `!` as a
//! binary operator, `+` as a unary one).
//!
//! The `Fhe*` variants are produced by rewriting once an operand is known
//! to be secret; they evaluate exactly like their plain counterparts.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Operators of the heco language.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Operator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Logical
    LogicalAnd,
    LogicalOr,
    LogicalNot,

    // Comparison
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,

    // Bitwise
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseNot,

    // Homomorphic
    FheAdd,
    FheSub,
    FheMul,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Operator; 21] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::LogicalAnd,
        Self::LogicalOr,
        Self::LogicalNot,
        Self::Less,
        Self::LessEqual,
        Self::Greater,
        Self::GreaterEqual,
        Self::Equal,
        Self::NotEqual,
        Self::BitwiseAnd,
        Self::BitwiseOr,
        Self::BitwiseXor,
        Self::BitwiseNot,
        Self::FheAdd,
        Self::FheSub,
        Self::FheMul,
    ];

    /// Source-level symbol, also the JSON encoding.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
            Self::LogicalNot => "!",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::BitwiseAnd => "&",
            Self::BitwiseOr => "|",
            Self::BitwiseXor => "^",
            Self::BitwiseNot => "~",
            Self::FheAdd => "fhe+",
            Self::FheSub => "fhe-",
            Self::FheMul => "fhe*",
        }
    }

    /// Human-readable name used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "addition",
            Self::Sub => "subtraction",
            Self::Mul => "multiplication",
            Self::Div => "division",
            Self::Mod => "modulo",
            Self::LogicalAnd => "logical and",
            Self::LogicalOr => "logical or",
            Self::LogicalNot => "logical not",
            Self::Less => "less",
            Self::LessEqual => "less or equal",
            Self::Greater => "greater",
            Self::GreaterEqual => "greater or equal",
            Self::Equal => "equal",
            Self::NotEqual => "not equal",
            Self::BitwiseAnd => "bitwise and",
            Self::BitwiseOr => "bitwise or",
            Self::BitwiseXor => "bitwise xor",
            Self::BitwiseNot => "bitwise not",
            Self::FheAdd => "fhe addition",
            Self::FheSub => "fhe subtraction",
            Self::FheMul => "fhe multiplication",
        }
    }

    /// Parse either the symbol (`"/"`) or the name (`"division"`).
    pub fn from_symbol(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_symbol() == text || op.name() == text)
    }

    /// `true` for operators that take a single operand.
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::LogicalNot | Self::BitwiseNot)
    }

    /// `true` if `a op b == b op a`.
    pub const fn is_commutative(self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::Mul
                | Self::LogicalAnd
                | Self::LogicalOr
                | Self::Equal
                | Self::NotEqual
                | Self::BitwiseAnd
                | Self::BitwiseOr
                | Self::BitwiseXor
                | Self::FheAdd
                | Self::FheMul
        )
    }

    /// `true` if the operator can be executed with a ciphertext operand.
    pub const fn is_fhe_compatible(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::FheAdd | Self::FheSub | Self::FheMul
        )
    }

    /// The homomorphic variant of a plain arithmetic operator.
    pub const fn to_fhe(self) -> Option<Self> {
        match self {
            Self::Add => Some(Self::FheAdd),
            Self::Sub => Some(Self::FheSub),
            Self::Mul => Some(Self::FheMul),
            _ => None,
        }
    }

    /// The plain operator a homomorphic variant computes.
    pub const fn to_plain(self) -> Self {
        match self {
            Self::FheAdd => Self::Add,
            Self::FheSub => Self::Sub,
            Self::FheMul => Self::Mul,
            other => other,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_symbol())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Operator::from_symbol(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown operator `{text}`")))
    }
}
