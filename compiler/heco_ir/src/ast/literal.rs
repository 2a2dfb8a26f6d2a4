use std::fmt;

use crate::PrimitiveKind;

/// A constant value in source.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Bool(bool),
    Char(char),
    Int(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl Literal {
    pub const fn kind(&self) -> PrimitiveKind {
        match self {
            Literal::Bool(_) => PrimitiveKind::Bool,
            Literal::Char(_) => PrimitiveKind::Char,
            Literal::Int(_) => PrimitiveKind::Int,
            Literal::Float(_) => PrimitiveKind::Float,
            Literal::Double(_) => PrimitiveKind::Double,
            Literal::String(_) => PrimitiveKind::String,
        }
    }

    pub const fn node_type(&self) -> &'static str {
        match self {
            Literal::Bool(_) => "LiteralBool",
            Literal::Char(_) => "LiteralChar",
            Literal::Int(_) => "LiteralInt",
            Literal::Float(_) => "LiteralFloat",
            Literal::Double(_) => "LiteralDouble",
            Literal::String(_) => "LiteralString",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Char(v) => write!(f, "'{v}'"),
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v}f"),
            Literal::Double(v) => write!(f, "{v:?}"),
            Literal::String(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Bool(v)
    }
}

impl From<char> for Literal {
    fn from(v: char) -> Self {
        Literal::Char(v)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Int(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Int(i64::from(v))
    }
}

impl From<f32> for Literal {
    fn from(v: f32) -> Self {
        Literal::Float(v)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Double(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::String(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::String(v)
    }
}
