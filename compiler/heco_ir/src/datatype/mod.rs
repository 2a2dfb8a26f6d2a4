//! Declared datatypes.
//!
//! A datatype is a primitive kind plus the secret flag. The flag decides
//! where a binding lives at runtime: secret identifiers are stored as
//! ciphertexts, everything else as cleartexts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::IrError;

/// Primitive value kinds.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Bool,
    Char,
    Int,
    Float,
    Double,
    String,
}

impl PrimitiveKind {
    /// Keyword spelling (`int`, `double`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
        }
    }

    /// `true` for kinds that support arithmetic.
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Double)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveKind {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" => Ok(Self::Bool),
            "char" => Ok(Self::Char),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "double" => Ok(Self::Double),
            "string" => Ok(Self::String),
            other => Err(IrError::InvalidDatatype(other.to_string())),
        }
    }
}

/// Declared type of an identifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Datatype {
    pub kind: PrimitiveKind,
    pub secret: bool,
}

impl Datatype {
    pub const fn new(kind: PrimitiveKind, secret: bool) -> Self {
        Datatype { kind, secret }
    }

    /// A secret (encrypted) datatype.
    pub const fn secret(kind: PrimitiveKind) -> Self {
        Datatype { kind, secret: true }
    }

    /// A cleartext datatype.
    pub const fn plain(kind: PrimitiveKind) -> Self {
        Datatype {
            kind,
            secret: false,
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secret {
            write!(f, "secret {}", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl FromStr for Datatype {
    type Err = IrError;

    /// Parse `int` or `secret int`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (secret, kind) = match trimmed.strip_prefix("secret") {
            Some(rest) if rest.starts_with(char::is_whitespace) => (true, rest.trim_start()),
            _ => (false, trimmed),
        };
        let kind = kind
            .parse::<PrimitiveKind>()
            .map_err(|_| IrError::InvalidDatatype(s.to_string()))?;
        Ok(Datatype { kind, secret })
    }
}

#[cfg(test)]
mod tests;
