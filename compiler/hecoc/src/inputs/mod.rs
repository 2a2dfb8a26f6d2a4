//! Named program inputs.
//!
//! Inputs become the `Block` of `VariableDeclaration`s the evaluator is
//! initialized with. A fresh block is built for every run, so no node id is
//! shared between runs.
//!
//! The JSON form is an array of declarations:
//!
//! ```text
//! [
//!   { "name": "a", "type": "secret int", "value": 3 },
//!   { "name": "v", "type": "int", "value": [1, 2, 3] }
//! ]
//! ```

use serde::Deserialize;
use serde_json::Value as Json;

use heco_eval::Cleartext;
use heco_ir::{Datatype, Expr, Literal, PrimitiveKind, Stmt};

use crate::ExecError;

/// One declared input.
#[derive(Clone, Debug, PartialEq)]
pub struct Input {
    pub name: String,
    pub datatype: Datatype,
    pub value: Cleartext,
}

/// Ordered set of inputs for one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inputs {
    entries: Vec<Input>,
}

#[derive(Deserialize)]
struct RawInput {
    name: String,
    #[serde(rename = "type")]
    datatype: String,
    value: Json,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input; a later input with the same name replaces the earlier
    /// one.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, datatype: Datatype, value: impl Into<Cleartext>) -> Self {
        self.insert(name, datatype, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, datatype: Datatype, value: impl Into<Cleartext>) {
        let input = Input {
            name: name.into(),
            datatype,
            value: value.into(),
        };
        match self.entries.iter_mut().find(|entry| entry.name == input.name) {
            Some(entry) => *entry = input,
            None => self.entries.push(input),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Input> {
        self.entries.iter()
    }

    /// Decode the JSON array form.
    pub fn from_json(text: &str) -> Result<Self, ExecError> {
        let raw: Vec<RawInput> = serde_json::from_str(text)?;
        let mut inputs = Inputs::new();
        for input in raw {
            let datatype: Datatype = input
                .datatype
                .parse()
                .map_err(|err: heco_ir::IrError| ExecError::invalid_input(&input.name, err.to_string()))?;
            let value = decode_value(datatype.kind, &input.value)
                .map_err(|reason| ExecError::invalid_input(&input.name, reason))?;
            inputs.insert(input.name, datatype, value);
        }
        Ok(inputs)
    }

    /// `Block[VariableDeclaration(datatype, name, value)...]` under fresh
    /// ids.
    pub fn to_block(&self) -> Result<Stmt, ExecError> {
        let declarations = self
            .entries
            .iter()
            .map(|input| {
                let value = initializer(&input.value)
                    .ok_or_else(|| ExecError::invalid_input(&input.name, "empty vector"))?;
                Ok(Stmt::declaration(input.datatype, input.name.clone(), Some(value)))
            })
            .collect::<Result<Vec<_>, ExecError>>()?;
        Ok(Stmt::block(declarations))
    }
}

/// Literal for a scalar, `ExpressionList` for a vector.
fn initializer(value: &Cleartext) -> Option<Expr> {
    let mut literals: Vec<Literal> = match value {
        Cleartext::Bool(v) => v.iter().copied().map(Literal::Bool).collect(),
        Cleartext::Char(v) => v.iter().copied().map(Literal::Char).collect(),
        Cleartext::Int(v) => v.iter().copied().map(Literal::Int).collect(),
        Cleartext::Float(v) => v.iter().copied().map(Literal::Float).collect(),
        Cleartext::Double(v) => v.iter().copied().map(Literal::Double).collect(),
        Cleartext::String(v) => v.iter().cloned().map(Literal::String).collect(),
    };
    match literals.len() {
        0 => None,
        1 => literals.pop().map(Expr::literal),
        _ => Some(Expr::list(literals.into_iter().map(Expr::literal).collect())),
    }
}

#[allow(clippy::cast_possible_truncation, reason = "float inputs are declared f32")]
fn decode_value(kind: PrimitiveKind, json: &Json) -> Result<Cleartext, String> {
    let elements: Vec<&Json> = match json {
        Json::Array(items) => items.iter().collect(),
        scalar => vec![scalar],
    };
    if elements.is_empty() {
        return Err("empty vector".to_string());
    }
    let mismatch = |element: &Json| format!("expected {kind}, found `{element}`");
    Ok(match kind {
        PrimitiveKind::Bool => Cleartext::Bool(
            elements
                .iter()
                .copied()
                .map(|e| e.as_bool().ok_or_else(|| mismatch(e)))
                .collect::<Result<_, _>>()?,
        ),
        PrimitiveKind::Char => Cleartext::Char(
            elements
                .iter()
                .copied()
                .map(|e| single_char(e).ok_or_else(|| mismatch(e)))
                .collect::<Result<_, _>>()?,
        ),
        PrimitiveKind::Int => Cleartext::Int(
            elements
                .iter()
                .copied()
                .map(|e| e.as_i64().ok_or_else(|| mismatch(e)))
                .collect::<Result<_, _>>()?,
        ),
        PrimitiveKind::Float => Cleartext::Float(
            elements
                .iter()
                .copied()
                .map(|e| e.as_f64().map(|x| x as f32).ok_or_else(|| mismatch(e)))
                .collect::<Result<_, _>>()?,
        ),
        PrimitiveKind::Double => Cleartext::Double(
            elements
                .iter()
                .copied()
                .map(|e| e.as_f64().ok_or_else(|| mismatch(e)))
                .collect::<Result<_, _>>()?,
        ),
        PrimitiveKind::String => Cleartext::String(
            elements
                .iter()
                .copied()
                .map(|e| e.as_str().map(str::to_string).ok_or_else(|| mismatch(e)))
                .collect::<Result<_, _>>()?,
        ),
    })
}

fn single_char(json: &Json) -> Option<char> {
    let mut chars = json.as_str()?.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

#[cfg(test)]
mod tests;
