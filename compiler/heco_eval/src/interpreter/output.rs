//! Output extraction.

use std::fmt::Write as _;

use heco_ir::{Expr, ExprKind, NodeRef, ScopeId, Stmt, StmtKind};
use heco_stack::ensure_sufficient_stack;

use super::Evaluator;
use crate::errors::{invalid_assignment_target, invalid_outputs, nested_index_access, EvalError};
use crate::value::{Cleartext, Value};

/// One named output value.
pub type Output = (String, Value);

impl Evaluator<'_> {
    /// Evaluate the output assignments against the global scope.
    ///
    /// `outputs` must be a `Block` of `Assignment`s with a `Variable` or
    /// `IndexAccess` target; each target's rendering names the output.
    /// Every assignment is checked before any is evaluated, so a rejected
    /// output yields no partial result.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn get_output(&mut self, outputs: &Stmt) -> Result<Vec<Output>, EvalError> {
        let StmtKind::Block(block) = outputs.kind() else {
            return Err(invalid_outputs(&outputs.to_string()));
        };
        let mut pending = Vec::with_capacity(block.statements.len());
        for stmt in &block.statements {
            let Some(assignment) = stmt.as_assignment() else {
                return Err(invalid_outputs(&stmt.to_string()));
            };
            let target = assignment.target()?;
            if !matches!(target.kind(), ExprKind::Variable(_) | ExprKind::IndexAccess(_)) {
                return Err(invalid_assignment_target(&target.to_string()));
            }
            let value = assignment.value()?;
            if has_nested_index_access(value) {
                return Err(nested_index_access(&value.to_string()));
            }
            pending.push((target.to_string(), value));
        }

        self.scopes.set_current(ScopeId::ROOT);
        let mut values = Vec::with_capacity(pending.len());
        for (name, value) in pending {
            values.push((name, self.eval_expr(value)?));
        }
        Ok(values)
    }

    /// Plain form of a value, decrypting ciphertexts.
    pub fn decrypt(&self, value: &Value) -> Result<Cleartext, EvalError> {
        match value {
            Value::Cleartext(cleartext) => Ok(cleartext.clone()),
            Value::Ciphertext(ciphertext) => self.factory.decrypt(ciphertext.as_ref()),
        }
    }

    pub fn render_value(&self, value: &Value) -> Result<String, EvalError> {
        match value {
            Value::Cleartext(cleartext) => Ok(cleartext.to_string()),
            Value::Ciphertext(ciphertext) => self.factory.render(ciphertext.as_ref()),
        }
    }

    /// `name: value` lines, one per output.
    pub fn render_output(&self, outputs: &[Output]) -> Result<String, EvalError> {
        let mut rendered = String::new();
        for (name, value) in outputs {
            let _ = writeln!(rendered, "{name}: {}", self.render_value(value)?);
        }
        Ok(rendered)
    }

    pub fn print_output(&self, outputs: &[Output]) -> Result<(), EvalError> {
        print!("{}", self.render_output(outputs)?);
        Ok(())
    }
}

/// `true` if an index access appears inside the target or index of
/// another one (`v[k[2]]`, `m[0][1]`).
fn has_nested_index_access(expr: &Expr) -> bool {
    ensure_sufficient_stack(|| match expr.as_index_access() {
        Some(access) => access
            .target
            .iter()
            .chain(access.index.iter())
            .any(|child| contains_index_access(child)),
        None => expr
            .children()
            .into_iter()
            .filter_map(NodeRef::as_expr)
            .any(has_nested_index_access),
    })
}

fn contains_index_access(expr: &Expr) -> bool {
    ensure_sufficient_stack(|| {
        expr.as_index_access().is_some()
            || expr
                .children()
                .into_iter()
                .filter_map(NodeRef::as_expr)
                .any(contains_index_access)
    })
}
