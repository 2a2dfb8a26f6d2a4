//! `EvaluatorBuilder` for creating evaluators.

use heco_ir::{Stmt, StmtKind};
use heco_taint::SecretTaintMap;

use super::Evaluator;
use crate::backend::CiphertextFactory;
use crate::errors::{invalid_inputs, EvalError};

/// Builder for [`Evaluator`].
///
/// The factory is mandatory. Without a taint map every node counts as
/// cleartext for the pre-evaluation checks; the runtime checks on actual
/// values still apply.
pub struct EvaluatorBuilder<'a> {
    factory: &'a dyn CiphertextFactory,
    taint: Option<&'a SecretTaintMap>,
    inputs: Option<&'a Stmt>,
}

impl<'a> EvaluatorBuilder<'a> {
    pub fn new(factory: &'a dyn CiphertextFactory) -> Self {
        EvaluatorBuilder {
            factory,
            taint: None,
            inputs: None,
        }
    }

    /// Secret taint of the trees the evaluator will run.
    #[must_use]
    pub fn taint(mut self, taint: &'a SecretTaintMap) -> Self {
        self.taint = Some(taint);
        self
    }

    /// Block of input declarations, evaluated by `build`.
    #[must_use]
    pub fn inputs(mut self, inputs: &'a Stmt) -> Self {
        self.inputs = Some(inputs);
        self
    }

    /// Create the evaluator and populate its stores from the inputs.
    ///
    /// Fails unless the inputs are a `Block` containing only
    /// `VariableDeclaration`s.
    pub fn build(self) -> Result<Evaluator<'a>, EvalError> {
        let mut evaluator = Evaluator::new(self.factory, self.taint);
        if let Some(inputs) = self.inputs {
            let StmtKind::Block(block) = inputs.kind() else {
                return Err(invalid_inputs(&inputs.to_string()));
            };
            if let Some(stmt) = block
                .statements
                .iter()
                .find(|stmt| !matches!(stmt.kind(), StmtKind::VariableDeclaration(_)))
            {
                return Err(invalid_inputs(&stmt.to_string()));
            }
            evaluator.run_root(inputs)?;
        }
        Ok(evaluator)
    }
}
