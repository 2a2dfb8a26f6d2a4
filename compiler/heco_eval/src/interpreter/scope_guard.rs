//! RAII scope guard for the evaluator.
//!
//! Blocks and loops open a lexical scope for their duration. The guard
//! returns to the enclosing scope when dropped, including on early return
//! through `?`.

use std::ops::{Deref, DerefMut};

use heco_ir::NodeId;

use super::Evaluator;

/// Evaluator borrowed for the lifetime of one nested scope.
pub(crate) struct ScopedEvaluator<'guard, 'a> {
    evaluator: &'guard mut Evaluator<'a>,
}

impl Drop for ScopedEvaluator<'_, '_> {
    fn drop(&mut self) {
        // Entered in `scoped`, so never the root.
        let _ = self.evaluator.scopes.exit();
    }
}

impl<'a> Deref for ScopedEvaluator<'_, 'a> {
    type Target = Evaluator<'a>;

    fn deref(&self) -> &Self::Target {
        self.evaluator
    }
}

impl DerefMut for ScopedEvaluator<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.evaluator
    }
}

impl<'a> Evaluator<'a> {
    /// Enter the scope opened by `opener` until the guard is dropped.
    ///
    /// Values bound in a previous entry of the same scope are dropped.
    pub(crate) fn scoped(&mut self, opener: NodeId) -> ScopedEvaluator<'_, 'a> {
        let scope = self.scopes.enter(opener);
        self.declared_ciphertexts.retain(|id, _| id.scope != scope);
        self.declared_cleartexts.retain(|id, _| id.scope != scope);
        self.identifier_datatypes.retain(|id, _| id.scope != scope);
        ScopedEvaluator { evaluator: self }
    }
}
