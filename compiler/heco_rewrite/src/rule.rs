//! The rule contract.

use std::fmt;

use heco_ir::{Expr, NodeId, NodeRef, Stmt};
use heco_taint::SecretTaintMap;

use crate::rules::{FheOperatorLowering, SecretBranchElimination};
use crate::RewriteError;

/// Result of offering a node to a rule.
///
/// `NotApplicable` hands the node back untouched; it is an ordinary
/// outcome, not an error.
#[derive(Debug)]
pub enum RewriteOutcome<T> {
    Rewritten(T),
    NotApplicable(T),
}

impl<T> RewriteOutcome<T> {
    pub fn is_rewritten(&self) -> bool {
        matches!(self, RewriteOutcome::Rewritten(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            RewriteOutcome::Rewritten(node) | RewriteOutcome::NotApplicable(node) => node,
        }
    }
}

/// State a rule may read and update: the taint facts.
///
/// Nodes a rule creates must get a fact, either inherited from the node
/// they were cloned from or recomputed from their children.
pub struct RewriteContext<'a> {
    taint: &'a mut SecretTaintMap,
}

impl<'a> RewriteContext<'a> {
    pub fn new(taint: &'a mut SecretTaintMap) -> Self {
        RewriteContext { taint }
    }

    #[inline]
    pub fn is_secret(&self, id: NodeId) -> bool {
        self.taint.is_secret(id)
    }

    pub fn mark(&mut self, id: NodeId, secret: bool) {
        self.taint.insert(id, secret);
    }

    /// Give every node of `copy` the fact of its counterpart in `original`.
    ///
    /// The two trees must have the same shape (a `clone_tree` result).
    pub fn inherit(&mut self, original: NodeRef<'_>, copy: NodeRef<'_>) {
        for (from, to) in original.preorder_ids().into_iter().zip(copy.preorder_ids()) {
            let secret = self.taint.is_secret(from);
            self.taint.insert(to, secret);
        }
    }

    /// Fresh copy of `expr` carrying the same facts.
    pub fn clone_expr(&mut self, expr: &Expr) -> Expr {
        let copy = expr.clone_tree(false);
        self.inherit(NodeRef::Expr(expr), NodeRef::Expr(&copy));
        copy
    }

    /// Mark `expr` secret iff any direct child is.
    pub fn recompute(&mut self, expr: &Expr) -> bool {
        let secret = expr.children().iter().any(|child| self.taint.is_secret(child.id()));
        self.taint.insert(expr.id(), secret);
        secret
    }
}

/// A rewrite rule.
///
/// Both hooks default to `NotApplicable`; a rule overrides the family it
/// handles. Rules see a node after its children have been rewritten.
pub trait RewriteRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn rewrite_expr(
        &self,
        expr: Expr,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<RewriteOutcome<Expr>, RewriteError> {
        let _ = ctx;
        Ok(RewriteOutcome::NotApplicable(expr))
    }

    fn rewrite_stmt(
        &self,
        stmt: Stmt,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<RewriteOutcome<Stmt>, RewriteError> {
        let _ = ctx;
        Ok(RewriteOutcome::NotApplicable(stmt))
    }
}

/// Ordered collection of rules; earlier rules are tried first.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn RewriteRule>>,
}

impl RuleSet {
    /// No rules: only the unsupported-shape check runs.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in rules.
    pub fn standard() -> Self {
        let mut rules = Self::empty();
        rules
            .register(SecretBranchElimination)
            .register(FheOperatorLowering);
        rules
    }

    pub fn register(&mut self, rule: impl RewriteRule + 'static) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    #[must_use]
    pub fn with(mut self, rule: impl RewriteRule + 'static) -> Self {
        self.register(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.name())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &dyn RewriteRule> {
        self.rules.iter().map(AsRef::as_ref)
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
