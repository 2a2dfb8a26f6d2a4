//! The taint visitor.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use heco_ir::visitor::{walk_expr, walk_stmt};
use heco_ir::{
    Assignment, BinaryExpression, Block, Call, Datatype, Expr, ExpressionList, For, Function, If,
    IndexAccess, Literal, NodeId, OperatorExpression, Return, ScopeId, ScopeTree, ScopedIdentifier,
    Stmt, StmtKind, UnaryExpression, Variable, VariableDeclaration, Visitor, While,
};

use crate::{SecretTaintMap, TaintError};

/// One analysis session.
///
/// Inputs, program and outputs of one execution are analyzed by the same
/// session, in that order, so that later trees resolve names declared by
/// earlier ones. The top-level block of each tree runs in the global
/// scope.
#[derive(Debug, Default)]
pub struct TaintAnalysis {
    scopes: ScopeTree,
    datatypes: FxHashMap<ScopedIdentifier, Datatype>,
    taint: SecretTaintMap,
}

impl TaintAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze the block of input declarations.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn analyze_inputs(&mut self, inputs: &Stmt) -> Result<(), TaintError> {
        self.analyze_root(inputs)
    }

    /// Analyze the program body.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn analyze(&mut self, program: &Stmt) -> Result<(), TaintError> {
        self.analyze_root(program)
    }

    /// Analyze the block of output assignments.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn analyze_outputs(&mut self, outputs: &Stmt) -> Result<(), TaintError> {
        self.analyze_root(outputs)
    }

    pub fn taint(&self) -> &SecretTaintMap {
        &self.taint
    }

    /// Datatype of `name` as visible from the global scope.
    pub fn datatype_in_root(&self, name: &str) -> Option<Datatype> {
        let id = self.scopes.resolve_in_root(name).ok()?;
        self.datatypes.get(&id).copied()
    }

    pub fn finish(self) -> SecretTaintMap {
        debug!(
            nodes = self.taint.len(),
            secret = self.taint.secret_count(),
            "taint analysis complete"
        );
        self.taint
    }

    fn analyze_root(&mut self, root: &Stmt) -> Result<(), TaintError> {
        self.scopes.set_current(ScopeId::ROOT);
        match root.kind() {
            StmtKind::Block(block) => {
                for stmt in &block.statements {
                    stmt.accept(self)?;
                }
                self.mark_any(root.id(), block.statements.iter().map(Stmt::id));
                Ok(())
            }
            _ => root.accept(self),
        }
    }

    fn mark(&mut self, id: NodeId, secret: bool) {
        trace!(%id, secret, "taint");
        self.taint.insert(id, secret);
    }

    fn mark_any(&mut self, id: NodeId, children: impl IntoIterator<Item = NodeId>) {
        let secret = children.into_iter().any(|child| self.taint.is_secret(child));
        self.mark(id, secret);
    }

    fn mark_from_children(&mut self, expr: &Expr) {
        let children: Vec<NodeId> = expr.children().into_iter().map(|child| child.id()).collect();
        self.mark_any(expr.id(), children);
    }

    fn declared_secret(&self, name: &str) -> Result<bool, TaintError> {
        let id = self.scopes.resolve(name)?;
        Ok(self.datatypes.get(&id).is_some_and(|datatype| datatype.secret))
    }

    fn scoped<R>(
        &mut self,
        opener: NodeId,
        f: impl FnOnce(&mut Self) -> Result<R, TaintError>,
    ) -> Result<R, TaintError> {
        self.scopes.enter(opener);
        let result = f(self);
        self.scopes.exit()?;
        result
    }
}

impl<'ast> Visitor<'ast> for TaintAnalysis {
    type Error = TaintError;

    fn visit_literal(&mut self, expr: &'ast Expr, _: &'ast Literal) -> Result<(), TaintError> {
        self.mark(expr.id(), false);
        Ok(())
    }

    fn visit_variable(&mut self, expr: &'ast Expr, variable: &'ast Variable) -> Result<(), TaintError> {
        let secret = self.declared_secret(&variable.identifier)?;
        self.mark(expr.id(), secret);
        Ok(())
    }

    fn visit_binary(&mut self, expr: &'ast Expr, _: &'ast BinaryExpression) -> Result<(), TaintError> {
        walk_expr(self, expr)?;
        self.mark_from_children(expr);
        Ok(())
    }

    fn visit_unary(&mut self, expr: &'ast Expr, _: &'ast UnaryExpression) -> Result<(), TaintError> {
        walk_expr(self, expr)?;
        self.mark_from_children(expr);
        Ok(())
    }

    fn visit_index_access(&mut self, expr: &'ast Expr, _: &'ast IndexAccess) -> Result<(), TaintError> {
        walk_expr(self, expr)?;
        self.mark_from_children(expr);
        Ok(())
    }

    fn visit_expression_list(&mut self, expr: &'ast Expr, _: &'ast ExpressionList) -> Result<(), TaintError> {
        walk_expr(self, expr)?;
        self.mark_from_children(expr);
        Ok(())
    }

    fn visit_operator_expression(
        &mut self,
        expr: &'ast Expr,
        _: &'ast OperatorExpression,
    ) -> Result<(), TaintError> {
        walk_expr(self, expr)?;
        self.mark_from_children(expr);
        Ok(())
    }

    fn visit_block(&mut self, stmt: &'ast Stmt, block: &'ast Block) -> Result<(), TaintError> {
        self.scoped(stmt.id(), |this| walk_stmt(this, stmt))?;
        self.mark_any(stmt.id(), block.statements.iter().map(Stmt::id));
        Ok(())
    }

    fn visit_assignment(&mut self, stmt: &'ast Stmt, assignment: &'ast Assignment) -> Result<(), TaintError> {
        walk_stmt(self, stmt)?;
        let target = assignment.target()?;
        let value = assignment.value()?;
        let base = target
            .base_variable()
            .ok_or_else(|| TaintError::InvalidTarget(target.to_string()))?;

        let value_secret = self.taint.is_secret(value.id());
        if value_secret && !self.declared_secret(&base.identifier)? {
            return Err(TaintError::SecretToCleartext {
                target: target.to_string(),
                value: value.to_string(),
            });
        }
        self.mark(stmt.id(), value_secret);
        Ok(())
    }

    fn visit_variable_declaration(
        &mut self,
        stmt: &'ast Stmt,
        decl: &'ast VariableDeclaration,
    ) -> Result<(), TaintError> {
        walk_stmt(self, stmt)?;
        if let Some(value) = decl.value.as_deref() {
            if self.taint.is_secret(value.id()) && !decl.datatype.secret {
                return Err(TaintError::SecretToCleartext {
                    target: decl.identifier.clone(),
                    value: value.to_string(),
                });
            }
        }
        let id = self.scopes.declare(&decl.identifier, stmt.id())?;
        self.datatypes.insert(id, decl.datatype);
        self.mark(stmt.id(), decl.datatype.secret);
        Ok(())
    }

    fn visit_if(&mut self, stmt: &'ast Stmt, if_stmt: &'ast If) -> Result<(), TaintError> {
        walk_stmt(self, stmt)?;
        let secret = self.taint.is_secret(if_stmt.condition()?.id());
        self.mark(stmt.id(), secret);
        Ok(())
    }

    fn visit_for(&mut self, stmt: &'ast Stmt, for_stmt: &'ast For) -> Result<(), TaintError> {
        self.scoped(stmt.id(), |this| walk_stmt(this, stmt))?;
        let secret = for_stmt
            .condition
            .as_deref()
            .is_some_and(|condition| self.taint.is_secret(condition.id()));
        self.mark(stmt.id(), secret);
        Ok(())
    }

    fn visit_while(&mut self, stmt: &'ast Stmt, while_stmt: &'ast While) -> Result<(), TaintError> {
        walk_stmt(self, stmt)?;
        let secret = self.taint.is_secret(while_stmt.condition()?.id());
        self.mark(stmt.id(), secret);
        Ok(())
    }

    fn visit_function(&mut self, stmt: &'ast Stmt, function: &'ast Function) -> Result<(), TaintError> {
        self.scoped(stmt.id(), |this| {
            for param in &function.parameters {
                let id = this.scopes.declare(&param.identifier, stmt.id())?;
                this.datatypes.insert(id, param.datatype);
            }
            walk_stmt(this, stmt)
        })?;
        self.mark(stmt.id(), false);
        Ok(())
    }

    fn visit_call(&mut self, stmt: &'ast Stmt, _: &'ast Call) -> Result<(), TaintError> {
        walk_stmt(self, stmt)?;
        self.mark(stmt.id(), false);
        Ok(())
    }

    fn visit_return(&mut self, stmt: &'ast Stmt, ret: &'ast Return) -> Result<(), TaintError> {
        walk_stmt(self, stmt)?;
        self.mark_any(stmt.id(), ret.values.iter().map(Expr::id));
        Ok(())
    }
}

/// Analyze inputs, program and outputs in one session.
pub fn analyze_program(inputs: &Stmt, program: &Stmt, outputs: &Stmt) -> Result<SecretTaintMap, TaintError> {
    let mut analysis = TaintAnalysis::new();
    analysis.analyze_inputs(inputs)?;
    analysis.analyze(program)?;
    analysis.analyze_outputs(outputs)?;
    Ok(analysis.finish())
}
