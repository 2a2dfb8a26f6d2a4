//! Bottom-up rewriting driver.
//!
//! The tree is taken by value and rebuilt node by node: children first,
//! then the node itself is offered to the rules until none applies, then
//! the result is checked for shapes the evaluator rejects under
//! encryption. Ids of surviving nodes are preserved, so the taint map
//! stays valid for them.

use tracing::{debug, trace};

use heco_ir::{
    Assignment, BinaryExpression, Block, Call, Expr, ExprKind, ExpressionList, For, Function, If,
    IndexAccess, Operator, OperatorExpression, Return, Stmt, StmtKind, UnaryExpression,
    VariableDeclaration, While,
};
use heco_stack::ensure_sufficient_stack;
use heco_taint::SecretTaintMap;

use crate::rule::{RewriteContext, RewriteOutcome, RuleSet};
use crate::RewriteError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Rule applications allowed on one node before giving up.
    pub max_applications_per_node: usize,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        RewriteOptions {
            max_applications_per_node: 8,
        }
    }
}

pub struct Rewriter<'r> {
    rules: &'r RuleSet,
    options: RewriteOptions,
}

impl<'r> Rewriter<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Rewriter {
            rules,
            options: RewriteOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RewriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Rewrite `program`, recording facts for new nodes in `taint`.
    #[tracing::instrument(level = "debug", skip_all, fields(rules = self.rules.len()))]
    pub fn rewrite(&self, program: Stmt, taint: &mut SecretTaintMap) -> Result<Stmt, RewriteError> {
        let mut ctx = RewriteContext::new(taint);
        let result = self.fold_stmt(program, &mut ctx)?;
        debug!("rewriting complete");
        Ok(result)
    }

    fn fold_expr(&self, expr: Expr, ctx: &mut RewriteContext<'_>) -> Result<Expr, RewriteError> {
        ensure_sufficient_stack(|| {
            let (id, kind) = expr.into_parts();
            let kind = match kind {
                ExprKind::Literal(_) | ExprKind::Variable(_) => kind,
                ExprKind::Binary(BinaryExpression {
                    left,
                    operator,
                    right,
                }) => ExprKind::Binary(BinaryExpression {
                    left: self.fold_boxed_expr(left, ctx)?,
                    operator,
                    right: self.fold_boxed_expr(right, ctx)?,
                }),
                ExprKind::Unary(UnaryExpression { operator, operand }) => {
                    ExprKind::Unary(UnaryExpression {
                        operator,
                        operand: self.fold_boxed_expr(operand, ctx)?,
                    })
                }
                ExprKind::IndexAccess(IndexAccess { target, index }) => {
                    ExprKind::IndexAccess(IndexAccess {
                        target: self.fold_boxed_expr(target, ctx)?,
                        index: self.fold_boxed_expr(index, ctx)?,
                    })
                }
                ExprKind::List(ExpressionList { expressions }) => ExprKind::List(ExpressionList {
                    expressions: self.fold_exprs(expressions, ctx)?,
                }),
                ExprKind::Operator(OperatorExpression { operator, operands }) => {
                    ExprKind::Operator(OperatorExpression {
                        operator,
                        operands: self.fold_exprs(operands, ctx)?,
                    })
                }
            };
            let expr = self.apply_expr(Expr::from_parts(id, kind), ctx)?;
            check_expr(&expr, ctx)?;
            Ok(expr)
        })
    }

    fn fold_stmt(&self, stmt: Stmt, ctx: &mut RewriteContext<'_>) -> Result<Stmt, RewriteError> {
        ensure_sufficient_stack(|| {
            let (id, kind) = stmt.into_parts();
            let kind = match kind {
                StmtKind::Block(Block { statements }) => StmtKind::Block(Block {
                    statements: statements
                        .into_iter()
                        .map(|stmt| self.fold_stmt(stmt, ctx))
                        .collect::<Result<_, _>>()?,
                }),
                StmtKind::Assignment(Assignment { target, value }) => {
                    StmtKind::Assignment(Assignment {
                        target: self.fold_boxed_expr(target, ctx)?,
                        value: self.fold_boxed_expr(value, ctx)?,
                    })
                }
                StmtKind::VariableDeclaration(VariableDeclaration {
                    datatype,
                    identifier,
                    value,
                }) => StmtKind::VariableDeclaration(VariableDeclaration {
                    datatype,
                    identifier,
                    value: self.fold_boxed_expr(value, ctx)?,
                }),
                StmtKind::If(If {
                    condition,
                    then_branch,
                    else_branch,
                }) => StmtKind::If(If {
                    condition: self.fold_boxed_expr(condition, ctx)?,
                    then_branch: self.fold_boxed_stmt(then_branch, ctx)?,
                    else_branch: self.fold_boxed_stmt(else_branch, ctx)?,
                }),
                StmtKind::For(For {
                    initializer,
                    condition,
                    update,
                    body,
                }) => StmtKind::For(For {
                    initializer: self.fold_boxed_stmt(initializer, ctx)?,
                    condition: self.fold_boxed_expr(condition, ctx)?,
                    update: self.fold_boxed_stmt(update, ctx)?,
                    body: self.fold_boxed_stmt(body, ctx)?,
                }),
                StmtKind::While(While { condition, body }) => StmtKind::While(While {
                    condition: self.fold_boxed_expr(condition, ctx)?,
                    body: self.fold_boxed_stmt(body, ctx)?,
                }),
                StmtKind::Function(Function {
                    identifier,
                    return_type,
                    parameters,
                    body,
                }) => StmtKind::Function(Function {
                    identifier,
                    return_type,
                    parameters,
                    body: self.fold_boxed_stmt(body, ctx)?,
                }),
                StmtKind::Call(Call {
                    identifier,
                    arguments,
                }) => StmtKind::Call(Call {
                    identifier,
                    arguments: self.fold_exprs(arguments, ctx)?,
                }),
                StmtKind::Return(Return { values }) => StmtKind::Return(Return {
                    values: self.fold_exprs(values, ctx)?,
                }),
            };
            let stmt = self.apply_stmt(Stmt::from_parts(id, kind), ctx)?;
            check_stmt(&stmt, ctx)?;
            Ok(stmt)
        })
    }

    fn fold_boxed_expr(
        &self,
        slot: Option<Box<Expr>>,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<Option<Box<Expr>>, RewriteError> {
        slot.map(|expr| self.fold_expr(*expr, ctx).map(Box::new))
            .transpose()
    }

    fn fold_boxed_stmt(
        &self,
        slot: Option<Box<Stmt>>,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<Option<Box<Stmt>>, RewriteError> {
        slot.map(|stmt| self.fold_stmt(*stmt, ctx).map(Box::new))
            .transpose()
    }

    fn fold_exprs(&self, exprs: Vec<Expr>, ctx: &mut RewriteContext<'_>) -> Result<Vec<Expr>, RewriteError> {
        exprs
            .into_iter()
            .map(|expr| self.fold_expr(expr, ctx))
            .collect()
    }

    fn apply_expr(&self, mut expr: Expr, ctx: &mut RewriteContext<'_>) -> Result<Expr, RewriteError> {
        let mut applications = 0;
        'fixpoint: loop {
            for rule in self.rules.iter() {
                match rule.rewrite_expr(expr, ctx)? {
                    RewriteOutcome::Rewritten(new) => {
                        trace!(rule = rule.name(), node = %new.id(), "rewrote expression");
                        expr = new;
                        applications += 1;
                        if applications > self.options.max_applications_per_node {
                            return Err(RewriteError::IterationLimit {
                                limit: self.options.max_applications_per_node,
                                rendered: expr.to_string(),
                            });
                        }
                        continue 'fixpoint;
                    }
                    RewriteOutcome::NotApplicable(same) => expr = same,
                }
            }
            return Ok(expr);
        }
    }

    fn apply_stmt(&self, mut stmt: Stmt, ctx: &mut RewriteContext<'_>) -> Result<Stmt, RewriteError> {
        let mut applications = 0;
        'fixpoint: loop {
            for rule in self.rules.iter() {
                match rule.rewrite_stmt(stmt, ctx)? {
                    RewriteOutcome::Rewritten(new) => {
                        debug!(rule = rule.name(), node = %new.id(), "rewrote statement");
                        stmt = new;
                        applications += 1;
                        if applications > self.options.max_applications_per_node {
                            return Err(RewriteError::IterationLimit {
                                limit: self.options.max_applications_per_node,
                                rendered: stmt.to_string(),
                            });
                        }
                        continue 'fixpoint;
                    }
                    RewriteOutcome::NotApplicable(same) => stmt = same,
                }
            }
            return Ok(stmt);
        }
    }
}

/// Reject expression shapes that cannot run with their secret operands.
fn check_expr(expr: &Expr, ctx: &RewriteContext<'_>) -> Result<(), RewriteError> {
    let any_secret = || expr.children().iter().any(|child| ctx.is_secret(child.id()));
    match expr.kind() {
        ExprKind::Binary(binary) if !binary.operator.is_fhe_compatible() && any_secret() => {
            Err(unsupported(binary.operator, expr))
        }
        ExprKind::Unary(unary) if any_secret() => Err(unsupported(unary.operator, expr)),
        ExprKind::Operator(op) if !op.operator.is_fhe_compatible() && any_secret() => {
            Err(unsupported(op.operator, expr))
        }
        ExprKind::IndexAccess(access) => match access.index.as_deref() {
            Some(index) if ctx.is_secret(index.id()) => Err(RewriteError::NoApplicableRule {
                construct: "secret index",
                rendered: expr.to_string(),
            }),
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

fn check_stmt(stmt: &Stmt, ctx: &RewriteContext<'_>) -> Result<(), RewriteError> {
    let (construct, condition) = match stmt.kind() {
        StmtKind::If(if_stmt) => ("secret-conditioned if", if_stmt.condition.as_deref()),
        StmtKind::For(for_stmt) => ("secret-conditioned for", for_stmt.condition.as_deref()),
        StmtKind::While(while_stmt) => ("secret-conditioned while", while_stmt.condition.as_deref()),
        _ => return Ok(()),
    };
    match condition {
        Some(condition) if ctx.is_secret(condition.id()) => Err(RewriteError::NoApplicableRule {
            construct,
            rendered: stmt.to_string(),
        }),
        _ => Ok(()),
    }
}

fn unsupported(operator: Operator, expr: &Expr) -> RewriteError {
    RewriteError::UnsupportedOperator {
        operator: operator.name(),
        rendered: expr.to_string(),
    }
}

/// Rewrite with the standard rules and default options.
pub fn rewrite_program(program: Stmt, taint: &mut SecretTaintMap) -> Result<Stmt, RewriteError> {
    Rewriter::new(&RuleSet::standard()).rewrite(program, taint)
}
