use rustc_hash::FxHashSet;

use heco_ir::{Expr, NodeRef, Operator, Stmt, StmtKind};

use crate::rule::{RewriteContext, RewriteOutcome, RewriteRule};
use crate::RewriteError;

/// Replace a secret-conditioned `if` by arithmetic selection.
///
/// ```text
/// if (c) { x = a; y = b; } else { x = d; }
/// ```
/// becomes
/// ```text
/// { x = c * a + (1 - c) * d; y = c * b + (1 - c) * y; }
/// ```
///
/// Applies when both branches are blocks (or single statements) of
/// assignments to secret variables, no variable is assigned twice in one
/// branch, no assigned value reads another variable assigned by the `if`,
/// and the condition reads none of the assigned variables. A side that does
/// not assign a variable keeps its current value.
#[derive(Copy, Clone, Debug, Default)]
pub struct SecretBranchElimination;

struct BranchAssignment<'a> {
    target: &'a Expr,
    name: &'a str,
    value: &'a Expr,
}

impl RewriteRule for SecretBranchElimination {
    fn name(&self) -> &'static str {
        "secret-branch-elimination"
    }

    fn rewrite_stmt(
        &self,
        stmt: Stmt,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<RewriteOutcome<Stmt>, RewriteError> {
        let replacement = match stmt.kind() {
            StmtKind::If(if_stmt) => match if_stmt.condition.as_deref() {
                Some(condition) if ctx.is_secret(condition.id()) => eliminate(
                    condition,
                    if_stmt.then_branch.as_deref(),
                    if_stmt.else_branch.as_deref(),
                    ctx,
                ),
                _ => None,
            },
            _ => None,
        };
        Ok(match replacement {
            Some(block) => RewriteOutcome::Rewritten(block),
            None => RewriteOutcome::NotApplicable(stmt),
        })
    }
}

fn eliminate(
    condition: &Expr,
    then_branch: Option<&Stmt>,
    else_branch: Option<&Stmt>,
    ctx: &mut RewriteContext<'_>,
) -> Option<Stmt> {
    let then_assignments = branch_assignments(then_branch)?;
    let else_assignments = branch_assignments(else_branch)?;

    let assigned: FxHashSet<&str> = then_assignments
        .iter()
        .chain(&else_assignments)
        .map(|assignment| assignment.name)
        .collect();
    if variables_read(condition).into_iter().any(|name| assigned.contains(name)) {
        return None;
    }
    for assignment in then_assignments.iter().chain(&else_assignments) {
        if !ctx.is_secret(assignment.target.id()) {
            return None;
        }
        let conflicting = variables_read(assignment.value)
            .into_iter()
            .any(|name| name != assignment.name && assigned.contains(name));
        if conflicting {
            return None;
        }
    }

    let mut order: Vec<&str> = then_assignments.iter().map(|a| a.name).collect();
    for assignment in &else_assignments {
        if !order.contains(&assignment.name) {
            order.push(assignment.name);
        }
    }

    let mut statements = Vec::with_capacity(order.len());
    for name in order {
        let taken = then_assignments.iter().find(|a| a.name == name);
        let otherwise = else_assignments.iter().find(|a| a.name == name);
        let target = taken.or(otherwise)?.target;

        let a = ctx.clone_expr(taken.map_or(target, |a| a.value));
        let b = ctx.clone_expr(otherwise.map_or(target, |b| b.value));
        let value = blend(condition, a, b, ctx);
        let secret = ctx.is_secret(value.id());

        let assignment = Stmt::assignment(ctx.clone_expr(target), value);
        ctx.mark(assignment.id(), secret);
        statements.push(assignment);
    }

    let block = Stmt::block(statements);
    let secret = block.children().iter().any(|child| ctx.is_secret(child.id()));
    ctx.mark(block.id(), secret);
    Some(block)
}

/// Assignments of a branch; `None` if the branch has any other shape.
fn branch_assignments(branch: Option<&Stmt>) -> Option<Vec<BranchAssignment<'_>>> {
    let Some(branch) = branch else {
        return Some(Vec::new());
    };
    let statements: Vec<&Stmt> = match branch.kind() {
        StmtKind::Block(block) => block.statements.iter().collect(),
        StmtKind::Assignment(_) => vec![branch],
        _ => return None,
    };

    let mut seen = FxHashSet::default();
    let mut assignments = Vec::with_capacity(statements.len());
    for stmt in statements {
        let assignment = stmt.as_assignment()?;
        let target = assignment.target.as_deref()?;
        let name = target.as_variable()?.identifier.as_str();
        let value = assignment.value.as_deref()?;
        if !seen.insert(name) {
            return None;
        }
        assignments.push(BranchAssignment {
            target,
            name,
            value,
        });
    }
    Some(assignments)
}

fn variables_read(expr: &Expr) -> Vec<&str> {
    let mut names = Vec::new();
    let mut pending = vec![NodeRef::Expr(expr)];
    while let Some(node) = pending.pop() {
        if let Some(variable) = node.as_expr().and_then(Expr::as_variable) {
            names.push(variable.identifier.as_str());
        }
        pending.extend(node.children());
    }
    names
}

/// `c * a + (1 - c) * b`
fn blend(condition: &Expr, a: Expr, b: Expr, ctx: &mut RewriteContext<'_>) -> Expr {
    let take_a = Expr::binary(ctx.clone_expr(condition), Operator::FheMul, a);
    ctx.recompute(&take_a);

    let one = Expr::literal(1);
    ctx.mark(one.id(), false);
    let inverse = Expr::binary(one, Operator::FheSub, ctx.clone_expr(condition));
    ctx.recompute(&inverse);

    let take_b = Expr::binary(inverse, Operator::FheMul, b);
    ctx.recompute(&take_b);

    let sum = Expr::binary(take_a, Operator::FheAdd, take_b);
    ctx.recompute(&sum);
    sum
}
