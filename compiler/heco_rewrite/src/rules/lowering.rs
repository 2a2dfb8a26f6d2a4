use heco_ir::{Expr, ExprKind};

use crate::rule::{RewriteContext, RewriteOutcome, RewriteRule};
use crate::RewriteError;

/// `a + b`, `a - b`, `a * b` with a secret operand become `fhe+`, `fhe-`,
/// `fhe*`. The node keeps its id.
#[derive(Copy, Clone, Debug, Default)]
pub struct FheOperatorLowering;

impl RewriteRule for FheOperatorLowering {
    fn name(&self) -> &'static str {
        "fhe-operator-lowering"
    }

    fn rewrite_expr(
        &self,
        mut expr: Expr,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<RewriteOutcome<Expr>, RewriteError> {
        let lowered = match expr.kind() {
            ExprKind::Binary(binary) => binary.operator.to_fhe(),
            _ => None,
        };
        let Some(lowered) = lowered else {
            return Ok(RewriteOutcome::NotApplicable(expr));
        };
        let secret_operand = expr.children().iter().any(|child| ctx.is_secret(child.id()));
        if !secret_operand {
            return Ok(RewriteOutcome::NotApplicable(expr));
        }

        expr.edit(|kind| {
            if let ExprKind::Binary(binary) = kind {
                binary.operator = lowered;
            }
        });
        Ok(RewriteOutcome::Rewritten(expr))
    }
}
