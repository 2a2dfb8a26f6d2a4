#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;

use heco_ir::{Datatype, Expr, NodeRef, Operator, PrimitiveKind, Stmt};
use heco_taint::{SecretTaintMap, TaintAnalysis};

use crate::{rewrite_program, RewriteError, RewriteOutcome, RewriteRule, Rewriter, RuleSet};

use super::*;

fn declare(name: &str, secret: bool) -> Stmt {
    Stmt::declaration(Datatype::new(PrimitiveKind::Int, secret), name, None)
}

fn var(name: &str) -> Expr {
    Expr::variable(name)
}

fn analyzed(inputs: &Stmt, program: &Stmt) -> SecretTaintMap {
    let mut analysis = TaintAnalysis::new();
    analysis.analyze_inputs(inputs).unwrap();
    analysis.analyze(program).unwrap();
    analysis.finish()
}

#[test]
fn lowering_rewrites_secret_arithmetic() {
    let inputs = Stmt::block(vec![declare("s", true), declare("p", false)]);
    let program = Stmt::block(vec![
        Stmt::assignment(var("s"), Expr::binary(var("s"), Operator::Add, var("p"))),
        Stmt::assignment(var("p"), Expr::binary(var("p"), Operator::Mul, var("p"))),
    ]);
    let mut taint = analyzed(&inputs, &program);
    let rewritten = rewrite_program(program.clone_tree(true), &mut taint).unwrap();
    assert_eq!(rewritten.to_string(), "{ s = s fhe+ p; p = p * p; }");
}

#[test]
fn lowering_keeps_node_ids() {
    let inputs = Stmt::block(vec![declare("s", true)]);
    let sum = Expr::binary(var("s"), Operator::Sub, Expr::literal(1));
    let sum_id = sum.id();
    let program = Stmt::block(vec![Stmt::assignment(var("s"), sum)]);
    let mut taint = analyzed(&inputs, &program);
    let rewritten = rewrite_program(program, &mut taint).unwrap();
    let assignment = rewritten.children()[0];
    let value = assignment.children()[1];
    assert_eq!(value.id(), sum_id);
    assert!(taint.is_secret(sum_id));
}

#[test]
fn lowering_is_not_applicable_to_cleartext() {
    let mut taint = SecretTaintMap::new();
    let mut ctx = crate::RewriteContext::new(&mut taint);
    let expr = Expr::binary(var("a"), Operator::Add, var("b"));
    let outcome = FheOperatorLowering.rewrite_expr(expr, &mut ctx).unwrap();
    assert!(!outcome.is_rewritten());
}

#[test]
fn branch_elimination_blends_assignments() {
    let inputs = Stmt::block(vec![declare("c", true), declare("x", true), declare("y", true)]);
    let program = Stmt::block(vec![Stmt::if_else(
        var("c"),
        Stmt::block(vec![
            Stmt::assignment(var("x"), Expr::literal(1)),
            Stmt::assignment(var("y"), Expr::literal(2)),
        ]),
        Some(Stmt::block(vec![Stmt::assignment(var("x"), Expr::literal(3))])),
    )]);
    let mut taint = analyzed(&inputs, &program);
    let rewritten = rewrite_program(program, &mut taint).unwrap();
    assert_eq!(
        rewritten.to_string(),
        "{ { x = (c fhe* 1) fhe+ ((1 fhe- c) fhe* 3); y = (c fhe* 2) fhe+ ((1 fhe- c) fhe* y); } }"
    );
    assert!(NodeRef::from(&rewritten).verify_parent_links());
}

#[test]
fn branch_elimination_records_taint_for_new_nodes() {
    let inputs = Stmt::block(vec![declare("c", true), declare("x", true)]);
    let program = Stmt::block(vec![Stmt::if_else(
        var("c"),
        Stmt::assignment(var("x"), Expr::literal(1)),
        None,
    )]);
    let mut taint = analyzed(&inputs, &program);
    let rewritten = rewrite_program(program, &mut taint).unwrap();
    let block = rewritten.children()[0];
    let assignment = block.children()[0];
    for id in assignment.preorder_ids() {
        assert!(taint.get(id).is_some(), "{id} has no taint fact");
    }
    let value = assignment.children()[1];
    assert!(taint.is_secret(value.id()));
}

#[test]
fn branch_elimination_rejects_dependent_assignments() {
    let inputs = Stmt::block(vec![declare("c", true), declare("x", true), declare("y", true)]);
    let program = Stmt::block(vec![Stmt::if_else(
        var("c"),
        Stmt::block(vec![
            Stmt::assignment(var("x"), Expr::literal(1)),
            Stmt::assignment(var("y"), var("x")),
        ]),
        None,
    )]);
    let mut taint = analyzed(&inputs, &program);
    let err = rewrite_program(program, &mut taint).unwrap_err();
    assert!(matches!(
        err,
        RewriteError::NoApplicableRule {
            construct: "secret-conditioned if",
            ..
        }
    ));
}

#[test]
fn branch_elimination_rejects_assignments_to_the_condition() {
    let inputs = Stmt::block(vec![declare("c", true), declare("x", true)]);
    let program = Stmt::block(vec![Stmt::if_else(
        var("c"),
        Stmt::block(vec![
            Stmt::assignment(var("c"), Expr::literal(0)),
            Stmt::assignment(var("x"), Expr::literal(1)),
        ]),
        None,
    )]);
    let mut taint = analyzed(&inputs, &program);
    let err = rewrite_program(program, &mut taint).unwrap_err();
    assert!(matches!(
        err,
        RewriteError::NoApplicableRule {
            construct: "secret-conditioned if",
            ..
        }
    ));
}

#[test]
fn branch_elimination_rejects_declarations() {
    let inputs = Stmt::block(vec![declare("c", true)]);
    let program = Stmt::block(vec![Stmt::if_else(
        var("c"),
        Stmt::block(vec![declare("t", true)]),
        None,
    )]);
    let mut taint = analyzed(&inputs, &program);
    assert!(rewrite_program(program, &mut taint).is_err());
}

#[test]
fn cleartext_if_is_left_alone() {
    let inputs = Stmt::block(vec![declare("c", false), declare("x", true)]);
    let program = Stmt::block(vec![Stmt::if_else(
        var("c"),
        Stmt::assignment(var("x"), Expr::literal(1)),
        None,
    )]);
    let expected = program.to_string();
    let mut taint = analyzed(&inputs, &program);
    let rewritten = rewrite_program(program, &mut taint).unwrap();
    assert_eq!(rewritten.to_string(), expected);
}

#[test]
fn empty_rule_set_only_checks() {
    let inputs = Stmt::block(vec![declare("c", true), declare("x", true)]);
    let program = Stmt::block(vec![Stmt::if_else(
        var("c"),
        Stmt::assignment(var("x"), Expr::literal(1)),
        None,
    )]);
    let mut taint = analyzed(&inputs, &program);
    let rules = RuleSet::empty();
    let err = Rewriter::new(&rules).rewrite(program, &mut taint).unwrap_err();
    assert_eq!(
        err.to_string(),
        "no rewrite rule applies to secret-conditioned if: `if (c) x = 1;`"
    );
}

struct Noop;

impl RewriteRule for Noop {
    fn name(&self) -> &'static str {
        "noop"
    }
}

#[test]
fn rule_set_registration() {
    let rules = RuleSet::standard().with(Noop);
    assert_eq!(
        rules.names().collect::<Vec<_>>(),
        vec!["secret-branch-elimination", "fhe-operator-lowering", "noop"]
    );
    assert_eq!(format!("{rules:?}"), r#"["secret-branch-elimination", "fhe-operator-lowering", "noop"]"#);
}

#[test]
fn outcome_into_inner() {
    let outcome = RewriteOutcome::NotApplicable(3);
    assert!(!outcome.is_rewritten());
    assert_eq!(outcome.into_inner(), 3);
}
