#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

use super::*;
use crate::{NodeRef, PrimitiveKind};

#[test]
fn decodes_binary_expression() {
    let value = json!({
        "type": "BinaryExpression",
        "left": { "type": "Variable", "identifier": "a" },
        "operator": "+",
        "right": { "type": "LiteralInt", "value": 4 }
    });
    let expr = Expr::from_json(&value).unwrap();
    assert_eq!(
        expr,
        Expr::binary(Expr::variable("a"), Operator::Add, Expr::literal(4))
    );
    assert!(NodeRef::from(&expr).verify_parent_links());
}

#[test]
fn accepts_operator_names() {
    let value = json!({
        "type": "BinaryExpression",
        "left": { "type": "Variable", "identifier": "a" },
        "operator": "division",
        "right": { "type": "Variable", "identifier": "b" }
    });
    let expr = Expr::from_json(&value).unwrap();
    assert_eq!(expr.to_string(), "a / b");
}

#[test]
fn encodes_declaration_with_variable_target() {
    let decl = Stmt::declaration(
        Datatype::secret(PrimitiveKind::Int),
        "x",
        Some(Expr::list(vec![Expr::literal(1), Expr::literal(2)])),
    );
    assert_eq!(
        decl.to_json(),
        json!({
            "type": "VariableDeclaration",
            "datatype": "secret int",
            "target": { "type": "Variable", "identifier": "x" },
            "value": {
                "type": "ExpressionList",
                "expressions": [
                    { "type": "LiteralInt", "value": 1 },
                    { "type": "LiteralInt", "value": 2 }
                ]
            }
        })
    );
}

#[test]
fn omits_unset_slots() {
    let if_stmt = Stmt::if_else(Expr::literal(true), Stmt::block(vec![]), None);
    let value = if_stmt.to_json();
    assert!(value.get("elseBranch").is_none());
    let back = Stmt::from_json(&value).unwrap();
    assert_eq!(back, if_stmt);
}

#[test]
fn null_slots_decode_as_unset() {
    let value = json!({ "type": "Assignment", "target": { "type": "Variable", "identifier": "x" }, "value": null });
    let stmt = Stmt::from_json(&value).unwrap();
    let assignment = stmt.as_assignment().unwrap();
    assert!(!assignment.has_value());
}

#[test]
fn decoding_assigns_fresh_ids() {
    let value = json!({ "type": "Variable", "identifier": "x" });
    let a = Expr::from_json(&value).unwrap();
    let b = Expr::from_json(&value).unwrap();
    assert_ne!(a.id(), b.id());
}

#[test]
fn node_dispatches_on_type() {
    let expr = Node::parse_json(r#"{ "type": "LiteralBool", "value": true }"#).unwrap();
    assert!(matches!(expr, Node::Expr(_)));
    let stmt = Node::parse_json(r#"{ "type": "Block", "statements": [] }"#).unwrap();
    assert!(matches!(stmt, Node::Stmt(_)));
}

#[test]
fn return_accepts_single_value() {
    let value = json!({ "type": "Return", "value": { "type": "Variable", "identifier": "r" } });
    let stmt = Stmt::from_json(&value).unwrap();
    assert_eq!(stmt, Stmt::return_values(vec![Expr::variable("r")]));
}

#[test]
fn function_round_trip() {
    let function = Stmt::function(
        "f",
        Some(Datatype::secret(PrimitiveKind::Int)),
        vec![FunctionParameter {
            datatype: Datatype::plain(PrimitiveKind::Int),
            identifier: "n".to_string(),
        }],
        Stmt::block(vec![Stmt::return_values(vec![Expr::variable("n")])]),
    );
    let value = function.to_json();
    assert_eq!(value["returnType"], json!("secret int"));
    assert_eq!(Stmt::from_json(&value).unwrap(), function);
}

#[test]
fn while_round_trip() {
    let value = json!({
        "type": "While",
        "condition": {
            "type": "BinaryExpression",
            "left": { "type": "Variable", "identifier": "n" },
            "operator": "<",
            "right": { "type": "LiteralInt", "value": 3 }
        },
        "body": { "type": "Block", "statements": [] }
    });
    let stmt = Stmt::from_json(&value).unwrap();
    assert_eq!(
        stmt,
        Stmt::while_loop(
            Expr::binary(Expr::variable("n"), Operator::Less, Expr::literal(3)),
            Stmt::block(vec![])
        )
    );
    assert_eq!(stmt.to_json(), value);
}

#[test]
fn errors() {
    assert_eq!(
        Expr::from_json(&json!({ "type": "Bogus" })).unwrap_err(),
        IrError::UnknownNodeType("Bogus".to_string())
    );
    assert_eq!(
        Expr::from_json(&json!({ "type": "Variable" })).unwrap_err(),
        IrError::MissingField {
            node: "Variable".to_string(),
            field: "identifier"
        }
    );
    assert_eq!(
        Expr::from_json(&json!({ "type": "UnaryExpression", "operator": "??" })).unwrap_err(),
        IrError::UnknownOperator("??".to_string())
    );
    assert!(matches!(
        Expr::from_json(&json!({ "type": "LiteralChar", "value": "ab" })),
        Err(IrError::InvalidField { field: "value", .. })
    ));
    assert!(matches!(
        Stmt::from_json(&json!({ "type": "VariableDeclaration", "datatype": "secret quux" })),
        Err(IrError::InvalidDatatype(_))
    ));
    assert!(matches!(Node::parse_json("{"), Err(IrError::Json(_))));
    assert!(matches!(Node::parse_json("[]"), Err(IrError::Json(_))));
}

// -- Property Tests --

fn expr_strategy() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(|v| Expr::literal(v)),
        any::<bool>().prop_map(|v| Expr::literal(v)),
        // Quarter steps are exact in binary and survive JSON text.
        (-4000i32..4000).prop_map(|v| Expr::literal(f64::from(v) / 4.0)),
        (-4000i16..4000).prop_map(|v| Expr::literal(f32::from(v) / 4.0)),
        "[a-z]{0,6}".prop_map(|v| Expr::literal(v)),
        "[a-z][a-z0-9_]{0,6}".prop_map(Expr::variable),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(Operator::ALL.to_vec()), inner.clone())
                .prop_map(|(left, op, right)| Expr::binary(left, op, right)),
            (inner.clone(), inner.clone()).prop_map(|(target, index)| Expr::index_access(target, index)),
            prop::collection::vec(inner, 0..4).prop_map(Expr::list),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_expr_json_round_trip(expr in expr_strategy()) {
        let decoded = Expr::from_json(&expr.to_json()).unwrap();
        prop_assert_eq!(&decoded, &expr);
        prop_assert!(NodeRef::from(&decoded).verify_parent_links());
    }

    #[test]
    fn prop_assignment_json_text_round_trip(target in "[a-z]{1,4}", value in expr_strategy()) {
        let stmt = Stmt::assignment(Expr::variable(target), value);
        let text = serde_json::to_string(&stmt.to_json()).unwrap();
        let decoded = Node::parse_json(&text).unwrap();
        prop_assert_eq!(decoded, Node::Stmt(stmt));
    }
}
