#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;

use heco_eval::Cleartext;
use heco_ir::{Datatype, PrimitiveKind};

use super::Inputs;
use crate::ExecError;

fn secret_int() -> Datatype {
    Datatype::secret(PrimitiveKind::Int)
}

#[test]
fn decodes_scalars_and_vectors() {
    let inputs = Inputs::from_json(
        r#"[
            { "name": "a", "type": "secret int", "value": 3 },
            { "name": "v", "type": "int", "value": [1, 2, 3] },
            { "name": "f", "type": "double", "value": 1.5 },
            { "name": "b", "type": "bool", "value": [true, false] },
            { "name": "c", "type": "char", "value": "x" }
        ]"#,
    )
    .unwrap();

    let decoded: Vec<_> = inputs
        .iter()
        .map(|input| (input.name.as_str(), input.datatype.to_string(), input.value.clone()))
        .collect();
    assert_eq!(
        decoded,
        vec![
            ("a", "secret int".to_string(), Cleartext::Int(vec![3])),
            ("v", "int".to_string(), Cleartext::Int(vec![1, 2, 3])),
            ("f", "double".to_string(), Cleartext::Double(vec![1.5])),
            ("b", "bool".to_string(), Cleartext::Bool(vec![true, false])),
            ("c", "char".to_string(), Cleartext::Char(vec!['x'])),
        ]
    );
}

#[test]
fn later_input_replaces_earlier() {
    let inputs = Inputs::new()
        .with("a", secret_int(), 1)
        .with("b", secret_int(), 2)
        .with("a", Datatype::plain(PrimitiveKind::Int), 5);

    assert_eq!(inputs.len(), 2);
    let first = inputs.iter().next().unwrap();
    assert_eq!(first.name, "a");
    assert!(!first.datatype.secret);
    assert_eq!(first.value, Cleartext::Int(vec![5]));
}

#[test]
fn block_declares_every_input() {
    let inputs = Inputs::new()
        .with("a", secret_int(), 3)
        .with("v", Datatype::plain(PrimitiveKind::Int), vec![1_i64, 2, 3]);

    let block = inputs.to_block().unwrap();
    assert_eq!(block.to_string(), "{ secret int a = 3; int v = {1, 2, 3}; }");
}

#[test]
fn blocks_get_fresh_ids() {
    let inputs = Inputs::new().with("a", secret_int(), 3);
    let first = inputs.to_block().unwrap();
    let second = inputs.to_block().unwrap();
    assert_ne!(first.id(), second.id());
    assert_eq!(first, second);
}

#[test]
fn empty_inputs_give_empty_block() {
    let block = Inputs::new().to_block().unwrap();
    assert_eq!(block.to_string(), "{}");
}

#[test]
fn rejects_empty_vector() {
    let err = Inputs::from_json(r#"[{ "name": "v", "type": "int", "value": [] }]"#).unwrap_err();
    assert_eq!(err.to_string(), "invalid input `v`: empty vector");

    let inputs = Inputs::new().with("w", secret_int(), Cleartext::empty(PrimitiveKind::Int));
    assert!(matches!(inputs.to_block(), Err(ExecError::InvalidInput { name, .. }) if name == "w"));
}

#[test]
fn rejects_bad_types() {
    let err = Inputs::from_json(r#"[{ "name": "a", "type": "secret number", "value": 1 }]"#).unwrap_err();
    assert!(matches!(err, ExecError::InvalidInput { ref name, .. } if name == "a"));

    let err = Inputs::from_json(r#"[{ "name": "a", "type": "int", "value": [1, "two"] }]"#).unwrap_err();
    assert_eq!(err.to_string(), r#"invalid input `a`: expected int, found `"two"`"#);

    let err = Inputs::from_json(r#"[{ "name": "c", "type": "char", "value": "xy" }]"#).unwrap_err();
    assert!(matches!(err, ExecError::InvalidInput { .. }));
}

#[test]
fn rejects_malformed_json() {
    let err = Inputs::from_json(r#"{ "name": "a" }"#).unwrap_err();
    assert!(matches!(err, ExecError::InputJson(_)));
}
