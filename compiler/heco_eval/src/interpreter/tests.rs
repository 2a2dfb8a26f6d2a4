#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;

use heco_ir::{For, Operator, StmtKind};
use heco_taint::analyze_program;

use super::*;
use crate::{DummyCiphertextFactory, EvalErrorKind};

fn decl(datatype: &str, name: &str, value: Option<Expr>) -> Stmt {
    Stmt::declaration(datatype.parse().unwrap(), name, value)
}

fn var(name: &str) -> Expr {
    Expr::variable(name)
}

fn int(value: i64) -> Expr {
    Expr::literal(value)
}

fn ints(values: &[i64]) -> Expr {
    Expr::list(values.iter().copied().map(int).collect())
}

/// `Block[Assignment(name, name)...]`
fn outputs(names: &[&str]) -> Stmt {
    Stmt::block(names.iter().map(|name| Stmt::assignment(var(name), var(name))).collect())
}

/// Analyze, evaluate and decrypt every output.
fn execute(
    factory: &DummyCiphertextFactory,
    inputs: &Stmt,
    program: &Stmt,
    outputs: &Stmt,
) -> Result<Vec<(String, Cleartext)>, EvalError> {
    let taint = analyze_program(inputs, program, outputs).unwrap();
    let mut evaluator = EvaluatorBuilder::new(factory)
        .taint(&taint)
        .inputs(inputs)
        .build()?;
    evaluator.run(program)?;
    let values = evaluator.get_output(outputs)?;
    let mut decrypted = Vec::new();
    for (name, value) in &values {
        decrypted.push((name.clone(), evaluator.decrypt(value)?));
    }
    Ok(decrypted)
}

fn single(results: Vec<(String, Cleartext)>) -> Cleartext {
    assert_eq!(results.len(), 1);
    results.into_iter().next().unwrap().1
}

#[test]
fn cleartext_addition() {
    let factory = DummyCiphertextFactory::default();
    let inputs = Stmt::block(vec![
        decl("int", "a", Some(int(3))),
        decl("int", "b", Some(int(4))),
    ]);
    let outputs = Stmt::block(vec![Stmt::assignment(
        var("y"),
        Expr::binary(var("a"), Operator::Add, var("b")),
    )]);
    let mut evaluator = EvaluatorBuilder::new(&factory).inputs(&inputs).build().unwrap();
    evaluator.run(&Stmt::block(vec![])).unwrap();
    let values = evaluator.get_output(&outputs).unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].0, "y");
    assert_eq!(values[0].1.as_cleartext(), Some(&Cleartext::from(7)));
}

#[test]
fn secret_arithmetic() {
    let factory = DummyCiphertextFactory::default();
    let inputs = Stmt::block(vec![
        decl("secret int", "a", Some(int(3))),
        decl("int", "b", Some(int(4))),
    ]);
    let program = Stmt::block(vec![
        decl("secret int", "sum", Some(Expr::binary(var("a"), Operator::FheAdd, var("b")))),
        // Only the right operand is secret: operands are swapped.
        decl("secret int", "twice", Some(Expr::binary(int(2), Operator::FheMul, var("a")))),
        // Not commutative: the minuend is encrypted first.
        decl("secret int", "rest", Some(Expr::binary(int(10), Operator::FheSub, var("a")))),
    ]);
    let results = execute(&factory, &inputs, &program, &outputs(&["sum", "twice", "rest"])).unwrap();
    assert_eq!(
        results,
        vec![
            ("sum".to_string(), Cleartext::from(7)),
            ("twice".to_string(), Cleartext::from(6)),
            ("rest".to_string(), Cleartext::from(7)),
        ]
    );
}

#[test]
fn division_with_secret_operand_names_the_operator() {
    let factory = DummyCiphertextFactory::default();
    let inputs = Stmt::block(vec![decl("secret int", "s", Some(int(8)))]);
    let program = Stmt::block(vec![decl(
        "secret int",
        "q",
        Some(Expr::binary(var("s"), Operator::Div, int(2))),
    )]);
    let err = execute(&factory, &inputs, &program, &outputs(&["q"])).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Unsupported);
    assert_eq!(err.message, "unsupported ciphertext operation: division in `s / 2`");

    // Without a taint map the runtime values catch it.
    let mut evaluator = EvaluatorBuilder::new(&factory).inputs(&inputs).build().unwrap();
    let err = evaluator.run(&program).unwrap_err();
    assert_eq!(err.message, "unsupported ciphertext operation: division in `s / 2`");
}

#[test]
fn rotate_is_visible_on_later_reads() {
    let factory = DummyCiphertextFactory::new(4);
    let inputs = Stmt::block(vec![decl("secret int", "v", Some(ints(&[1, 2, 3, 4])))]);
    let program = Stmt::block(vec![Stmt::call("rotate", vec![var("v"), int(2)])]);
    let results = execute(&factory, &inputs, &program, &outputs(&["v"])).unwrap();
    assert_eq!(single(results), Cleartext::Int(vec![3, 4, 1, 2]));
}

#[test]
fn rotate_validates_its_arguments() {
    let factory = DummyCiphertextFactory::new(4);
    let inputs = Stmt::block(vec![
        decl("secret int", "v", Some(ints(&[1, 2]))),
        decl("int", "p", Some(int(1))),
    ]);
    let mut evaluator = EvaluatorBuilder::new(&factory).inputs(&inputs).build().unwrap();

    let err = evaluator.run(&Stmt::call("rotate", vec![var("v")])).unwrap_err();
    assert_eq!(err.message, "rotate expects 2 arguments, got 1: `rotate(v);`");
    let err = evaluator.run(&Stmt::call("rotate", vec![var("v"), var("p")])).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Structural);
    let err = evaluator.run(&Stmt::call("rotate", vec![var("p"), int(1)])).unwrap_err();
    assert_eq!(err.message, "rotate expects a declared ciphertext, `p` is not one");
    let err = evaluator.run(&Stmt::call("shuffle", vec![var("v")])).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Unsupported);
}

#[test]
fn nested_index_access_in_output_is_rejected() {
    let factory = DummyCiphertextFactory::new(4);
    let inputs = Stmt::block(vec![
        decl("secret int", "v", Some(ints(&[1, 2, 3, 4]))),
        decl("int", "k", Some(ints(&[0, 1, 2]))),
    ]);
    let outputs = Stmt::block(vec![
        Stmt::assignment(var("v"), var("v")),
        Stmt::assignment(
            var("y"),
            Expr::index_access(var("v"), Expr::index_access(var("k"), int(2))),
        ),
    ]);
    let mut evaluator = EvaluatorBuilder::new(&factory).inputs(&inputs).build().unwrap();
    let err = evaluator.get_output(&outputs).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Structural);
    assert_eq!(err.message, "nested index access is not supported: `v[k[2]]`");
}

#[test]
fn index_reads() {
    let factory = DummyCiphertextFactory::new(4);
    let inputs = Stmt::block(vec![
        decl("secret int", "v", Some(ints(&[1, 2, 3, 4]))),
        decl("int", "w", Some(ints(&[5, 6, 7]))),
    ]);
    let outputs = Stmt::block(vec![
        Stmt::assignment(var("a"), Expr::index_access(var("v"), int(2))),
        Stmt::assignment(var("b"), Expr::index_access(var("w"), int(1))),
    ]);
    let mut evaluator = EvaluatorBuilder::new(&factory).inputs(&inputs).build().unwrap();
    let values = evaluator.get_output(&outputs).unwrap();
    // A ciphertext read is a rotated copy with the element in slot 0.
    assert_eq!(evaluator.decrypt(&values[0].1).unwrap(), Cleartext::Int(vec![3, 4, 1, 2]));
    assert_eq!(evaluator.decrypt(&values[1].1).unwrap(), Cleartext::from(6));
}

#[test]
fn output_index_may_be_any_cleartext_expression() {
    let factory = DummyCiphertextFactory::new(4);
    let inputs = Stmt::block(vec![
        decl("secret int", "v", Some(ints(&[1, 2, 3, 4]))),
        decl("int", "k", Some(int(1))),
    ]);
    let outputs = Stmt::block(vec![Stmt::assignment(
        var("a"),
        Expr::index_access(var("v"), Expr::binary(var("k"), Operator::Add, int(1))),
    )]);
    let mut evaluator = EvaluatorBuilder::new(&factory).inputs(&inputs).build().unwrap();
    let values = evaluator.get_output(&outputs).unwrap();
    assert_eq!(values[0].0, "a");
    assert_eq!(evaluator.decrypt(&values[0].1).unwrap(), Cleartext::Int(vec![3, 4, 1, 2]));
}

#[test]
fn index_writes() {
    let factory = DummyCiphertextFactory::new(4);
    let inputs = Stmt::block(vec![
        decl("secret int", "v", Some(ints(&[1, 2, 3, 4]))),
        decl("int", "w", Some(ints(&[1, 2]))),
        decl("secret int", "s", Some(int(5))),
    ]);
    let program = Stmt::block(vec![
        Stmt::assignment(Expr::index_access(var("v"), int(1)), int(9)),
        Stmt::assignment(Expr::index_access(var("w"), int(3)), int(9)),
        Stmt::assignment(Expr::index_access(var("s"), int(2)), int(7)),
    ]);
    let results = execute(&factory, &inputs, &program, &outputs(&["v", "w", "s"])).unwrap();
    assert_eq!(
        results,
        vec![
            ("v".to_string(), Cleartext::Int(vec![1, 9, 3, 4])),
            ("w".to_string(), Cleartext::Int(vec![1, 2, 0, 9])),
            ("s".to_string(), Cleartext::Int(vec![5, 5, 7, 5])),
        ]
    );
}

#[test]
fn far_element_write_is_an_error() {
    let factory = DummyCiphertextFactory::new(4);
    let inputs = Stmt::block(vec![decl("int", "v", Some(ints(&[1, 2])))]);
    let program = Stmt::block(vec![Stmt::assignment(
        Expr::index_access(var("v"), int(i64::MAX)),
        int(1),
    )]);
    let err = execute(&factory, &inputs, &program, &outputs(&["v"])).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Arithmetic);
}

#[test]
fn undeclared_element_write_starts_from_zero() {
    let factory = DummyCiphertextFactory::new(4);
    let program = Stmt::block(vec![
        decl("secret int", "v", None),
        Stmt::assignment(Expr::index_access(var("v"), int(3)), int(1)),
    ]);
    let inputs = Stmt::block(vec![]);
    let results = execute(&factory, &inputs, &program, &outputs(&["v"])).unwrap();
    assert_eq!(single(results), Cleartext::Int(vec![0, 0, 0, 1]));
}

#[test]
fn if_takes_the_selected_branch() {
    let factory = DummyCiphertextFactory::default();
    let inputs = Stmt::block(vec![decl("bool", "c", Some(Expr::literal(false)))]);
    let program = Stmt::block(vec![
        decl("int", "x", Some(int(0))),
        Stmt::if_else(
            var("c"),
            Stmt::block(vec![Stmt::assignment(var("x"), int(1))]),
            Some(Stmt::block(vec![Stmt::assignment(var("x"), int(2))])),
        ),
    ]);
    let results = execute(&factory, &inputs, &program, &outputs(&["x"])).unwrap();
    assert_eq!(single(results), Cleartext::from(2));
}

#[test]
fn secret_condition_reaching_evaluation_fails() {
    let factory = DummyCiphertextFactory::default();
    let inputs = Stmt::block(vec![decl("secret bool", "c", Some(Expr::literal(true)))]);
    let program = Stmt::block(vec![
        decl("int", "x", Some(int(0))),
        Stmt::if_else(
            var("c"),
            Stmt::block(vec![Stmt::assignment(var("x"), int(1))]),
            None,
        ),
    ]);
    let err = execute(&factory, &inputs, &program, &outputs(&["x"])).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Unsupported);
    assert_eq!(err.message, "If with a secret condition reached evaluation: `c`");
}

#[test]
fn for_loop_runs_until_condition_fails() {
    let factory = DummyCiphertextFactory::default();
    let program = Stmt::block(vec![
        decl("int", "s", Some(int(0))),
        Stmt::for_loop(
            decl("int", "i", Some(int(0))),
            Expr::binary(var("i"), Operator::Less, int(4)),
            Stmt::assignment(var("i"), Expr::binary(var("i"), Operator::Add, int(1))),
            Stmt::block(vec![Stmt::assignment(
                var("s"),
                Expr::binary(var("s"), Operator::Add, var("i")),
            )]),
        ),
    ]);
    let results = execute(&factory, &Stmt::block(vec![]), &program, &outputs(&["s"])).unwrap();
    assert_eq!(single(results), Cleartext::from(6));
}

#[test]
fn while_loop_runs_until_condition_fails() {
    let factory = DummyCiphertextFactory::default();
    let inputs = Stmt::block(vec![decl("int", "n", Some(int(1)))]);
    let program = Stmt::block(vec![Stmt::while_loop(
        Expr::binary(var("n"), Operator::Less, int(100)),
        Stmt::block(vec![
            decl("int", "step", Some(var("n"))),
            Stmt::assignment(var("n"), Expr::binary(var("n"), Operator::Add, var("step"))),
        ]),
    )]);
    let results = execute(&factory, &inputs, &program, &outputs(&["n"])).unwrap();
    assert_eq!(single(results), Cleartext::from(128));
}

#[test]
fn while_with_secret_condition_fails() {
    let factory = DummyCiphertextFactory::default();
    let inputs = Stmt::block(vec![decl("secret bool", "c", Some(Expr::literal(true)))]);
    let program = Stmt::block(vec![Stmt::while_loop(var("c"), Stmt::block(vec![]))]);
    let err = execute(&factory, &inputs, &program, &outputs(&["c"])).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Unsupported);
    assert_eq!(err.message, "While with a secret condition reached evaluation: `c`");
}

#[test]
fn loop_body_declarations_do_not_survive_the_iteration() {
    let factory = DummyCiphertextFactory::default();
    let inputs = Stmt::block(vec![decl("int", "x", Some(int(1))), decl("int", "acc", Some(int(0)))]);
    let program = Stmt::block(vec![Stmt::for_loop(
        decl("int", "i", Some(int(0))),
        Expr::binary(var("i"), Operator::Less, int(2)),
        Stmt::assignment(var("i"), Expr::binary(var("i"), Operator::Add, int(1))),
        Stmt::block(vec![
            Stmt::assignment(var("acc"), Expr::binary(var("acc"), Operator::Add, var("x"))),
            decl("int", "x", Some(int(10))),
        ]),
    )]);
    let results = execute(&factory, &inputs, &program, &outputs(&["acc", "x"])).unwrap();
    assert_eq!(
        results,
        vec![
            ("acc".to_string(), Cleartext::from(2)),
            ("x".to_string(), Cleartext::from(1)),
        ]
    );
}

#[test]
fn for_without_condition_is_unsupported() {
    let factory = DummyCiphertextFactory::default();
    let program = Stmt::new(StmtKind::For(For {
        initializer: None,
        condition: None,
        update: None,
        body: Some(Box::new(Stmt::block(vec![]))),
    }));
    let mut evaluator = EvaluatorBuilder::new(&factory).build().unwrap();
    let err = evaluator.run(&program).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Unsupported);
}

#[test]
fn inner_declarations_shadow_without_leaking() {
    let factory = DummyCiphertextFactory::default();
    let program = Stmt::block(vec![
        decl("int", "x", Some(int(1))),
        Stmt::block(vec![
            decl("int", "x", Some(int(2))),
            Stmt::assignment(var("x"), int(3)),
        ]),
    ]);
    let results = execute(&factory, &Stmt::block(vec![]), &program, &outputs(&["x"])).unwrap();
    assert_eq!(single(results), Cleartext::from(1));
}

#[test]
fn expression_lists_take_the_first_element_kind() {
    let factory = DummyCiphertextFactory::default();
    let program = Stmt::block(vec![decl(
        "double",
        "d",
        Some(Expr::list(vec![Expr::literal(1.5), int(2)])),
    )]);
    let results = execute(&factory, &Stmt::block(vec![]), &program, &outputs(&["d"])).unwrap();
    assert_eq!(single(results), Cleartext::Double(vec![1.5, 2.0]));
}

#[test]
fn inputs_must_be_declarations() {
    let factory = DummyCiphertextFactory::default();
    let inputs = Stmt::block(vec![Stmt::assignment(var("a"), int(1))]);
    let err = EvaluatorBuilder::new(&factory).inputs(&inputs).build().err().unwrap();
    assert_eq!(err.kind, EvalErrorKind::Structural);
    assert_eq!(
        err.message,
        "inputs must be a Block of VariableDeclarations, found `a = 1;`"
    );
}

#[test]
fn outputs_must_be_assignments() {
    let factory = DummyCiphertextFactory::default();
    let mut evaluator = EvaluatorBuilder::new(&factory).build().unwrap();
    let err = evaluator
        .get_output(&Stmt::block(vec![decl("int", "y", None)]))
        .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Structural);
    let err = evaluator
        .get_output(&Stmt::assignment(var("y"), int(1)))
        .unwrap_err();
    assert_eq!(err.message, "outputs must be a Block of Assignments, found `y = 1;`");
}

#[test]
fn unsupported_constructs() {
    let factory = DummyCiphertextFactory::default();
    let mut evaluator = EvaluatorBuilder::new(&factory).build().unwrap();
    let function = Stmt::function("f", None, vec![], Stmt::block(vec![]));
    assert_eq!(evaluator.run(&function).unwrap_err().kind, EvalErrorKind::Unsupported);
    let ret = Stmt::return_values(vec![int(1)]);
    assert_eq!(evaluator.run(&ret).unwrap_err().kind, EvalErrorKind::Unsupported);
    let batched = decl("int", "x", Some(Expr::operator(Operator::Add, vec![int(1), int(2)])));
    assert_eq!(evaluator.run(&batched).unwrap_err().kind, EvalErrorKind::Unsupported);
}

#[test]
fn lookup_failures() {
    let factory = DummyCiphertextFactory::default();
    let mut evaluator = EvaluatorBuilder::new(&factory).build().unwrap();
    let err = evaluator.run(&decl("int", "y", Some(var("nope")))).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Unresolved);

    let program = Stmt::block(vec![decl("int", "x", None), decl("int", "y", Some(var("x")))]);
    let err = evaluator.run(&program).unwrap_err();
    assert_eq!(err.message, "`x` is declared but has no value");
}

#[test]
fn ciphertexts_never_reach_cleartext_stores() {
    let factory = DummyCiphertextFactory::default();
    let inputs = Stmt::block(vec![decl("secret int", "s", Some(int(1)))]);
    let mut evaluator = EvaluatorBuilder::new(&factory).inputs(&inputs).build().unwrap();
    let err = evaluator.run(&decl("int", "p", Some(var("s")))).unwrap_err();
    assert_eq!(err.message, "cannot store a ciphertext in non-secret `p`");
}

#[test]
fn rendered_output() {
    let factory = DummyCiphertextFactory::new(2);
    let inputs = Stmt::block(vec![
        decl("secret int", "s", Some(ints(&[1, 2]))),
        decl("int", "p", Some(int(4))),
    ]);
    let mut evaluator = EvaluatorBuilder::new(&factory).inputs(&inputs).build().unwrap();
    let values = evaluator.get_output(&outputs(&["s", "p"])).unwrap();
    assert_eq!(evaluator.render_output(&values).unwrap(), "s: [1, 2]\np: 4\n");
    assert_eq!(evaluator.lookup("p").unwrap().type_name(), "int");
    assert_eq!(evaluator.datatype_of("s").unwrap().to_string(), "secret int");
}
