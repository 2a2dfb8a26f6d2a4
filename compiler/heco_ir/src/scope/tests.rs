#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;

use super::*;

#[test]
fn declare_and_resolve_in_root() {
    let mut scopes = ScopeTree::new();
    let decl = NodeId::fresh();
    let x = scopes.declare("x", decl).unwrap();
    assert_eq!(x, ScopedIdentifier::new(ScopeId::ROOT, "x"));
    assert_eq!(scopes.resolve("x").unwrap(), x);
    assert_eq!(scopes.declared_by(&x), Some(decl));
}

#[test]
fn unresolved_name() {
    let scopes = ScopeTree::new();
    assert_eq!(
        scopes.resolve("missing"),
        Err(ScopeError::Unresolved("missing".to_string()))
    );
}

#[test]
fn shadowing_in_nested_scope() {
    let mut scopes = ScopeTree::new();
    let outer = scopes.declare("x", NodeId::fresh()).unwrap();

    let block = NodeId::fresh();
    let inner_scope = scopes.enter(block);
    assert_eq!(scopes.resolve("x").unwrap(), outer);

    let inner = scopes.declare("x", NodeId::fresh()).unwrap();
    assert_eq!(inner.scope, inner_scope);
    assert_eq!(scopes.resolve("x").unwrap(), inner);
    assert_ne!(inner, outer);

    scopes.exit().unwrap();
    assert_eq!(scopes.resolve("x").unwrap(), outer);
}

#[test]
fn redeclaration_by_another_node_fails() {
    let mut scopes = ScopeTree::new();
    scopes.declare("x", NodeId::fresh()).unwrap();
    assert_eq!(
        scopes.declare("x", NodeId::fresh()),
        Err(ScopeError::Redeclared {
            name: "x".to_string()
        })
    );
}

#[test]
fn redeclaration_by_same_node_rebinds() {
    let mut scopes = ScopeTree::new();
    let decl = NodeId::fresh();
    let first = scopes.declare("i", decl).unwrap();
    let second = scopes.declare("i", decl).unwrap();
    assert_eq!(first, second);
}

#[test]
fn reentering_an_opener_reuses_its_scope() {
    let mut scopes = ScopeTree::new();
    let body = NodeId::fresh();
    let first = scopes.enter(body);
    scopes.declare("tmp", NodeId::fresh()).unwrap();
    scopes.exit().unwrap();

    let second = scopes.enter(body);
    assert_eq!(first, second);
    assert_eq!(scopes.len(), 2);
    assert_eq!(scopes.opener_of(second), Some(body));
    assert_eq!(scopes.parent_of(second), Some(ScopeId::ROOT));
    assert!(scopes.resolve("tmp").is_err());
}

#[test]
fn reentry_forgets_previous_shadowing() {
    let mut scopes = ScopeTree::new();
    let outer = scopes.declare("x", NodeId::fresh()).unwrap();
    let body = NodeId::fresh();
    let inner_decl = NodeId::fresh();

    scopes.enter(body);
    assert_eq!(scopes.resolve("x").unwrap(), outer);
    scopes.declare("x", inner_decl).unwrap();
    scopes.exit().unwrap();

    scopes.enter(body);
    assert_eq!(scopes.resolve("x").unwrap(), outer);
    let inner = scopes.declare("x", inner_decl).unwrap();
    assert_ne!(inner, outer);
}

#[test]
fn exit_root_is_an_error() {
    let mut scopes = ScopeTree::new();
    assert_eq!(scopes.exit(), Err(ScopeError::ExitRoot));
}

#[test]
fn resolve_in_root_ignores_cursor() {
    let mut scopes = ScopeTree::new();
    scopes.enter(NodeId::fresh());
    scopes.declare("local", NodeId::fresh()).unwrap();
    assert!(scopes.resolve("local").is_ok());
    assert!(scopes.resolve_in_root("local").is_err());
}

#[test]
fn display() {
    let id = ScopedIdentifier::new(ScopeId::ROOT, "x");
    assert_eq!(id.to_string(), "scope0::x");
}
