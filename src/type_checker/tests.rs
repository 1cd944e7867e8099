//! Unit tests for scopes and type rules.

use std::rc::Rc;

use pretty_assertions::assert_eq;

use crate::{
    ast::types::Type,
    errors::errors::ErrorImpl,
    lexer::tokens::{IdentifierKind, Token, TokenDetail, TokenKind},
    SourceLocation, MK_TOKEN,
};

use super::{
    frames::{FrameArena, FrameId},
    type_checker::{binary_result_type, is_assignable},
};

fn name(value: &str, line: u32) -> Token {
    MK_TOKEN!(
        TokenKind::Identifier,
        TokenDetail::Identifier(IdentifierKind::Plain),
        value.to_string(),
        SourceLocation::new(Rc::new(String::from("test.syl")), line, 1)
    )
}

#[test]
fn test_lookup_walks_parent_chain() {
    let mut frames = FrameArena::new();
    let function = frames.push_child(FrameId::ROOT);
    let block = frames.push_child(function);

    frames.declare(function, name("a", 1), Type::Bool).unwrap();

    assert_eq!(frames.parent(block), Some(function));
    assert_eq!(frames.lookup(block, "a").map(|symbol| &symbol.ty), Some(&Type::Bool));
    assert!(frames.lookup_local(block, "a").is_none());
    assert!(frames.lookup(FrameId::ROOT, "a").is_none());
}

#[test]
fn test_siblings_do_not_share_symbols() {
    let mut frames = FrameArena::new();
    let condition = frames.push_child(FrameId::ROOT);
    let body = frames.push_child(condition);
    let else_body = frames.push_child(condition);

    frames.declare(body, name("x", 2), Type::integer(32, true)).unwrap();

    assert!(frames.lookup(body, "x").is_some());
    assert!(frames.lookup(else_body, "x").is_none());
    assert!(frames.lookup(condition, "x").is_none());
}

#[test]
fn test_shadowing_and_redeclaration() {
    let mut frames = FrameArena::new();
    let outer = frames.push_child(FrameId::ROOT);
    let inner = frames.push_child(outer);

    frames.declare(outer, name("x", 1), Type::Bool).unwrap();
    frames.declare(inner, name("x", 2), Type::String).unwrap();
    assert_eq!(frames.lookup(inner, "x").map(|symbol| &symbol.ty), Some(&Type::String));

    let error = frames.declare(inner, name("x", 3), Type::Bool).unwrap_err();
    assert_eq!(
        error.kind(),
        &ErrorImpl::VariableAlreadyDeclared {
            variable: String::from("x")
        }
    );
    assert_eq!(error.get_location().line, 3);

    let error = frames.declare(FrameId(99), name("y", 1), Type::Bool).unwrap_err();
    assert!(error.is_internal());
}

#[test]
fn test_assignability() {
    let i32_type = Type::integer(32, true);
    let i64_type = Type::integer(64, true);

    assert!(is_assignable(&i32_type, &i32_type, false));
    assert!(is_assignable(&i32_type, &i64_type, true));
    assert!(!is_assignable(&i32_type, &i64_type, false));
    assert!(!is_assignable(&i32_type, &Type::float(64), true));
    assert!(is_assignable(&Type::Error, &Type::Bool, false));

    let sum = Type::sum(vec![i32_type.clone(), Type::Bool]);
    assert!(is_assignable(&sum, &Type::Bool, false));
    assert!(!is_assignable(&sum, &Type::String, false));
}

#[test]
fn test_builtin_operators() {
    let i32_type = Type::integer(32, true);
    let i64_type = Type::integer(64, true);

    assert_eq!(
        binary_result_type("+", &i32_type, &i64_type, false, true),
        Some(i32_type.clone())
    );
    assert_eq!(
        binary_result_type("*", &i64_type, &i32_type, true, false),
        Some(i32_type.clone())
    );
    assert_eq!(binary_result_type("+", &i32_type, &i64_type, false, false), None);
    assert_eq!(
        binary_result_type("<", &i32_type, &i32_type, false, false),
        Some(Type::Bool)
    );
    assert_eq!(
        binary_result_type("==", &Type::Bool, &Type::Bool, false, false),
        Some(Type::Bool)
    );
    assert_eq!(
        binary_result_type("&&", &Type::Bool, &Type::Bool, false, false),
        Some(Type::Bool)
    );
    assert_eq!(binary_result_type("&&", &i32_type, &Type::Bool, false, false), None);
    assert_eq!(
        binary_result_type("&", &Type::float(32), &Type::float(32), false, false),
        None
    );
    assert_eq!(
        binary_result_type("<<", &i32_type, &i64_type, false, true),
        Some(i32_type.clone())
    );
    assert_eq!(
        binary_result_type("+", &Type::Error, &Type::Bool, false, false),
        Some(Type::Error)
    );
    assert_eq!(binary_result_type("max", &i32_type, &i32_type, false, false), None);
}
