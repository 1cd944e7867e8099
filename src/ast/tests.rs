//! Unit tests for types and AST nodes.

use std::rc::Rc;

use pretty_assertions::assert_eq;

use crate::{
    lexer::tokens::{IdentifierKind, LiteralKind, Token, TokenDetail, TokenKind},
    type_checker::frames::FrameId,
    SourceLocation, MK_TOKEN,
};

use super::{
    ast::{Node, NodeKind, NodeTraits},
    types::{Type, TypeTable},
};

fn location() -> SourceLocation {
    SourceLocation::new(Rc::new(String::from("test.syl")), 1, 1)
}

fn literal(value: &str) -> Node {
    let token = MK_TOKEN!(
        TokenKind::Literal,
        TokenDetail::Literal(LiteralKind::Int { unsigned: false }),
        value.to_string(),
        location()
    );
    Node::new(NodeKind::Literal(token), FrameId::ROOT, location())
}

fn identifier(value: &str) -> Node {
    let token = MK_TOKEN!(
        TokenKind::Identifier,
        TokenDetail::Identifier(IdentifierKind::Plain),
        value.to_string(),
        location()
    );
    Node::new(NodeKind::Identifier(token), FrameId::ROOT, location())
}

#[test]
fn test_type_sizes() {
    let i32_type = Type::integer(32, true);

    assert_eq!(i32_type.size(8), Some(4));
    assert_eq!(Type::Bool.size(8), Some(1));
    assert_eq!(Type::String.size(4), Some(4));
    assert_eq!(Type::pointer(Type::float(64)).size(8), Some(8));
    assert_eq!(Type::array(Type::float(64), 3).size(8), Some(24));
    assert_eq!(Type::sum(vec![Type::float(64), Type::Bool]).size(8), Some(9));
    assert_eq!(Type::None.size(8), Some(0));
}

#[test]
fn test_sum_flattens_and_unwraps() {
    let i32_type = Type::integer(32, true);

    let nested = Type::sum(vec![
        Type::sum(vec![i32_type.clone(), Type::Bool]),
        Type::String,
        Type::Bool,
    ]);
    assert_eq!(nested, Type::Sum(vec![i32_type.clone(), Type::Bool, Type::String]));
    assert_eq!(Type::sum(vec![i32_type.clone(), i32_type.clone()]), i32_type);

    // Repeats collapse before sizing, so no tag byte is added
    let repeated = Type::sum(vec![i32_type.clone(), Type::sum(vec![i32_type.clone()])]);
    assert_eq!(repeated.size(8), Some(4));
}

#[test]
fn test_size_overflow() {
    let huge = Type::array(Type::integer(64, true), 3_000_000_000_000_000_000);
    assert_eq!(huge.size(8), None);

    let nested = Type::array(Type::array(Type::Byte, u64::MAX), 2);
    assert_eq!(nested.size(8), None);
    assert_eq!(Type::sum(vec![nested, Type::Bool]).size(8), None);
    assert_eq!(Type::array(Type::Byte, u64::MAX).size(8), Some(u64::MAX));
}

#[test]
fn test_type_display() {
    let function = Type::function_pointer(vec![Type::integer(8, false)], Type::Bool);

    assert_eq!(Type::pointer(Type::integer(64, true)).to_string(), "i64 ptr");
    assert_eq!(Type::array(Type::Byte, 16).to_string(), "byte[16]");
    assert_eq!(function.to_string(), "(u8) -> bool");
    assert_eq!(Type::pointer(function.clone()).to_string(), "((u8) -> bool) ptr");
    assert_eq!(
        Type::sum(vec![function, Type::None]).to_string(),
        "((u8) -> bool) or None"
    );
}

#[test]
fn test_type_table() {
    let mut types = TypeTable::new();

    assert_eq!(types.get("u16"), Some(&Type::integer(16, false)));
    assert_eq!(types.get("double"), Some(&Type::float(64)));
    assert!(types.define("Handle", Type::pointer(Type::Byte)));
    assert!(!types.define("Handle", Type::Bool));
    assert_eq!(types.get("Handle"), Some(&Type::pointer(Type::Byte)));
    assert!(!types.define("bool", Type::Byte));
}

#[test]
fn test_node_traits() {
    assert_eq!(literal("1").traits(), NodeTraits::CONSTANT);
    assert!(identifier("a").is_lvalue());
    assert!(!literal("1").is_lvalue());

    let index = Node::new(
        NodeKind::Index {
            of: Box::new(identifier("a")),
            by: Box::new(literal("0")),
        },
        FrameId::ROOT,
        location(),
    );
    assert!(index.is_lvalue());

    let reference = Node::new(
        NodeKind::Reference(Box::new(identifier("a"))),
        FrameId::ROOT,
        location(),
    );
    assert!(!reference.is_lvalue());
    assert!(!reference.is_constant());
}

#[test]
fn test_node_tree_dump() {
    let block = Node::new(
        NodeKind::Block(vec![Node::new(
            NodeKind::Return(Box::new(identifier("a"))),
            FrameId::ROOT,
            location(),
        )]),
        FrameId::ROOT,
        location(),
    );

    assert_eq!(block.to_string(), "Block\n  Return\n    Identifier a\n");
}
