//! Unit tests for the parser module.
//!
//! Covers the type grammar, the structure pass with overload verification and
//! top level recovery, and function bodies: scoping, operators, unary chains,
//! calls and statement recovery.

use pretty_assertions::assert_eq;

use crate::{
    ast::{
        ast::{Callee, NodeKind},
        types::{Type, TypeTable},
    },
    config::CompileOptions,
    errors::errors::{Error, ErrorImpl},
    lexer::{lexer::scan, source::MemoryLoader, tokens::{TagKind, Token}},
    type_checker::type_checker::{type_of, TypeContext},
};

use super::{
    expr::{parse_function_body, FunctionBody},
    parser::Parser,
    structure::{structure_pass, FunctionId, Module},
    types::parse_type,
};

fn tokenize(source: &str) -> Vec<Token> {
    let loader = MemoryLoader::new().with_file("test.syl", source);
    let (tokens, errors) = scan("test.syl", &loader, &CompileOptions::default());
    assert!(errors.is_empty(), "unexpected scan diagnostics: {:?}", errors);
    tokens
}

fn type_from(source: &str) -> Result<Type, Error> {
    let tokens = tokenize(source);
    let end = tokens[tokens.len() - 1].location.clone();
    let mut parser = Parser::new(&tokens, end);
    parse_type(&mut parser, &TypeTable::new())
}

fn structure(source: &str) -> (Module, Vec<Error>) {
    structure_pass(tokenize(source), &CompileOptions::default())
}

fn function_names(module: &Module) -> Vec<String> {
    module
        .functions()
        .map(|(_, function)| function.name.value.clone())
        .collect()
}

fn body_with_options(source: &str, name: &str, options: &CompileOptions) -> (Module, FunctionBody) {
    let (module, errors) = structure(source);
    assert!(errors.is_empty(), "unexpected structure diagnostics: {:?}", errors);

    let function = module
        .functions()
        .find(|(_, function)| function.name.value == name)
        .map(|(_, function)| function.clone())
        .expect("function is declared");
    let body = parse_function_body(&module, &function, options).expect("no internal error");
    (module, body)
}

fn body(source: &str, name: &str) -> (Module, FunctionBody) {
    body_with_options(source, name, &CompileOptions::default())
}

/// Parses `name` expecting success and returns its tree dump.
fn dump(source: &str, name: &str) -> String {
    let (_, body) = body(source, name);
    assert!(body.diagnostics.is_empty(), "unexpected diagnostics: {:?}", body.diagnostics);
    body.ast.expect("body parsed").to_string()
}

fn body_type(source: &str, name: &str) -> Type {
    let (module, body) = body(source, name);
    assert!(body.diagnostics.is_empty(), "unexpected diagnostics: {:?}", body.diagnostics);
    let ctx = TypeContext {
        module: &module,
        frames: &body.frames,
    };
    type_of(&ctx, body.ast.as_ref().expect("body parsed")).expect("body has a type")
}

/// Parses `name` expecting exactly one diagnostic and returns it.
fn body_error(source: &str, name: &str) -> Error {
    let (_, body) = body(source, name);
    assert!(body.ast.is_none());
    assert_eq!(body.diagnostics.len(), 1, "diagnostics: {:?}", body.diagnostics);
    body.diagnostics[0].clone()
}

#[test]
fn test_parse_pointer_type() {
    let ty = type_from("i32 ptr ptr").unwrap();
    assert_eq!(ty, Type::pointer(Type::pointer(Type::integer(32, true))));
}

#[test]
fn test_parse_array_type() {
    let ty = type_from("i32[4]").unwrap();
    assert_eq!(ty, Type::array(Type::integer(32, true), 4));
    assert_eq!(ty.size(8), Some(16));

    let huge = type_from("i64[3000000000000000000]").unwrap();
    assert_eq!(huge.size(8), None);
}

#[test]
fn test_parse_sum_type() {
    let ty = type_from("i32 or bool").unwrap();
    assert_eq!(ty, Type::Sum(vec![Type::integer(32, true), Type::Bool]));
    assert_eq!(ty.size(8), Some(5));
}

#[test]
fn test_parse_function_pointer_type() {
    let ty = type_from("(i32, bool) -> string").unwrap();
    assert_eq!(
        ty,
        Type::function_pointer(vec![Type::integer(32, true), Type::Bool], Type::String)
    );

    let grouped = type_from("(i32 or bool) ptr").unwrap();
    assert_eq!(grouped.to_string(), "(i32 or bool) ptr");

    assert_eq!(type_from("(u8)").unwrap(), Type::integer(8, false));
}

#[test]
fn test_parse_type_errors() {
    let error = type_from("(i32, bool)").unwrap_err();
    assert!(matches!(error.kind(), ErrorImpl::ExpectedArrow { .. }));

    let error = type_from("foo").unwrap_err();
    assert_eq!(
        error.kind(),
        &ErrorImpl::UnknownType {
            type_: String::from("foo")
        }
    );

    let error = type_from("i32[1.5]").unwrap_err();
    assert!(matches!(error.kind(), ErrorImpl::InvalidArrayLength { .. }));
}

#[test]
fn test_structure_collects_overloads() {
    let (module, errors) = structure("func f(x: i32) = x\nfunc f(x: i32, y: i32) = x\n");
    assert!(errors.is_empty());
    assert_eq!(module.overloads("f").len(), 2);
    assert!(module.is_function_with_arity("f", 2));
    assert!(module.verify().is_empty());

    let (_, first) = module.functions().next().unwrap();
    assert_eq!(first.signature.argument_types, vec![Type::integer(32, true)]);
    assert_eq!(first.signature.return_type, Type::None);
}

#[test]
fn test_verify_return_type_overload() {
    let (module, errors) = structure("func f(x: i32) -> bool = true\nfunc f(x: i32) -> i32 = x\n");
    assert!(errors.is_empty());

    let errors = module.verify();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .to_string()
        .contains("cannot differentiate by return type"));
    assert_eq!(errors[0].get_location().line, 2);
}

#[test]
fn test_verify_duplicate_definition() {
    let (module, _) = structure("func f(x: i32) = x\nfunc g() = 1\nfunc f(y: i32) = y\n");

    let errors = module.verify();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].kind(),
        &ErrorImpl::DuplicateOverload {
            function: String::from("f")
        }
    );
    assert_eq!(errors[0].get_location().line, 3);
}

#[test]
fn test_structure_recovers_after_bad_line() {
    let source = "# header\n\nusing Int = i32\n\nreturn 5 oops\nfunc c(x: Int) -> Int {\n    return x\n}\nfunc d() -> Int = c(1)\n";
    let (module, errors) = structure(source);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_location().line, 5);
    assert!(matches!(
        errors[0].kind(),
        ErrorImpl::UnexpectedTokenAtTopLevel { .. }
    ));
    assert_eq!(function_names(&module), vec!["c", "d"]);
    assert_eq!(module.types.get("Int"), Some(&Type::integer(32, true)));
}

#[test]
fn test_structure_skips_body_of_broken_header() {
    let source = "func broken(x: nope) {\n    return x\n}\nfunc fine() = 1\n";
    let (module, errors) = structure(source);

    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0].kind(), ErrorImpl::UnknownType { .. }));
    assert_eq!(function_names(&module), vec!["fine"]);
}

#[test]
fn test_structure_records_tags() {
    let (module, errors) = structure("@prefix @postfix func neg(x: i32) -> i32 = x\n");
    assert!(errors.is_empty());

    let (_, neg) = module.functions().next().unwrap();
    assert_eq!(neg.signature.tags, vec![TagKind::Prefix, TagKind::Postfix]);
    assert!(!neg.signature.usable_as(TagKind::Infix));
    assert_eq!(neg.signature.to_string(), "@prefix @postfix (i32) -> i32");

    let (module, errors) = structure("@infix using x = i32\nfunc f() = 1\n");
    assert_eq!(errors.len(), 1);
    assert_eq!(function_names(&module), vec!["f"]);
}

#[test]
fn test_structure_declaration_errors() {
    let (_, errors) = structure("func f(a: i32, a: bool) = a\n");
    assert_eq!(
        errors[0].kind(),
        &ErrorImpl::VariableAlreadyDeclared {
            variable: String::from("a")
        }
    );

    let (_, errors) = structure("using i32 = bool\n");
    assert!(matches!(errors[0].kind(), ErrorImpl::TypeAlreadyDefined { .. }));

    let (_, errors) = structure("func f() {\n    return 1\n");
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0].kind(), ErrorImpl::UnexpectedEof { .. }));
    assert_eq!(errors[0].get_location().line, 1);
}

#[test]
fn test_structure_collects_classes() {
    let (module, errors) = structure("class Point {\n    x: i32\n}\nalias Size = u64\nfunc f() = 1\n");
    assert!(errors.is_empty());
    assert_eq!(module.classes().len(), 1);
    assert_eq!(module.classes()[0].name.value, "Point");
    assert_eq!(module.types.get("Size"), Some(&Type::integer(64, false)));
    assert_eq!(function_names(&module), vec!["f"]);
}

#[test]
fn test_if_branch_scopes() {
    let source = "func f(c: bool) -> i32 {\n    if c then {\n        x: i32 = 1\n    } else {\n        return x\n    }\n    return 0\n}\n";
    let error = body_error(source, "f");
    assert_eq!(
        error.kind(),
        &ErrorImpl::VariableNotDeclared {
            variable: String::from("x")
        }
    );
    assert_eq!(error.get_location().line, 5);

    let source = "func f(c: bool) -> i32 {\n    if c then { x: i32 = 1 }\n    return x\n}\n";
    let error = body_error(source, "f");
    assert_eq!(error.get_location().line, 3);
}

#[test]
fn test_nested_block_sees_enclosing_declarations() {
    let source = "func f() -> i32 {\n    y: i32 = 2\n    {\n        return y\n    }\n}\n";
    let (_, body) = body(source, "f");
    assert!(body.diagnostics.is_empty(), "{:?}", body.diagnostics);
}

#[test]
fn test_redeclaration_in_same_block() {
    let source = "func f() {\n    y: i32 = 2\n    y: bool = true\n}\n";
    let error = body_error(source, "f");
    assert!(matches!(error.kind(), ErrorImpl::VariableAlreadyDeclared { .. }));
    assert_eq!(error.get_location().line, 3);
}

#[test]
fn test_reference_rules() {
    let error = body_error("func f() {\n    p: i32 ptr = ref 5\n}\n", "f");
    assert_eq!(error.kind(), &ErrorImpl::NonLValueReference);
    assert!(error.to_string().contains("cannot take reference of non-lvalue"));

    let ty = body_type("func f(a: i32) -> i32 ptr = ref a\n", "f");
    assert_eq!(ty, Type::pointer(Type::integer(32, true)));
}

#[test]
fn test_dereference_rules() {
    let error = body_error("func f(a: i32) = deref a\n", "f");
    assert!(matches!(error.kind(), ErrorImpl::DereferenceNonPointer { .. }));

    let error = body_error("func f(a: i32[4]) = deref a\n", "f");
    assert!(matches!(error.kind(), ErrorImpl::DereferenceArray { .. }));

    let ty = body_type("func f(a: i32 ptr) -> i32 = deref a\n", "f");
    assert_eq!(ty, Type::integer(32, true));
}

#[test]
fn test_binary_precedence() {
    let tree = dump("func f(a: i32, b: i32) -> bool = a + b * 2 < a\n", "f");
    assert_eq!(
        tree,
        "BinaryOp <\n  BinaryOp +\n    Identifier a\n    BinaryOp *\n      Identifier b\n      Literal 2\n  Identifier a\n"
    );
}

#[test]
fn test_assignment_rules() {
    let error = body_error("func f() {\n    1 = 2\n}\n", "f");
    assert_eq!(error.kind(), &ErrorImpl::NonLValueAssignment);

    let error = body_error("func f(a: i32) {\n    a = true\n}\n", "f");
    assert_eq!(
        error.kind(),
        &ErrorImpl::TypeMatchError {
            expected: String::from("i32"),
            received: String::from("bool")
        }
    );

    let error = body_error("func f(a: i32, b: bool) = a + b\n", "f");
    assert!(matches!(error.kind(), ErrorImpl::InvalidOperands { .. }));
}

#[test]
fn test_unary_chain_order() {
    let source = "@prefix func neg(x: i32) -> i32 = x\n@postfix func squared(x: i32) -> i32 = x\nfunc g(a: i32) -> i32 = neg a squared\n";
    assert_eq!(
        dump(source, "g"),
        "FunctionCall squared\n  FunctionCall neg\n    Identifier a\n"
    );
}

#[test]
fn test_unary_chain_mismatch() {
    let source = "func neg(x: i32) -> i32 = x\nfunc show(x: i32) -> string = \"i32\"\nfunc h(a: i32) -> i32 = neg show a\n";
    let error = body_error(source, "h");
    assert_eq!(
        error.kind(),
        &ErrorImpl::UnaryChainMismatch {
            outer: String::from("neg"),
            inner: String::from("show"),
            expected: String::from("i32"),
            found: String::from("string"),
        }
    );
}

#[test]
fn test_unary_tags_restrict_position() {
    let source = "@postfix func squared(x: i32) -> i32 = x\nfunc k(a: i32) -> i32 = squared a\n";
    let error = body_error(source, "k");
    assert_eq!(
        error.kind(),
        &ErrorImpl::VariableNotDeclared {
            variable: String::from("squared")
        }
    );

    let source = "@postfix func squared(x: i32) -> i32 = x\nfunc m(a: i32) -> i32 = squared(a)\n";
    assert_eq!(dump(source, "m"), "FunctionCall squared\n  Identifier a\n");
}

#[test]
fn test_operator_named_unary_keeps_binary_use() {
    let unary = "func -(x: i32) -> i32 = x\n";

    let source = format!("{}func sub(a: i32, b: i32) -> i32 {{ return a - b }}\n", unary);
    assert_eq!(
        dump(&source, "sub"),
        "Block\n  Return\n    BinaryOp -\n      Identifier a\n      Identifier b\n"
    );

    let source = format!("{}func negate(a: i32) -> i32 = - a\n", unary);
    assert_eq!(dump(&source, "negate"), "FunctionCall -\n  Identifier a\n");

    let source = format!("{}func trailing(a: i32) -> i32 = a -\n", unary);
    assert_eq!(dump(&source, "trailing"), "FunctionCall -\n  Identifier a\n");
}

#[test]
fn test_infix_function() {
    let source = "@infix func max(a: i32, b: i32) -> i32 = a\nfunc n(a: i32, b: i32) -> i32 = a max b + 1\n";
    let (_, body) = body(source, "n");
    assert!(body.diagnostics.is_empty(), "{:?}", body.diagnostics);

    let ast = body.ast.unwrap();
    assert_eq!(
        ast.to_string(),
        "BinaryOp max\n  Identifier a\n  BinaryOp +\n    Identifier b\n    Literal 1\n"
    );
    match ast.kind {
        NodeKind::BinaryOp { function, .. } => assert_eq!(function, Some(FunctionId(0))),
        other => panic!("expected a binary op, got {:?}", other),
    }
}

#[test]
fn test_overload_resolution() {
    let source = "func p(x: i32) -> i32 = x\nfunc p(x: bool) -> bool = x\nfunc q(b: bool) -> bool = p(b)\nfunc r() = p(\"s\")\n";

    let (_, body_q) = body(source, "q");
    match body_q.ast.map(|ast| ast.kind) {
        Some(NodeKind::FunctionCall {
            callee: Callee::Function { id, .. },
            ..
        }) => assert_eq!(id, FunctionId(1)),
        other => panic!("expected a call, got {:?}", other),
    }

    let error = body_error(source, "r");
    assert_eq!(
        error.kind(),
        &ErrorImpl::NoMatchingOverload {
            function: String::from("p"),
            arguments: String::from("string")
        }
    );
}

#[test]
fn test_forward_reference() {
    let ty = body_type("func a() -> i32 = b()\nfunc b() -> i32 = 1\n", "a");
    assert_eq!(ty, Type::integer(32, true));
}

#[test]
fn test_pointer_calls() {
    let source = "func apply(f: (i32) -> i32, x: i32) -> i32 = f(x)\nfunc bad(x: i32) -> i32 = x(1)\n";
    assert_eq!(body_type(source, "apply"), Type::integer(32, true));

    let error = body_error(source, "bad");
    assert!(matches!(error.kind(), ErrorImpl::NotCallable { .. }));
}

#[test]
fn test_index_rules() {
    let ty = body_type("func f(a: i32[4]) -> i32 = a[1]\n", "f");
    assert_eq!(ty, Type::integer(32, true));

    let error = body_error("func f(a: i32) = a[0]\n", "f");
    assert!(matches!(error.kind(), ErrorImpl::IndexNonPointer { .. }));

    let error = body_error("func f(a: i32 ptr, b: bool) = a[b]\n", "f");
    assert!(matches!(error.kind(), ErrorImpl::TypeMatchError { .. }));
}

#[test]
fn test_is_and_as() {
    assert_eq!(body_type("func f(a: i32) -> double = a as double\n", "f"), Type::float(64));
    assert_eq!(body_type("func f(v: i32 or bool) -> bool = v is i32\n", "f"), Type::Bool);
}

#[test]
fn test_if_expression_type() {
    let ty = body_type("func f(c: bool) = if c then 1 else true\n", "f");
    assert_eq!(ty, Type::Sum(vec![Type::integer(64, true), Type::Bool]));

    let error = body_error("func f(c: i32) = if c then 1 else 2\n", "f");
    assert!(matches!(error.kind(), ErrorImpl::ConditionNotBool { .. }));
}

#[test]
fn test_loops() {
    let source = "func f() -> i32 {\n    total: i32 = 0\n    for i: i32 = 0; i < 10; i = i + 1 do {\n        total = total + i\n    }\n    while total > 100 do {\n        break\n    }\n    return total\n}\n";
    let (_, body) = body(source, "f");
    assert!(body.diagnostics.is_empty(), "{:?}", body.diagnostics);

    let error = body_error("func f() {\n    break\n}\n", "f");
    assert!(matches!(error.kind(), ErrorImpl::LoopControlOutsideLoop { .. }));

    let error = body_error("func f() {\n    while 1 do { }\n}\n", "f");
    assert!(matches!(error.kind(), ErrorImpl::ConditionNotBool { .. }));
}

#[test]
fn test_return_type_checked() {
    let error = body_error("func f() -> i32 {\n    return true\n}\n", "f");
    assert!(matches!(error.kind(), ErrorImpl::TypeMatchError { .. }));

    let (_, body) = body("func f() {\n    return\n}\n", "f");
    assert!(body.diagnostics.is_empty(), "{:?}", body.diagnostics);
}

#[test]
fn test_block_recovers_after_bad_statement() {
    let source = "func f(a: i32) -> i32 {\n    b: i32 = )\n    c: i32 = a\n    return c\n}\n";
    let error = body_error(source, "f");
    assert!(matches!(error.kind(), ErrorImpl::ExpectedExpression { .. }));
    assert_eq!(error.get_location().line, 2);
}

#[test]
fn test_unknown_declaration_type_reported_once() {
    let source = "func f() {\n    x: Foo = 1\n    x = 2\n    y: i32 = x\n}\n";
    let error = body_error(source, "f");
    assert_eq!(
        error.kind(),
        &ErrorImpl::UnknownType {
            type_: String::from("Foo")
        }
    );
    assert_eq!(error.get_location().line, 2);
}

#[test]
fn test_block_stops_at_diagnostic_limit() {
    let source = "func f() {\n    x = 1\n    y = 2\n    z = 3\n    w = 4\n}\n";
    let options = CompileOptions::default().with_max_diagnostics(2);
    let (_, body) = body_with_options(source, "f", &options);

    assert!(body.ast.is_none());
    assert_eq!(body.diagnostics.len(), 2);
}

#[test]
fn test_trailing_tokens_in_expression_body() {
    let error = body_error("func f(a: i32) -> i32 = a a\n", "f");
    assert!(matches!(error.kind(), ErrorImpl::UnexpectedToken { .. }));
}
