//! Unit tests for error handling.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::SourceLocation;
use std::rc::Rc;

fn location(line: u32, column: u32) -> SourceLocation {
    SourceLocation::new(Rc::new("test.syl".to_string()), line, column)
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "$".to_string(),
        },
        location(3, 7),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_location().line, 3);
    assert_eq!(error.get_location().column, 7);
    assert_eq!(error.get_tip(), ErrorTip::None);
}

#[test]
fn test_return_type_overload_message() {
    let error = Error::new(
        ErrorImpl::ReturnTypeOverload {
            function: "f".to_string(),
        },
        location(2, 6),
    );

    assert!(error
        .get_tip()
        .to_string()
        .contains("cannot differentiate by return type"));
    assert!(error
        .to_string()
        .contains("cannot differentiate by return type"));
}

#[test]
fn test_non_lvalue_reference_message() {
    let error = Error::new(ErrorImpl::NonLValueReference, location(1, 1));
    assert_eq!(
        error.get_tip().to_string(),
        "Cannot take reference of non-lvalue"
    );
    assert_eq!(
        error.kind().to_string(),
        "cannot take reference of non-lvalue"
    );
}

#[test]
fn test_internal_errors_are_flagged() {
    let error = Error::internal("node has no type");
    assert!(error.is_internal());
    assert_eq!(error.get_error_name(), "InternalError");
    assert_eq!(error.get_location().filename.as_str(), "<internal>");

    let error = Error::new(
        ErrorImpl::VariableNotDeclared {
            variable: "x".to_string(),
        },
        location(1, 1),
    );
    assert!(!error.is_internal());
}

#[test]
fn test_display_includes_location() {
    let error = Error::new(
        ErrorImpl::TypeMatchError {
            expected: "i32".to_string(),
            received: "bool".to_string(),
        },
        location(4, 12),
    );

    assert_eq!(
        error.to_string(),
        "test.syl:4:12: types do not match: expected i32, received bool"
    );
}

#[test]
fn test_tip_display() {
    let tip = ErrorTip::Suggestion("Try this".to_string());
    assert_eq!(format!("{}", tip), "Try this");
    assert_eq!(format!("{}", ErrorTip::None), "");
}
