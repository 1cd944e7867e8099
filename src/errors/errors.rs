use std::fmt::Display;

use thiserror::Error;

use crate::SourceLocation;

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    location: SourceLocation,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, location: SourceLocation) -> Self {
        Error {
            internal_error: error_impl,
            location,
        }
    }

    /// Shorthand for a compiler defect with no place in user source.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::new(
            ErrorImpl::Internal {
                message: message.into(),
            },
            SourceLocation::internal(),
        )
    }

    pub fn get_location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    /// Internal errors are compiler defects and bypass every recovery boundary.
    pub fn is_internal(&self) -> bool {
        matches!(self.internal_error, ErrorImpl::Internal { .. })
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::FileNotFound { .. } => "FileNotFound",
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnterminatedString => "UnterminatedString",
            ErrorImpl::InvalidEscape { .. } => "InvalidEscape",
            ErrorImpl::UnknownTag { .. } => "UnknownTag",
            ErrorImpl::ExpectedIncludePath { .. } => "ExpectedIncludePath",
            ErrorImpl::UnexpectedEof { .. } => "UnexpectedEof",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenAtTopLevel { .. } => "UnexpectedTokenAtTopLevel",
            ErrorImpl::ExpectedExpression { .. } => "ExpectedExpression",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::ExpectedArrow { .. } => "ExpectedArrow",
            ErrorImpl::InvalidArrayLength { .. } => "InvalidArrayLength",
            ErrorImpl::TypeAlreadyDefined { .. } => "TypeAlreadyDefined",
            ErrorImpl::DuplicateOverload { .. } => "DuplicateOverload",
            ErrorImpl::ReturnTypeOverload { .. } => "ReturnTypeOverload",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::NoMatchingOverload { .. } => "NoMatchingOverload",
            ErrorImpl::AmbiguousCall { .. } => "AmbiguousCall",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::UnaryChainMismatch { .. } => "UnaryChainMismatch",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::ConditionNotBool { .. } => "ConditionNotBool",
            ErrorImpl::NonLValueReference => "NonLValueReference",
            ErrorImpl::NonLValueAssignment => "NonLValueAssignment",
            ErrorImpl::DereferenceNonPointer { .. } => "DereferenceNonPointer",
            ErrorImpl::DereferenceArray { .. } => "DereferenceArray",
            ErrorImpl::IndexNonPointer { .. } => "IndexNonPointer",
            ErrorImpl::InvalidOperands { .. } => "InvalidOperands",
            ErrorImpl::LoopControlOutsideLoop { .. } => "LoopControlOutsideLoop",
            ErrorImpl::Internal { .. } => "InternalError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::FileNotFound { file } => {
                ErrorTip::Suggestion(format!("Cannot find file `{}`", file))
            }
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnterminatedString => ErrorTip::Suggestion(String::from(
                "String literal is missing its closing `\"` on this line",
            )),
            ErrorImpl::InvalidEscape { escape } => ErrorTip::Suggestion(format!(
                "Unknown escape `\\{}`, expected one of \\n \\t \\\" \\\\ \\0",
                escape
            )),
            ErrorImpl::UnknownTag { tag } => ErrorTip::Suggestion(format!(
                "Unknown tag `{}`, expected @prefix, @infix or @postfix",
                tag
            )),
            ErrorImpl::ExpectedIncludePath { directive } => ErrorTip::Suggestion(format!(
                "`{}` must be followed by a string naming the file",
                directive
            )),
            ErrorImpl::UnexpectedEof { context } => {
                ErrorTip::Suggestion(format!("Reached end of file while parsing {}", context))
            }
            ErrorImpl::UnexpectedToken { expected, found } => ErrorTip::Suggestion(format!(
                "Expected {}, found `{}`",
                expected, found
            )),
            ErrorImpl::UnexpectedTokenAtTopLevel { token } => ErrorTip::Suggestion(format!(
                "Unexpected token at top level: `{}`",
                token
            )),
            ErrorImpl::ExpectedExpression { found } => {
                ErrorTip::Suggestion(format!("Expected an expression, found `{}`", found))
            }
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::ExpectedArrow { found } => ErrorTip::Suggestion(format!(
                "Expected `->` after a list of argument types, found `{}`",
                found
            )),
            ErrorImpl::InvalidArrayLength { token } => ErrorTip::Suggestion(format!(
                "Array length must be an unsigned integer literal, found `{}`",
                token
            )),
            ErrorImpl::TypeAlreadyDefined { type_ } => {
                ErrorTip::Suggestion(format!("Type `{}` is already defined", type_))
            }
            ErrorImpl::DuplicateOverload { function } => ErrorTip::Suggestion(format!(
                "Duplicate definition of `{}` with the same argument types",
                function
            )),
            ErrorImpl::ReturnTypeOverload { function } => ErrorTip::Suggestion(format!(
                "Overloads of `{}` cannot differentiate by return type",
                function
            )),
            ErrorImpl::VariableAlreadyDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` already declared", variable))
            }
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("Use of undefined identifier `{}`", variable))
            }
            ErrorImpl::NoMatchingOverload {
                function,
                arguments,
            } => ErrorTip::Suggestion(format!(
                "No overload of `{}` accepts ({})",
                function, arguments
            )),
            ErrorImpl::AmbiguousCall { function } => ErrorTip::Suggestion(format!(
                "Call to `{}` matches more than one overload",
                function
            )),
            ErrorImpl::NotCallable { name, type_ } => ErrorTip::Suggestion(format!(
                "`{}` has type `{}` and cannot be called",
                name, type_
            )),
            ErrorImpl::UnaryChainMismatch {
                outer,
                inner,
                expected,
                found,
            } => ErrorTip::Suggestion(format!(
                "`{}` expects `{}` but `{}` produces `{}`",
                outer, expected, inner, found
            )),
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::ConditionNotBool { construct, found } => ErrorTip::Suggestion(format!(
                "Condition of `{}` must be `bool`, found `{}`",
                construct, found
            )),
            ErrorImpl::NonLValueReference => {
                ErrorTip::Suggestion(String::from("Cannot take reference of non-lvalue"))
            }
            ErrorImpl::NonLValueAssignment => {
                ErrorTip::Suggestion(String::from("Cannot assign to non-lvalue"))
            }
            ErrorImpl::DereferenceNonPointer { type_ } => ErrorTip::Suggestion(format!(
                "Cannot dereference non-pointer type `{}`",
                type_
            )),
            ErrorImpl::DereferenceArray { type_ } => ErrorTip::Suggestion(format!(
                "Cannot dereference array `{}`, index it instead",
                type_
            )),
            ErrorImpl::IndexNonPointer { type_ } => {
                ErrorTip::Suggestion(format!("Cannot index into type `{}`", type_))
            }
            ErrorImpl::InvalidOperands {
                operator,
                left,
                right,
            } => ErrorTip::Suggestion(format!(
                "Operator `{}` cannot be applied to `{}` and `{}`",
                operator, left, right
            )),
            ErrorImpl::LoopControlOutsideLoop { keyword } => {
                ErrorTip::Suggestion(format!("`{}` outside of a loop", keyword))
            }
            ErrorImpl::Internal { message } => {
                ErrorTip::Suggestion(format!("Internal compiler error: {}", message))
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.internal_error)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, PartialEq)]
pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("cannot find file {file:?}")]
    FileNotFound { file: String },
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid escape character {escape:?}")]
    InvalidEscape { escape: char },
    #[error("unknown tag {tag:?}")]
    UnknownTag { tag: String },
    #[error("expected a file name after {directive:?}")]
    ExpectedIncludePath { directive: String },
    #[error("unexpected end of file in {context}")]
    UnexpectedEof { context: String },
    #[error("expected {expected}, found {found:?}")]
    UnexpectedToken { expected: String, found: String },
    #[error("unexpected token at top level: {token:?}")]
    UnexpectedTokenAtTopLevel { token: String },
    #[error("expected expression, found {found:?}")]
    ExpectedExpression { found: String },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },
    #[error("expected `->` in function pointer type, found {found:?}")]
    ExpectedArrow { found: String },
    #[error("invalid array length {token:?}")]
    InvalidArrayLength { token: String },
    #[error("type {type_:?} already defined")]
    TypeAlreadyDefined { type_: String },
    #[error("duplicate definition of {function:?}")]
    DuplicateOverload { function: String },
    #[error("overloads of {function:?} cannot differentiate by return type")]
    ReturnTypeOverload { function: String },
    #[error("variable {variable:?} already declared")]
    VariableAlreadyDeclared { variable: String },
    #[error("use of undefined identifier {variable:?}")]
    VariableNotDeclared { variable: String },
    #[error("no overload of {function:?} accepts ({arguments})")]
    NoMatchingOverload { function: String, arguments: String },
    #[error("call to {function:?} is ambiguous")]
    AmbiguousCall { function: String },
    #[error("{name:?} of type {type_} is not callable")]
    NotCallable { name: String, type_: String },
    #[error("{outer:?} expects {expected} but {inner:?} produces {found}")]
    UnaryChainMismatch {
        outer: String,
        inner: String,
        expected: String,
        found: String,
    },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMatchError { expected: String, received: String },
    #[error("condition of {construct} must be bool, found {found}")]
    ConditionNotBool { construct: String, found: String },
    #[error("cannot take reference of non-lvalue")]
    NonLValueReference,
    #[error("cannot assign to non-lvalue")]
    NonLValueAssignment,
    #[error("cannot dereference non-pointer type {type_}")]
    DereferenceNonPointer { type_: String },
    #[error("cannot dereference array type {type_}")]
    DereferenceArray { type_: String },
    #[error("cannot index into type {type_}")]
    IndexNonPointer { type_: String },
    #[error("operator {operator:?} cannot be applied to {left} and {right}")]
    InvalidOperands {
        operator: String,
        left: String,
        right: String,
    },
    #[error("{keyword} outside of a loop")]
    LoopControlOutsideLoop { keyword: String },
    #[error("internal compiler error: {message}")]
    Internal { message: String },
}
