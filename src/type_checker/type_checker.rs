use crate::{
    ast::{
        ast::{Callee, Node, NodeKind},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{LiteralKind, Token},
    parser::structure::Module,
};

use super::frames::FrameArena;

/// Read-only view needed to resolve the type of a node.
#[derive(Clone, Copy)]
pub struct TypeContext<'a> {
    pub module: &'a Module,
    pub frames: &'a FrameArena,
}

/// Types of literal tokens. Integers assume the widest representation.
pub fn literal_type(token: &Token) -> Result<Type, Error> {
    match token.literal_kind() {
        Some(LiteralKind::Int { unsigned }) => Ok(Type::integer(64, !unsigned)),
        Some(LiteralKind::Float) => Ok(Type::float(32)),
        Some(LiteralKind::Double) => Ok(Type::float(64)),
        Some(LiteralKind::String) => Ok(Type::String),
        Some(LiteralKind::Bool) => Ok(Type::Bool),
        Some(LiteralKind::None) => Ok(Type::None),
        None => Err(Error::internal(format!(
            "literal node holds non-literal token `{}`",
            token.value
        ))),
    }
}

/// Resolves the type of `node`.
///
/// The parser checks every user-facing rule before building a node, so apart from
/// undefined identifiers the only failures here are internal errors.
pub fn type_of(ctx: &TypeContext, node: &Node) -> Result<Type, Error> {
    match &node.kind {
        NodeKind::Empty
        | NodeKind::While { .. }
        | NodeKind::For { .. }
        | NodeKind::Break
        | NodeKind::Continue => Ok(Type::None),
        NodeKind::Literal(token) => literal_type(token),
        NodeKind::Identifier(token) => ctx
            .frames
            .lookup(node.frame, &token.value)
            .map(|symbol| symbol.ty.clone())
            .ok_or_else(|| {
                Error::new(
                    ErrorImpl::VariableNotDeclared {
                        variable: token.value.clone(),
                    },
                    token.location.clone(),
                )
            }),
        NodeKind::Block(statements) => match statements.last() {
            Some(last) => type_of(ctx, last),
            None => Ok(Type::None),
        },
        NodeKind::If {
            body, else_body, ..
        } => {
            // TODO: branches that diverge (return, break) should not contribute an option
            let body_type = type_of(ctx, body)?;
            let else_type = match else_body {
                Some(else_body) => type_of(ctx, else_body)?,
                None => Type::None,
            };
            if body_type == else_type {
                Ok(body_type)
            } else {
                Ok(Type::sum(vec![body_type, else_type]))
            }
        }
        NodeKind::FunctionCall { callee, .. } => match callee {
            Callee::Function { name, id } => ctx
                .module
                .function(*id)
                .map(|function| function.signature.return_type.clone())
                .ok_or_else(|| Error::internal(format!("call to unknown overload of `{}`", name))),
            Callee::Pointer(pointer) => match type_of(ctx, pointer)? {
                Type::FunctionPointer { return_type, .. } => Ok(*return_type),
                Type::Error => Ok(Type::Error),
                other => Err(Error::internal(format!(
                    "call through non-callable type `{}`",
                    other
                ))),
            },
        },
        NodeKind::Index { of, .. } => match type_of(ctx, of)? {
            Type::Pointer { pointee, .. } => Ok(*pointee),
            Type::Error => Ok(Type::Error),
            other => Err(Error::internal(format!(
                "index into non-pointer type `{}`",
                other
            ))),
        },
        NodeKind::Dereference(of) => match type_of(ctx, of)? {
            Type::Pointer {
                pointee,
                is_array: false,
                ..
            } => Ok(*pointee),
            Type::Error => Ok(Type::Error),
            other => Err(Error::internal(format!(
                "dereference of non-pointer type `{}`",
                other
            ))),
        },
        NodeKind::Reference(of) => Ok(Type::pointer(type_of(ctx, of)?)),
        NodeKind::Is { .. } => Ok(Type::Bool),
        NodeKind::As { ty, .. } => Ok(ty.clone()),
        NodeKind::Return(value) => type_of(ctx, value),
        NodeKind::Assign { target, .. } => type_of(ctx, target),
        NodeKind::Declaration { ty, .. } => Ok(ty.clone()),
        NodeKind::BinaryOp {
            left,
            operator,
            function,
            right,
        } => {
            if let Some(id) = function {
                return ctx
                    .module
                    .function(*id)
                    .map(|function| function.signature.return_type.clone())
                    .ok_or_else(|| {
                        Error::internal(format!("unknown overload for `{}`", operator.value))
                    });
            }

            let left_type = type_of(ctx, left)?;
            let right_type = type_of(ctx, right)?;
            binary_result_type(
                &operator.value,
                &left_type,
                &right_type,
                left.is_constant(),
                right.is_constant(),
            )
            .ok_or_else(|| {
                Error::internal(format!(
                    "operator `{}` has no result for `{}` and `{}`",
                    operator.value, left_type, right_type
                ))
            })
        }
    }
}

fn same_numeric_family(a: &Type, b: &Type) -> bool {
    (a.is_integer() && b.is_integer()) || (a.is_float() && b.is_float())
}

/// Whether a value of type `value` may be stored where `target` is expected.
/// `value_is_constant` lets literals narrow to any type of their numeric family.
pub fn is_assignable(target: &Type, value: &Type, value_is_constant: bool) -> bool {
    if target == value || target.is_error() || value.is_error() {
        return true;
    }

    if value_is_constant && same_numeric_family(target, value) {
        return true;
    }

    match target {
        Type::Sum(options) => options
            .iter()
            .any(|option| is_assignable(option, value, value_is_constant)),
        _ => false,
    }
}

/// The common operand type for arithmetic, letting a constant side adopt the other's type.
fn numeric_operand_type(
    left: &Type,
    right: &Type,
    left_is_constant: bool,
    right_is_constant: bool,
) -> Option<Type> {
    if !left.is_numeric() || !right.is_numeric() {
        return None;
    }

    if left == right || (right_is_constant && same_numeric_family(left, right)) {
        Some(left.clone())
    } else if left_is_constant && same_numeric_family(left, right) {
        Some(right.clone())
    } else {
        None
    }
}

/// Result type of a built-in binary operator, or `None` if the operands are invalid.
pub fn binary_result_type(
    operator: &str,
    left: &Type,
    right: &Type,
    left_is_constant: bool,
    right_is_constant: bool,
) -> Option<Type> {
    if left.is_error() || right.is_error() {
        return Some(Type::Error);
    }

    match operator {
        "+" | "-" | "*" | "/" => {
            numeric_operand_type(left, right, left_is_constant, right_is_constant)
        }
        "<" | "<=" | ">" | ">=" => {
            numeric_operand_type(left, right, left_is_constant, right_is_constant)
                .map(|_| Type::Bool)
        }
        "==" | "!=" => {
            let comparable = is_assignable(left, right, right_is_constant)
                || is_assignable(right, left, left_is_constant);
            comparable.then_some(Type::Bool)
        }
        "&&" | "||" => (left.is_bool() && right.is_bool()).then_some(Type::Bool),
        "&" | "|" | "^" => {
            if left.is_integer() && right.is_integer() {
                numeric_operand_type(left, right, left_is_constant, right_is_constant)
            } else {
                None
            }
        }
        "<<" | ">>" => (left.is_integer() && right.is_integer()).then(|| left.clone()),
        _ => None,
    }
}
