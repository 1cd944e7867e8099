//! Function body parsing.
//!
//! Bodies are parsed one function at a time against the finished [`Module`]. Every
//! node is type checked as soon as it is built, so a body that parses is also well
//! typed. Failures are returned as `Err` up to the nearest block, which records the
//! diagnostic and resynchronizes the cursor.

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{Callee, Node, NodeKind},
        types::Type,
    },
    config::CompileOptions,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Keyword, TagKind, Token, TokenDetail, TokenKind},
    type_checker::{
        frames::{FrameArena, FrameId},
        type_checker::{binary_result_type, is_assignable, type_of, TypeContext},
    },
};

use super::{
    lookups::{binding_power, is_builtin_operator, right_binding_power, BindingPower},
    parser::Parser,
    structure::{CollectedFunction, FunctionId, Module},
    types::parse_type,
};

/// Result of parsing one function body.
#[derive(Debug, Clone)]
pub struct FunctionBody {
    /// `None` when the body produced diagnostics.
    pub ast: Option<Node>,
    pub frames: FrameArena,
    pub diagnostics: Vec<Error>,
}

enum Resolution {
    Found(FunctionId),
    Ambiguous,
    NoMatch,
}

pub struct FunctionParser<'a> {
    pub(super) parser: Parser<'a>,
    pub(super) module: &'a Module,
    pub(super) frames: FrameArena,
    pub(super) diagnostics: Vec<Error>,
    pub(super) options: &'a CompileOptions,
    /// Number of enclosing loop bodies, for `break` and `continue`.
    pub(super) loop_depth: usize,
    pub(super) return_type: Type,
}

/// Parses and type checks the body of `function`.
///
/// `Err` is reserved for internal errors and for running past the diagnostic bound.
pub fn parse_function_body(
    module: &Module,
    function: &CollectedFunction,
    options: &CompileOptions,
) -> Result<FunctionBody, Error> {
    let mut frames = module.root_frames().clone();
    let function_frame = frames.push_child(FrameId::ROOT);

    for (name, ty) in function
        .argument_names
        .iter()
        .zip(&function.signature.argument_types)
    {
        frames.declare(function_frame, name.clone(), ty.clone())?;
    }

    let mut body = FunctionParser {
        parser: Parser::new(module.body_tokens(function), module.body_end(function)),
        module,
        frames,
        diagnostics: vec![],
        options,
        loop_depth: 0,
        return_type: function.signature.return_type.clone(),
    };

    let ast = match body.parse_expr(function_frame, BindingPower::Default) {
        Ok(ast) if body.parser.has_tokens() => {
            let error = body.parser.unexpected("end of function body");
            body.diagnostics.push(error);
            Some(ast)
        }
        Ok(ast) => Some(ast),
        Err(error) if error.is_internal() => return Err(error),
        Err(error) => {
            body.diagnostics.push(error);
            None
        }
    };

    debug!(
        function = %function.name.value,
        frames = body.frames.len(),
        diagnostics = body.diagnostics.len(),
        "parsed function body"
    );

    Ok(FunctionBody {
        ast: ast.filter(|_| body.diagnostics.is_empty()),
        frames: body.frames,
        diagnostics: body.diagnostics,
    })
}

impl<'a> FunctionParser<'a> {
    /// Records a recoverable diagnostic. Internal errors, and the diagnostic that
    /// reaches the bound, are handed back so the caller unwinds instead.
    pub(super) fn record(&mut self, error: Error) -> Result<(), Error> {
        if error.is_internal() || self.diagnostics.len() + 1 >= self.options.max_diagnostics {
            return Err(error);
        }
        trace!(%error, "recorded diagnostic");
        self.diagnostics.push(error);
        Ok(())
    }

    pub(super) fn resolve_type(&self, node: &Node) -> Result<Type, Error> {
        let ctx = TypeContext {
            module: self.module,
            frames: &self.frames,
        };
        type_of(&ctx, node)
    }

    pub(super) fn is_symbol(&self, frame: FrameId, name: &str) -> bool {
        self.frames.lookup(frame, name).is_some()
    }

    /// Checks that `value` may be stored where `target` is expected.
    pub(super) fn expect_assignable(&self, target: &Type, value: &Node) -> Result<(), Error> {
        let value_type = self.resolve_type(value)?;
        if is_assignable(target, &value_type, value.is_constant()) {
            return Ok(());
        }
        Err(Error::new(
            ErrorImpl::TypeMatchError {
                expected: target.to_string(),
                received: value_type.to_string(),
            },
            value.location.clone(),
        ))
    }

    pub fn parse_expr(&mut self, frame: FrameId, bp: BindingPower) -> Result<Node, Error> {
        let mut left = self.parse_nud(frame)?;

        while self.parser.on_same_line() {
            let Some(operator_bp) = self.led_binding_power(frame) else {
                break;
            };
            if operator_bp <= bp {
                break;
            }
            left = self.parse_led(frame, left)?;
        }

        Ok(left)
    }

    /// Binding power of the current token in infix position, if it can continue an expression.
    fn led_binding_power(&self, frame: FrameId) -> Option<BindingPower> {
        let token = self.parser.current_token();
        match token.detail {
            TokenDetail::Keyword(Keyword::Is) | TokenDetail::Keyword(Keyword::As) => {
                Some(BindingPower::Cast)
            }
            TokenDetail::Identifier(_) if token.is_operator() => Some(binding_power(&token.value)),
            TokenDetail::Identifier(_)
                if !self.is_symbol(frame, &token.value)
                    && self
                        .module
                        .has_tagged_overload(&token.value, 2, TagKind::Infix) =>
            {
                Some(binding_power(&token.value))
            }
            _ => None,
        }
    }

    fn parse_nud(&mut self, frame: FrameId) -> Result<Node, Error> {
        let (kind, detail) = (self.parser.current_token_kind(), self.parser.current_token().detail);
        match detail {
            TokenDetail::None if kind == TokenKind::OpenCurly => self.parse_block(frame),
            TokenDetail::Keyword(Keyword::If) => self.parse_if(frame),
            TokenDetail::Keyword(Keyword::While) => self.parse_while(frame),
            TokenDetail::Keyword(Keyword::For) => self.parse_for(frame),
            TokenDetail::Keyword(Keyword::Return) => self.parse_return(frame),
            TokenDetail::Keyword(Keyword::Break) | TokenDetail::Keyword(Keyword::Continue) => {
                self.parse_loop_control(frame)
            }
            TokenDetail::Keyword(Keyword::Ref) => self.parse_reference(frame),
            TokenDetail::Keyword(Keyword::Deref) => self.parse_dereference(frame),
            TokenDetail::Identifier(_) if self.parser.peek(1).kind == TokenKind::Colon => {
                self.parse_declaration(frame)
            }
            TokenDetail::Identifier(_) | TokenDetail::Literal(_) => self.parse_unary_chain(frame),
            TokenDetail::None if kind == TokenKind::OpenParen => self.parse_unary_chain(frame),
            _ => {
                let token = self.parser.current_token();
                Err(Error::new(
                    ErrorImpl::ExpectedExpression {
                        found: token.to_string(),
                    },
                    token.location.clone(),
                ))
            }
        }
    }

    fn parse_led(&mut self, frame: FrameId, left: Node) -> Result<Node, Error> {
        let operator = self.parser.advance();

        if operator.is_keyword(Keyword::Is) || operator.is_keyword(Keyword::As) {
            let ty = parse_type(&mut self.parser, &self.module.types)?;
            let expr = Box::new(left);
            let kind = if operator.is_keyword(Keyword::Is) {
                NodeKind::Is { expr, ty }
            } else {
                NodeKind::As { expr, ty }
            };
            return Ok(Node::new(kind, frame, operator.location));
        }

        if operator.value == "=" {
            return self.parse_assignment(frame, left, operator);
        }

        let right = self.parse_expr(frame, binding_power(&operator.value))?;
        self.parse_binary(frame, left, operator, right)
    }

    fn parse_assignment(&mut self, frame: FrameId, target: Node, operator: Token) -> Result<Node, Error> {
        if !target.is_lvalue() {
            return Err(Error::new(ErrorImpl::NonLValueAssignment, operator.location));
        }

        let value = self.parse_expr(frame, right_binding_power(&operator.value))?;
        let target_type = self.resolve_type(&target)?;
        self.expect_assignable(&target_type, &value)?;

        Ok(Node::new(
            NodeKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            frame,
            operator.location,
        ))
    }

    fn parse_binary(&mut self, frame: FrameId, left: Node, operator: Token, right: Node) -> Result<Node, Error> {
        let left_type = self.resolve_type(&left)?;
        let right_type = self.resolve_type(&right)?;

        let candidates = self.infix_overloads(&operator.value);
        let arguments = [
            (left_type.clone(), left.is_constant()),
            (right_type.clone(), right.is_constant()),
        ];

        let function = match self.select_overload(&candidates, &arguments) {
            Resolution::Found(id) => Some(id),
            Resolution::Ambiguous => {
                return Err(Error::new(
                    ErrorImpl::AmbiguousCall {
                        function: operator.value.clone(),
                    },
                    operator.location,
                ))
            }
            Resolution::NoMatch => {
                let built_in = binary_result_type(
                    &operator.value,
                    &left_type,
                    &right_type,
                    left.is_constant(),
                    right.is_constant(),
                );
                if built_in.is_none() {
                    return Err(Error::new(
                        ErrorImpl::InvalidOperands {
                            operator: operator.value.clone(),
                            left: left_type.to_string(),
                            right: right_type.to_string(),
                        },
                        operator.location,
                    ));
                }
                None
            }
        };

        Ok(Node::new(
            NodeKind::BinaryOp {
                left: Box::new(left),
                operator: operator.clone(),
                function,
                right: Box::new(right),
            },
            frame,
            operator.location,
        ))
    }

    fn infix_overloads(&self, name: &str) -> Vec<FunctionId> {
        self.module
            .overloads(name)
            .iter()
            .copied()
            .filter(|id| {
                self.module
                    .function(*id)
                    .is_some_and(|function| function.signature.usable_as(TagKind::Infix))
            })
            .collect()
    }

    fn unary_overloads(&self, name: &str, tag: TagKind) -> Vec<FunctionId> {
        self.module
            .overloads(name)
            .iter()
            .copied()
            .filter(|id| {
                self.module.function(*id).is_some_and(|function| {
                    function.signature.arity() == 1 && function.signature.usable_as(tag)
                })
            })
            .collect()
    }

    /// Picks the overload whose argument types match exactly, falling back to the
    /// single overload the arguments are assignable to.
    fn select_overload(&self, candidates: &[FunctionId], arguments: &[(Type, bool)]) -> Resolution {
        let candidates: Vec<(FunctionId, &CollectedFunction)> = candidates
            .iter()
            .filter_map(|id| self.module.function(*id).map(|function| (*id, function)))
            .filter(|(_, function)| function.signature.arity() == arguments.len())
            .collect();

        let exact = candidates.iter().find(|(_, function)| {
            function
                .signature
                .argument_types
                .iter()
                .zip(arguments)
                .all(|(expected, (found, _))| expected == found)
        });
        if let Some((id, _)) = exact {
            return Resolution::Found(*id);
        }

        let matching: Vec<FunctionId> = candidates
            .iter()
            .filter(|(_, function)| {
                function
                    .signature
                    .argument_types
                    .iter()
                    .zip(arguments)
                    .all(|(expected, (found, constant))| is_assignable(expected, found, *constant))
            })
            .map(|(id, _)| *id)
            .collect();

        let has_error_argument = arguments.iter().any(|(ty, _)| ty.is_error());
        match matching.as_slice() {
            [] => Resolution::NoMatch,
            [id] => Resolution::Found(*id),
            [id, ..] if has_error_argument => Resolution::Found(*id),
            _ => Resolution::Ambiguous,
        }
    }

    fn parse_reference(&mut self, frame: FrameId) -> Result<Node, Error> {
        let keyword = self.parser.advance();
        let target = self.parse_expr(frame, BindingPower::Unary)?;

        if !target.is_lvalue() {
            return Err(Error::new(ErrorImpl::NonLValueReference, target.location));
        }

        Ok(Node::new(
            NodeKind::Reference(Box::new(target)),
            frame,
            keyword.location,
        ))
    }

    fn parse_dereference(&mut self, frame: FrameId) -> Result<Node, Error> {
        let keyword = self.parser.advance();
        let target = self.parse_expr(frame, BindingPower::Unary)?;

        match self.resolve_type(&target)? {
            Type::Pointer { is_array: false, .. } | Type::Error => {}
            ty @ Type::Pointer { is_array: true, .. } => {
                return Err(Error::new(
                    ErrorImpl::DereferenceArray {
                        type_: ty.to_string(),
                    },
                    target.location,
                ))
            }
            ty => {
                return Err(Error::new(
                    ErrorImpl::DereferenceNonPointer {
                        type_: ty.to_string(),
                    },
                    target.location,
                ))
            }
        }

        Ok(Node::new(
            NodeKind::Dereference(Box::new(target)),
            frame,
            keyword.location,
        ))
    }

    /// Whether the current token applies a unary function as a prefix.
    fn at_prefix_function(&self, frame: FrameId) -> bool {
        let token = self.parser.current_token();
        let next = self.parser.peek(1);

        token.kind == TokenKind::Identifier
            && !self.is_symbol(frame, &token.value)
            && !self.unary_overloads(&token.value, TagKind::Prefix).is_empty()
            && matches!(next.kind, TokenKind::Identifier | TokenKind::Literal)
            && next.location.same_line(&token.location)
    }

    /// Whether the current token applies a unary function as a postfix.
    fn at_postfix_function(&self, frame: FrameId) -> bool {
        let token = self.parser.current_token();
        if token.kind != TokenKind::Identifier
            || !self.parser.on_same_line()
            || self.is_symbol(frame, &token.value)
            || self.unary_overloads(&token.value, TagKind::Postfix).is_empty()
        {
            return false;
        }

        // A name that is also a binary operator only reads as postfix when no
        // right operand follows it.
        if !is_builtin_operator(&token.value)
            && !self.module.has_tagged_overload(&token.value, 2, TagKind::Infix)
        {
            return true;
        }
        let next = self.parser.peek(1);
        !(matches!(
            next.kind,
            TokenKind::Identifier | TokenKind::Literal | TokenKind::OpenParen
        ) && next.location.same_line(&token.location))
    }

    /// `prefix* core index* postfix*`, where prefixes and postfixes are unary functions.
    fn parse_unary_chain(&mut self, frame: FrameId) -> Result<Node, Error> {
        let mut prefixes = vec![];
        while self.at_prefix_function(frame) {
            prefixes.push(self.parser.advance());
        }

        let mut node = self.parse_core(frame)?;
        node = self.parse_index_suffixes(frame, node)?;

        // The prefix nearest the core applies first.
        let mut inner = node_label(&node);
        for prefix in prefixes.into_iter().rev() {
            node = self.apply_unary(frame, prefix, TagKind::Prefix, node, &inner)?;
            inner = node_label(&node);
        }

        while self.at_postfix_function(frame) {
            let postfix = self.parser.advance();
            node = self.apply_unary(frame, postfix, TagKind::Postfix, node, &inner)?;
            inner = node_label(&node);
        }

        Ok(node)
    }

    fn apply_unary(
        &mut self,
        frame: FrameId,
        function: Token,
        tag: TagKind,
        argument: Node,
        inner: &str,
    ) -> Result<Node, Error> {
        let argument_type = self.resolve_type(&argument)?;
        let candidates = self.unary_overloads(&function.value, tag);

        let id = match self.select_overload(&candidates, &[(argument_type.clone(), argument.is_constant())]) {
            Resolution::Found(id) => id,
            Resolution::Ambiguous => {
                return Err(Error::new(
                    ErrorImpl::AmbiguousCall {
                        function: function.value.clone(),
                    },
                    function.location,
                ))
            }
            Resolution::NoMatch => {
                let expected: Vec<String> = candidates
                    .iter()
                    .filter_map(|id| self.module.function(*id))
                    .filter_map(|candidate| candidate.signature.argument_types.first())
                    .map(Type::to_string)
                    .collect();
                return Err(Error::new(
                    ErrorImpl::UnaryChainMismatch {
                        outer: function.value.clone(),
                        inner: inner.to_string(),
                        expected: expected.join(" or "),
                        found: argument_type.to_string(),
                    },
                    function.location,
                ));
            }
        };

        trace!(function = %function.value, ?tag, "applied unary function");
        Ok(Node::new(
            NodeKind::FunctionCall {
                callee: Callee::Function {
                    name: function.value.clone(),
                    id,
                },
                arguments: vec![argument],
            },
            frame,
            function.location,
        ))
    }

    fn parse_core(&mut self, frame: FrameId) -> Result<Node, Error> {
        let token = self.parser.current_token().clone();
        match token.kind {
            TokenKind::Literal => {
                self.parser.advance();
                Ok(Node::new(NodeKind::Literal(token.clone()), frame, token.location))
            }
            TokenKind::OpenParen => {
                self.parser.advance();
                let inner = self.parse_expr(frame, BindingPower::Default)?;
                self.parser.expect(TokenKind::CloseParen)?;
                Ok(inner)
            }
            TokenKind::Identifier => {
                self.parser.advance();
                if self.parser.current_token_kind() == TokenKind::OpenParen && self.parser.on_same_line() {
                    return self.parse_call(frame, token);
                }

                if !self.is_symbol(frame, &token.value) {
                    return Err(Error::new(
                        ErrorImpl::VariableNotDeclared {
                            variable: token.value.clone(),
                        },
                        token.location,
                    ));
                }
                Ok(Node::new(NodeKind::Identifier(token.clone()), frame, token.location))
            }
            _ => Err(Error::new(
                ErrorImpl::ExpectedExpression {
                    found: token.to_string(),
                },
                token.location,
            )),
        }
    }

    fn parse_arguments(&mut self, frame: FrameId) -> Result<Vec<Node>, Error> {
        self.parser.expect(TokenKind::OpenParen)?;
        let mut arguments = vec![];

        while self.parser.current_token_kind() != TokenKind::CloseParen {
            if !arguments.is_empty() {
                self.parser.expect(TokenKind::Comma)?;
            }
            arguments.push(self.parse_expr(frame, BindingPower::Default)?);
        }
        self.parser.expect(TokenKind::CloseParen)?;

        Ok(arguments)
    }

    fn parse_call(&mut self, frame: FrameId, name: Token) -> Result<Node, Error> {
        if let Some(symbol) = self.frames.lookup(frame, &name.value) {
            let ty = symbol.ty.clone();
            return self.parse_pointer_call(frame, name, ty);
        }

        let module = self.module;
        let overloads = module.overloads(&name.value);
        if overloads.is_empty() {
            return Err(Error::new(
                ErrorImpl::VariableNotDeclared {
                    variable: name.value.clone(),
                },
                name.location,
            ));
        }

        let arguments = self.parse_arguments(frame)?;
        let mut typed = vec![];
        for argument in &arguments {
            typed.push((self.resolve_type(argument)?, argument.is_constant()));
        }

        let id = match self.select_overload(overloads, &typed) {
            Resolution::Found(id) => id,
            Resolution::Ambiguous => {
                return Err(Error::new(
                    ErrorImpl::AmbiguousCall {
                        function: name.value.clone(),
                    },
                    name.location,
                ))
            }
            Resolution::NoMatch => {
                let types: Vec<String> = typed.iter().map(|(ty, _)| ty.to_string()).collect();
                return Err(Error::new(
                    ErrorImpl::NoMatchingOverload {
                        function: name.value.clone(),
                        arguments: types.join(", "),
                    },
                    name.location,
                ));
            }
        };

        Ok(Node::new(
            NodeKind::FunctionCall {
                callee: Callee::Function {
                    name: name.value.clone(),
                    id,
                },
                arguments,
            },
            frame,
            name.location,
        ))
    }

    fn parse_pointer_call(&mut self, frame: FrameId, name: Token, ty: Type) -> Result<Node, Error> {
        let argument_types = match &ty {
            Type::FunctionPointer { arguments, .. } => arguments.clone(),
            _ => {
                return Err(Error::new(
                    ErrorImpl::NotCallable {
                        name: name.value.clone(),
                        type_: ty.to_string(),
                    },
                    name.location,
                ))
            }
        };

        let arguments = self.parse_arguments(frame)?;
        if arguments.len() != argument_types.len() {
            let mut types = vec![];
            for argument in &arguments {
                types.push(self.resolve_type(argument)?.to_string());
            }
            return Err(Error::new(
                ErrorImpl::NoMatchingOverload {
                    function: name.value.clone(),
                    arguments: types.join(", "),
                },
                name.location,
            ));
        }

        for (expected, argument) in argument_types.iter().zip(&arguments) {
            self.expect_assignable(expected, argument)?;
        }

        let pointer = Node::new(NodeKind::Identifier(name.clone()), frame, name.location.clone());
        Ok(Node::new(
            NodeKind::FunctionCall {
                callee: Callee::Pointer(Box::new(pointer)),
                arguments,
            },
            frame,
            name.location,
        ))
    }

    fn parse_index_suffixes(&mut self, frame: FrameId, mut node: Node) -> Result<Node, Error> {
        while self.parser.current_token_kind() == TokenKind::OpenBracket && self.parser.on_same_line() {
            let open = self.parser.advance();

            let of_type = self.resolve_type(&node)?;
            if !matches!(of_type, Type::Pointer { .. } | Type::Error) {
                return Err(Error::new(
                    ErrorImpl::IndexNonPointer {
                        type_: of_type.to_string(),
                    },
                    open.location,
                ));
            }

            let index = self.parse_expr(frame, BindingPower::Default)?;
            self.parser.expect(TokenKind::CloseBracket)?;

            let index_type = self.resolve_type(&index)?;
            if !index_type.is_integer() && !index_type.is_error() {
                return Err(Error::new(
                    ErrorImpl::TypeMatchError {
                        expected: String::from("an integer"),
                        received: index_type.to_string(),
                    },
                    index.location,
                ));
            }

            node = Node::new(
                NodeKind::Index {
                    of: Box::new(node),
                    by: Box::new(index),
                },
                frame,
                open.location,
            );
        }

        Ok(node)
    }
}

/// How a chain link is named in unary mismatch diagnostics.
fn node_label(node: &Node) -> String {
    match &node.kind {
        NodeKind::Literal(token) | NodeKind::Identifier(token) => token.to_string(),
        NodeKind::FunctionCall {
            callee: Callee::Function { name, .. },
            ..
        } => name.clone(),
        _ => String::from("expression"),
    }
}
