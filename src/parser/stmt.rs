//! Blocks, control flow and declarations.

use tracing::trace;

use crate::{
    ast::{
        ast::{Node, NodeKind},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Keyword, TokenKind},
    type_checker::frames::FrameId,
};

use super::{expr::FunctionParser, lookups::BindingPower, types::parse_type};

impl<'a> FunctionParser<'a> {
    /// `{ statement* }` in a fresh child of `frame`. A statement that fails is
    /// recorded, the rest of its line is skipped and an `Empty` node stands in for it.
    pub(super) fn parse_block(&mut self, frame: FrameId) -> Result<Node, Error> {
        let open = self.parser.expect(TokenKind::OpenCurly)?;
        let block_frame = self.frames.push_child(frame);
        let mut statements = vec![];

        loop {
            match self.parser.current_token_kind() {
                TokenKind::CloseCurly => {
                    self.parser.advance();
                    break;
                }
                TokenKind::EOF => {
                    return Err(Error::new(
                        ErrorImpl::UnexpectedEof {
                            context: String::from("block"),
                        },
                        open.location,
                    ))
                }
                _ => {}
            }

            let start = self.parser.position();
            let location = self.parser.current_token().location.clone();

            match self.parse_statement(block_frame) {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    self.record(error)?;
                    self.parser.synchronize_in_block(start);
                    statements.push(Node::empty(block_frame, location));
                }
            }
        }

        Ok(Node::new(NodeKind::Block(statements), frame, open.location))
    }

    fn parse_statement(&mut self, frame: FrameId) -> Result<Node, Error> {
        let statement = self.parse_expr(frame, BindingPower::Default)?;

        if self.parser.current_token_kind() == TokenKind::Semicolon {
            self.parser.advance();
        } else if self.parser.on_same_line()
            && self.parser.current_token_kind() != TokenKind::CloseCurly
        {
            return Err(self.parser.unexpected("end of statement"));
        }

        Ok(statement)
    }

    fn expect_condition(&self, condition: &Node, construct: &str) -> Result<(), Error> {
        let ty = self.resolve_type(condition)?;
        if ty.is_bool() || ty.is_error() {
            return Ok(());
        }
        Err(Error::new(
            ErrorImpl::ConditionNotBool {
                construct: construct.to_string(),
                found: ty.to_string(),
            },
            condition.location.clone(),
        ))
    }

    /// `if cond then body (elif ... | else body)?`. Both the body and the tail are
    /// children of the condition frame, so neither sees the other's declarations.
    pub(super) fn parse_if(&mut self, frame: FrameId) -> Result<Node, Error> {
        let keyword = self.parser.advance();
        let condition_frame = self.frames.push_child(frame);

        let condition = self.parse_expr(condition_frame, BindingPower::Default)?;
        self.expect_condition(&condition, keyword.value.as_str())?;
        self.parser.expect_keyword(Keyword::Then)?;

        let body_frame = self.frames.push_child(condition_frame);
        let body = self.parse_expr(body_frame, BindingPower::Default)?;

        let else_body = if self.parser.is_keyword(Keyword::Elif) {
            let else_frame = self.frames.push_child(condition_frame);
            Some(Box::new(self.parse_if(else_frame)?))
        } else if self.parser.is_keyword(Keyword::Else) {
            self.parser.advance();
            let else_frame = self.frames.push_child(condition_frame);
            Some(Box::new(self.parse_expr(else_frame, BindingPower::Default)?))
        } else {
            None
        };

        Ok(Node::new(
            NodeKind::If {
                condition: Box::new(condition),
                body: Box::new(body),
                else_body,
            },
            frame,
            keyword.location,
        ))
    }

    /// Parses a loop body with `break` and `continue` enabled.
    fn parse_loop_body(&mut self, frame: FrameId) -> Result<Node, Error> {
        self.loop_depth += 1;
        let body = self.parse_expr(frame, BindingPower::Default);
        self.loop_depth -= 1;
        body
    }

    pub(super) fn parse_while(&mut self, frame: FrameId) -> Result<Node, Error> {
        let keyword = self.parser.advance();
        let loop_frame = self.frames.push_child(frame);

        let condition = self.parse_expr(loop_frame, BindingPower::Default)?;
        self.expect_condition(&condition, "while")?;
        if self.parser.is_keyword(Keyword::Do) {
            self.parser.advance();
        }

        let body = self.parse_loop_body(loop_frame)?;

        let else_body = if self.parser.is_keyword(Keyword::Else) {
            self.parser.advance();
            let else_frame = self.frames.push_child(frame);
            Some(Box::new(self.parse_expr(else_frame, BindingPower::Default)?))
        } else {
            None
        };

        Ok(Node::new(
            NodeKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
                else_body,
            },
            frame,
            keyword.location,
        ))
    }

    /// `for setup? ; condition? ; increment? do body`, all in one loop frame.
    pub(super) fn parse_for(&mut self, frame: FrameId) -> Result<Node, Error> {
        let keyword = self.parser.advance();
        let loop_frame = self.frames.push_child(frame);

        let setup = if self.parser.current_token_kind() != TokenKind::Semicolon {
            Some(Box::new(self.parse_expr(loop_frame, BindingPower::Default)?))
        } else {
            None
        };
        self.parser.expect(TokenKind::Semicolon)?;

        let condition = if self.parser.current_token_kind() != TokenKind::Semicolon {
            let condition = self.parse_expr(loop_frame, BindingPower::Default)?;
            self.expect_condition(&condition, "for")?;
            Some(Box::new(condition))
        } else {
            None
        };
        self.parser.expect(TokenKind::Semicolon)?;

        let increment = if !self.parser.is_keyword(Keyword::Do) {
            Some(Box::new(self.parse_expr(loop_frame, BindingPower::Default)?))
        } else {
            None
        };
        self.parser.expect_keyword(Keyword::Do)?;

        let body = self.parse_loop_body(loop_frame)?;

        Ok(Node::new(
            NodeKind::For {
                setup,
                condition,
                increment,
                body: Box::new(body),
            },
            frame,
            keyword.location,
        ))
    }

    /// `return expr?`. A bare `return` returns `None`.
    pub(super) fn parse_return(&mut self, frame: FrameId) -> Result<Node, Error> {
        let keyword = self.parser.advance();

        let ends_here = !self.parser.on_same_line()
            || matches!(
                self.parser.current_token_kind(),
                TokenKind::CloseCurly | TokenKind::Semicolon
            )
            || self.parser.is_keyword(Keyword::Else)
            || self.parser.is_keyword(Keyword::Elif);

        let value = if ends_here {
            Node::empty(frame, keyword.location.clone())
        } else {
            self.parse_expr(frame, BindingPower::Default)?
        };

        self.expect_assignable(&self.return_type, &value)?;

        Ok(Node::new(
            NodeKind::Return(Box::new(value)),
            frame,
            keyword.location,
        ))
    }

    pub(super) fn parse_loop_control(&mut self, frame: FrameId) -> Result<Node, Error> {
        let keyword = self.parser.advance();

        if self.loop_depth == 0 {
            return Err(Error::new(
                ErrorImpl::LoopControlOutsideLoop {
                    keyword: keyword.value.clone(),
                },
                keyword.location,
            ));
        }

        let kind = if keyword.is_keyword(Keyword::Break) {
            NodeKind::Break
        } else {
            NodeKind::Continue
        };
        Ok(Node::new(kind, frame, keyword.location))
    }

    /// `name: type (= value)?`. The name is declared after its initializer is parsed.
    ///
    /// A type that fails to resolve is reported and the name is declared with the
    /// error type, so later uses of it do not report again.
    pub(super) fn parse_declaration(&mut self, frame: FrameId) -> Result<Node, Error> {
        let name = self.parser.expect(TokenKind::Identifier)?;
        self.parser.expect(TokenKind::Colon)?;

        let type_start = self.parser.position();
        let ty = match parse_type(&mut self.parser, &self.module.types) {
            Ok(ty) => ty,
            Err(error) => {
                self.record(error)?;
                self.parser.synchronize_in_block(type_start);
                self.frames.declare(frame, name.clone(), Type::Error)?;
                return Ok(Node::new(
                    NodeKind::Declaration {
                        name: name.clone(),
                        ty: Type::Error,
                        value: None,
                    },
                    frame,
                    name.location,
                ));
            }
        };

        let value = if self.parser.is_value("=") && self.parser.on_same_line() {
            self.parser.advance();
            let value = self.parse_expr(frame, BindingPower::Default)?;
            self.expect_assignable(&ty, &value)?;
            Some(Box::new(value))
        } else {
            None
        };

        self.frames.declare(frame, name.clone(), ty.clone())?;
        trace!(variable = %name.value, %ty, "declared variable");

        Ok(Node::new(
            NodeKind::Declaration {
                name: name.clone(),
                ty,
                value,
            },
            frame,
            name.location,
        ))
    }
}
