//! Token cursor shared by the structure pass, the type grammar and the
//! expression parser.
//!
//! Besides consuming tokens it owns panic-mode recovery: after a failed parse the
//! owner of the recovery boundary calls [`Parser::synchronize`] or
//! [`Parser::synchronize_in_block`] to throw away the rest of the offending line.

use crate::{
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Keyword, Token, TokenDetail, TokenKind},
    SourceLocation, MK_TOKEN,
};

pub struct Parser<'a> {
    /// The list of tokens to parse
    tokens: &'a [Token],
    /// Current position in the token stream
    pos: usize,
    /// Returned once the cursor runs off the end of `tokens`
    eof: Token,
}

impl<'a> Parser<'a> {
    /// Creates a cursor over `tokens`. `end` is where running out of tokens is reported.
    pub fn new(tokens: &'a [Token], end: SourceLocation) -> Self {
        Parser {
            tokens,
            pos: 0,
            eof: MK_TOKEN!(TokenKind::EOF, TokenDetail::None, String::new(), end),
        }
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Looks `n` tokens past the current one.
    pub fn peek(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).unwrap_or(&self.eof)
    }

    pub fn previous_token(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|pos| self.tokens.get(pos))
    }

    /// Advances to the next token and returns the previous token.
    pub fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Checks if there are more tokens to parse.
    pub fn has_tokens(&self) -> bool {
        self.pos < self.tokens.len() && self.current_token_kind() != TokenKind::EOF
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.current_token().is_keyword(keyword)
    }

    pub fn is_value(&self, value: &str) -> bool {
        self.current_token().is_value(value)
    }

    /// True when the current token continues the line of the token before it.
    pub fn on_same_line(&self) -> bool {
        match self.previous_token() {
            Some(previous) => {
                self.has_tokens() && self.current_token().location.same_line(&previous.location)
            }
            None => false,
        }
    }

    pub fn unexpected(&self, expected: &str) -> Error {
        let token = self.current_token();
        Error::new(
            ErrorImpl::UnexpectedToken {
                expected: expected.to_string(),
                found: token.to_string(),
            },
            token.location.clone(),
        )
    }

    /// Expects a token of the specified kind, with optional custom error.
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        if self.current_token_kind() != expected_kind {
            return Err(error.unwrap_or_else(|| self.unexpected(expected_kind.describe())));
        }
        Ok(self.advance())
    }

    /// Expects a token of the specified kind with default error message.
    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    pub fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, Error> {
        if !self.is_keyword(keyword) {
            return Err(self.unexpected(&format!("`{}`", keyword.as_str())));
        }
        Ok(self.advance())
    }

    /// Expects an identifier or punctuation token spelled exactly `value`, such as `->`.
    pub fn expect_value(&mut self, value: &str) -> Result<Token, Error> {
        if !self.is_value(value) {
            return Err(self.unexpected(&format!("`{}`", value)));
        }
        Ok(self.advance())
    }

    /// Top level recovery: discards the rest of the line a failed parse started on.
    pub fn synchronize(&mut self, start: usize) {
        self.skip_line(start, false);
    }

    /// Statement recovery inside a block: like [`Parser::synchronize`] but stops in
    /// front of the `}` closing the enclosing block.
    pub fn synchronize_in_block(&mut self, start: usize) {
        self.skip_line(start, true);
    }

    // Braces opened on the skipped line are skipped up to their match, so a broken
    // header does not leave its body behind as a run of statements.
    fn skip_line(&mut self, start: usize, stop_at_close: bool) {
        let mut depth = 0usize;
        let mut line: Option<SourceLocation> = if self.pos > start {
            self.previous_token().map(|token| token.location.clone())
        } else {
            None
        };

        while self.has_tokens() {
            let token = self.current_token();
            if depth == 0 {
                if let Some(line) = &line {
                    if !token.location.same_line(line) {
                        break;
                    }
                }
                if stop_at_close && token.kind == TokenKind::CloseCurly {
                    break;
                }
            }

            match token.kind {
                TokenKind::OpenCurly => depth += 1,
                TokenKind::CloseCurly => depth = depth.saturating_sub(1),
                _ => {}
            }

            line = Some(token.location.clone());
            self.advance();
        }
    }
}
