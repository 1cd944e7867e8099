//! Type grammar.
//!
//! ```text
//! type      := non_sum ("or" non_sum)*
//! non_sum   := singular ("ptr" | "[" int "]")*
//! singular  := "(" (type ("," type)*)? ")" ("->" type)?
//!            | identifier
//!            | None
//! ```
//!
//! A parenthesised list without `->` is only valid with exactly one entry, and
//! then stands for that entry.

use crate::{
    ast::types::{Type, TypeTable},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Keyword, LiteralKind, TokenKind},
};

use super::parser::Parser;

pub fn parse_type(parser: &mut Parser, types: &TypeTable) -> Result<Type, Error> {
    let mut options = vec![parse_non_sum_type(parser, types)?];

    while parser.is_value("or") && parser.current_token_kind() == TokenKind::Identifier {
        parser.advance();
        options.push(parse_non_sum_type(parser, types)?);
    }

    Ok(Type::sum(options))
}

fn parse_non_sum_type(parser: &mut Parser, types: &TypeTable) -> Result<Type, Error> {
    let mut built = parse_singular_type(parser, types)?;

    loop {
        if parser.is_keyword(Keyword::Ptr) && parser.on_same_line() {
            parser.advance();
            built = Type::pointer(built);
        } else if parser.current_token_kind() == TokenKind::OpenBracket && parser.on_same_line() {
            parser.advance();
            let length = parser.expect(TokenKind::Literal)?;
            let parsed = match length.literal_kind() {
                Some(LiteralKind::Int { .. }) => length.value.parse::<u64>().ok(),
                _ => None,
            };
            let Some(parsed) = parsed else {
                return Err(Error::new(
                    ErrorImpl::InvalidArrayLength {
                        token: length.to_string(),
                    },
                    length.location,
                ));
            };
            parser.expect(TokenKind::CloseBracket)?;
            built = Type::array(built, parsed);
        } else {
            return Ok(built);
        }
    }
}

fn parse_singular_type(parser: &mut Parser, types: &TypeTable) -> Result<Type, Error> {
    match parser.current_token_kind() {
        TokenKind::OpenParen => {
            let open = parser.advance();
            let mut arguments = vec![];

            while parser.current_token_kind() != TokenKind::CloseParen {
                if !arguments.is_empty() {
                    parser.expect(TokenKind::Comma)?;
                }
                arguments.push(parse_type(parser, types)?);
            }
            parser.expect(TokenKind::CloseParen)?;

            if !parser.is_value("->") {
                if arguments.len() == 1 {
                    return Ok(arguments.remove(0));
                }
                return Err(Error::new(
                    ErrorImpl::ExpectedArrow {
                        found: parser.current_token().to_string(),
                    },
                    open.location,
                ));
            }
            parser.advance();

            let return_type = parse_type(parser, types)?;
            Ok(Type::function_pointer(arguments, return_type))
        }
        TokenKind::Identifier => {
            let name = parser.advance();
            types.get(&name.value).cloned().ok_or_else(|| {
                Error::new(
                    ErrorImpl::UnknownType {
                        type_: name.value.clone(),
                    },
                    name.location.clone(),
                )
            })
        }
        TokenKind::Literal if parser.current_token().literal_kind() == Some(LiteralKind::None) => {
            parser.advance();
            Ok(Type::None)
        }
        _ => Err(parser.unexpected("a type")),
    }
}
