//! Utility macros for the compiler.
//!
//! - `MK_TOKEN!` - Creates a Token instance
//! - `MK_DEFAULT_HANDLER!` - Creates a lexer handler for a single punctuation character

/// Creates a Token instance.
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Identifier, TokenDetail::Identifier(IdentifierKind::Plain), "x".to_string(), location);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $detail:expr, $value:expr, $location:expr) => {
        Token {
            kind: $kind,
            detail: $detail,
            value: $value,
            location: $location,
        }
    };
}

/// Creates a lexer handler that emits one punctuation token and moves past it.
///
/// ```ignore
/// RegexPattern {
///     regex: Regex::new("^\\(").unwrap(),
///     handler: MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "("),
/// }
/// ```
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($kind:expr, $value:literal) => {
        |lexer: &mut Lexer, _matched: &str| {
            let location = lexer.location();
            lexer.push(MK_TOKEN!(
                $kind,
                TokenDetail::None,
                String::from($value),
                location
            ));
            lexer.advance_n($value.chars().count());
            Ok(())
        }
    };
}
