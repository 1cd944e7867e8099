use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::SourceLocation;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, Keyword> = {
        let mut map = HashMap::new();
        map.insert("if", Keyword::If);
        map.insert("elif", Keyword::Elif);
        map.insert("else", Keyword::Else);
        map.insert("then", Keyword::Then);
        map.insert("while", Keyword::While);
        map.insert("for", Keyword::For);
        map.insert("do", Keyword::Do);
        map.insert("func", Keyword::Func);
        map.insert("ptr", Keyword::Ptr);
        map.insert("ref", Keyword::Ref);
        map.insert("deref", Keyword::Deref);
        map.insert("as", Keyword::As);
        map.insert("is", Keyword::Is);
        map.insert("using", Keyword::Using);
        map.insert("meta", Keyword::Meta);
        map.insert("return", Keyword::Return);
        map.insert("class", Keyword::Class);
        map.insert("alias", Keyword::Alias);
        map.insert("import", Keyword::Import);
        map.insert("continue", Keyword::Continue);
        map.insert("break", Keyword::Break);
        map
    };
    pub static ref TAG_LOOKUP: HashMap<&'static str, TagKind> = {
        let mut map = HashMap::new();
        map.insert("@prefix", TagKind::Prefix);
        map.insert("@infix", TagKind::Infix);
        map.insert("@postfix", TagKind::Postfix);
        map
    };
}

/// Characters that form operator identifiers when they appear in a run.
pub const OPERATOR_CHARACTERS: &str = "+-*/!<>=&|^~";

/// Words that open another source file when followed by a string literal.
pub const DIRECTIVES: [&str; 2] = ["include", "import"];

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,

    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    Dot,
    Comma,
    Colon,
    Semicolon,

    Literal,
    Identifier,
    Keyword,
    Tag,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl TokenKind {
    /// How the kind reads in an "expected ..." diagnostic.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::EOF => "end of file",
            TokenKind::OpenParen => "`(`",
            TokenKind::CloseParen => "`)`",
            TokenKind::OpenBracket => "`[`",
            TokenKind::CloseBracket => "`]`",
            TokenKind::OpenCurly => "`{`",
            TokenKind::CloseCurly => "`}`",
            TokenKind::Dot => "`.`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Literal => "a literal",
            TokenKind::Identifier => "an identifier",
            TokenKind::Keyword => "a keyword",
            TokenKind::Tag => "a tag",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Keyword {
    If,
    Elif,
    Else,
    Then,
    While,
    For,
    Do,
    Func,
    Ptr,
    Ref,
    Deref,
    As,
    Is,
    Using,
    Meta,
    Return,
    Class,
    Alias,
    Import,
    Continue,
    Break,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Elif => "elif",
            Keyword::Else => "else",
            Keyword::Then => "then",
            Keyword::While => "while",
            Keyword::For => "for",
            Keyword::Do => "do",
            Keyword::Func => "func",
            Keyword::Ptr => "ptr",
            Keyword::Ref => "ref",
            Keyword::Deref => "deref",
            Keyword::As => "as",
            Keyword::Is => "is",
            Keyword::Using => "using",
            Keyword::Meta => "meta",
            Keyword::Return => "return",
            Keyword::Class => "class",
            Keyword::Alias => "alias",
            Keyword::Import => "import",
            Keyword::Continue => "continue",
            Keyword::Break => "break",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum LiteralKind {
    Int { unsigned: bool },
    Float,
    Double,
    String,
    Bool,
    None,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum IdentifierKind {
    Plain,
    /// A run of operator characters such as `+` or `<=`.
    Operator,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TagKind {
    Prefix,
    Infix,
    Postfix,
}

impl Display for TagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagKind::Prefix => write!(f, "@prefix"),
            TagKind::Infix => write!(f, "@infix"),
            TagKind::Postfix => write!(f, "@postfix"),
        }
    }
}

/// Subtype information attached to a token, determined by its kind.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenDetail {
    None,
    Literal(LiteralKind),
    Keyword(Keyword),
    Identifier(IdentifierKind),
    Tag(TagKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub detail: TokenDetail,
    /// Source text. String literals hold their unescaped contents.
    pub value: String,
    pub location: SourceLocation,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::EOF => write!(f, "end of file"),
            TokenKind::Literal if self.detail == TokenDetail::Literal(LiteralKind::String) => {
                write!(f, "{:?}", self.value)
            }
            _ => write!(f, "{}", self.value),
        }
    }
}

impl Token {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.detail == TokenDetail::Keyword(keyword)
    }

    pub fn literal_kind(&self) -> Option<LiteralKind> {
        match self.detail {
            TokenDetail::Literal(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn tag_kind(&self) -> Option<TagKind> {
        match self.detail {
            TokenDetail::Tag(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.detail == TokenDetail::Identifier(IdentifierKind::Operator)
    }

    /// Non-literal tokens whose text is exactly `value`.
    pub fn is_value(&self, value: &str) -> bool {
        self.kind != TokenKind::Literal && self.value == value
    }
}
