use std::{collections::{HashMap, HashSet}, rc::Rc};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use crate::{
    config::CompileOptions,
    errors::errors::{Error, ErrorImpl},
    SourceLocation, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::{
    source::{SourceFile, SourceLoader},
    tokens::{
        IdentifierKind, LiteralKind, Token, TokenDetail, TokenKind, DIRECTIVES, RESERVED_LOOKUP,
        TAG_LOOKUP,
    },
};

pub type RegexHandler = fn(&mut Lexer, &str) -> Result<(), Error>;

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

lazy_static! {
    // Checked in order, first match wins. Every pattern is anchored to the cursor.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern { regex: Regex::new("^[ \t\r\x0C]+").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new("^#.*").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new("^\"").unwrap(), handler: string_handler },
        RegexPattern { regex: Regex::new("^@[A-Za-z_]*").unwrap(), handler: tag_handler },
        RegexPattern { regex: Regex::new("^\\(").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(") },
        RegexPattern { regex: Regex::new("^\\)").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")") },
        RegexPattern { regex: Regex::new("^\\[").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenBracket, "[") },
        RegexPattern { regex: Regex::new("^\\]").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseBracket, "]") },
        RegexPattern { regex: Regex::new("^\\{").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{") },
        RegexPattern { regex: Regex::new("^\\}").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}") },
        RegexPattern { regex: Regex::new("^\\.").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Dot, ".") },
        RegexPattern { regex: Regex::new("^,").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Comma, ",") },
        RegexPattern { regex: Regex::new("^:").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Colon, ":") },
        RegexPattern { regex: Regex::new("^;").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";") },
        RegexPattern { regex: Regex::new("^[0-9]+(?:\\.[0-9]+[fd]?|[fdu])?").unwrap(), handler: number_handler },
        RegexPattern { regex: Regex::new("^[A-Za-z_][A-Za-z0-9_]*").unwrap(), handler: word_handler },
        RegexPattern { regex: Regex::new("^[+\\-*/!<>=&|^~]+").unwrap(), handler: operator_handler },
    ];

    static ref ESCAPE_LOOKUP: HashMap<char, char> = {
        let mut map = HashMap::new();
        map.insert('n', '\n');
        map.insert('t', '\t');
        map.insert('"', '"');
        map.insert('\\', '\\');
        map.insert('0', '\0');
        map
    };
}

/// Scanner state: a stack of open files, most recent on top.
pub struct Lexer {
    tokens: Vec<Token>,
    diagnostics: Vec<Error>,
    files: Vec<SourceFile>,
    seen: HashSet<String>,
    /// Set by a directive, opened by the scan loop once the directive is consumed.
    pending_include: Option<(String, SourceLocation)>,
    eof_location: SourceLocation,
}

impl Lexer {
    fn new(entry: &str) -> Lexer {
        Lexer {
            tokens: vec![],
            diagnostics: vec![],
            files: vec![],
            seen: HashSet::new(),
            pending_include: None,
            eof_location: SourceLocation::new(Rc::new(entry.to_string()), 1, 1),
        }
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn advance_n(&mut self, n: usize) {
        if let Some(file) = self.files.last_mut() {
            file.advance(n);
        }
    }

    pub fn location(&self) -> SourceLocation {
        self.location_at(0)
    }

    pub fn location_at(&self, offset: usize) -> SourceLocation {
        match self.files.last() {
            Some(file) => file.location_at(offset),
            None => self.eof_location.clone(),
        }
    }

    pub fn remainder(&self) -> String {
        self.files
            .last()
            .map(SourceFile::rest_of_line)
            .unwrap_or_default()
    }

    fn skip_line(&mut self) {
        if let Some(file) = self.files.last_mut() {
            file.next_line();
        }
    }

    fn open_file(
        &mut self,
        name: &str,
        loader: &dyn SourceLoader,
        location: SourceLocation,
    ) -> Result<(), Error> {
        if self.seen.contains(name) {
            trace!(file = name, "already scanned, not reopening");
            return Ok(());
        }

        let contents = loader.load(name).map_err(|_| {
            Error::new(
                ErrorImpl::FileNotFound {
                    file: name.to_string(),
                },
                location,
            )
        })?;

        trace!(file = name, depth = self.files.len() + 1, "opening file");
        self.seen.insert(name.to_string());
        self.files.push(SourceFile::new(name, &contents));
        Ok(())
    }

    /// Reads a string literal starting at the cursor's `"`, returning its unescaped contents.
    fn read_string(&mut self) -> Result<String, Error> {
        let rest: Vec<char> = self.remainder().chars().collect();
        let mut value = String::new();
        let mut index = 1;

        while index < rest.len() {
            match rest[index] {
                '"' => {
                    self.advance_n(index + 1);
                    return Ok(value);
                }
                '\\' => {
                    let Some(escape) = rest.get(index + 1) else {
                        break;
                    };
                    match ESCAPE_LOOKUP.get(escape) {
                        Some(unescaped) => value.push(*unescaped),
                        None => {
                            return Err(Error::new(
                                ErrorImpl::InvalidEscape { escape: *escape },
                                self.location_at(index + 1),
                            ))
                        }
                    }
                    index += 2;
                }
                c => {
                    value.push(c);
                    index += 1;
                }
            }
        }

        Err(Error::new(
            ErrorImpl::UnterminatedString,
            self.location_at(rest.len()),
        ))
    }

    fn next_token(&mut self) -> Result<(), Error> {
        let rest = self.remainder();

        for pattern in PATTERNS.iter() {
            if let Some(matched) = pattern.regex.find(&rest) {
                return (pattern.handler)(self, matched.as_str());
            }
        }

        Err(Error::new(
            ErrorImpl::UnrecognisedToken {
                token: rest.chars().next().map(String::from).unwrap_or_default(),
            },
            self.location(),
        ))
    }
}

fn skip_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    lexer.advance_n(matched.chars().count());
    Ok(())
}

fn string_handler(lexer: &mut Lexer, _matched: &str) -> Result<(), Error> {
    let location = lexer.location();
    let value = lexer.read_string()?;

    lexer.push(MK_TOKEN!(
        TokenKind::Literal,
        TokenDetail::Literal(LiteralKind::String),
        value,
        location
    ));
    Ok(())
}

fn tag_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    let location = lexer.location();
    let Some(kind) = TAG_LOOKUP.get(matched) else {
        return Err(Error::new(
            ErrorImpl::UnknownTag {
                tag: matched.to_string(),
            },
            location,
        ));
    };

    lexer.push(MK_TOKEN!(
        TokenKind::Tag,
        TokenDetail::Tag(*kind),
        matched.to_string(),
        location
    ));
    lexer.advance_n(matched.len());
    Ok(())
}

fn number_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    let location = lexer.location();
    let mut digits = matched;
    let mut suffix = None;

    if let Some(last) = matched.chars().last().filter(|c| c.is_ascii_alphabetic()) {
        digits = &matched[..matched.len() - 1];
        // `12func` is a number followed by a word, not a float followed by `unc`
        let continues_word = lexer
            .remainder()
            .chars()
            .nth(matched.len())
            .is_some_and(|c| c.is_alphanumeric() || c == '_');
        if !continues_word {
            suffix = Some(last);
        }
    }

    let kind = match (digits.contains('.'), suffix) {
        (_, Some('f')) => LiteralKind::Float,
        (_, Some('d')) | (true, _) => LiteralKind::Double,
        (false, Some('u')) => LiteralKind::Int { unsigned: true },
        _ => LiteralKind::Int { unsigned: false },
    };

    lexer.push(MK_TOKEN!(
        TokenKind::Literal,
        TokenDetail::Literal(kind),
        digits.to_string(),
        location
    ));
    lexer.advance_n(digits.len() + suffix.map_or(0, |_| 1));
    Ok(())
}

fn word_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    let location = lexer.location();

    if DIRECTIVES.contains(&matched) {
        let rest = lexer.remainder();
        let after = &rest[matched.len()..];
        let trimmed = after.trim_start_matches([' ', '\t']);

        if trimmed.starts_with('"') {
            lexer.advance_n(matched.len() + after.len() - trimmed.len());
            let path = lexer.read_string()?;
            lexer.pending_include = Some((path, location));
            return Ok(());
        }

        if matched == "include" {
            return Err(Error::new(
                ErrorImpl::ExpectedIncludePath {
                    directive: matched.to_string(),
                },
                location,
            ));
        }
    }

    let (kind, detail) = if let Some(keyword) = RESERVED_LOOKUP.get(matched) {
        (TokenKind::Keyword, TokenDetail::Keyword(*keyword))
    } else {
        match matched {
            "true" | "false" => (TokenKind::Literal, TokenDetail::Literal(LiteralKind::Bool)),
            "None" => (TokenKind::Literal, TokenDetail::Literal(LiteralKind::None)),
            _ => (
                TokenKind::Identifier,
                TokenDetail::Identifier(IdentifierKind::Plain),
            ),
        }
    };

    lexer.push(MK_TOKEN!(kind, detail, matched.to_string(), location));
    lexer.advance_n(matched.len());
    Ok(())
}

fn operator_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    let location = lexer.location();
    lexer.push(MK_TOKEN!(
        TokenKind::Identifier,
        TokenDetail::Identifier(IdentifierKind::Operator),
        matched.to_string(),
        location
    ));
    lexer.advance_n(matched.len());
    Ok(())
}

/// Scans `entry` and every file it includes into one token stream ending in a single EOF token.
///
/// Scanning stops early once `options.max_diagnostics` diagnostics have been recorded.
pub fn scan(
    entry: &str,
    loader: &dyn SourceLoader,
    options: &CompileOptions,
) -> (Vec<Token>, Vec<Error>) {
    debug!(entry, "scanning");

    let mut lexer = Lexer::new(entry);
    let entry_location = SourceLocation::new(Rc::new(entry.to_string()), 1, 1);
    if let Err(error) = lexer.open_file(entry, loader, entry_location) {
        return (vec![], vec![error]);
    }

    while lexer.diagnostics.len() < options.max_diagnostics {
        let Some(file) = lexer.files.last_mut() else {
            break;
        };

        if file.at_eof() {
            trace!(file = file.name(), "closing file");
            lexer.eof_location = file.location();
            lexer.files.pop();
            continue;
        }

        if file.at_end_of_line() {
            file.next_line();
            continue;
        }

        if let Err(error) = lexer.next_token() {
            trace!(%error, "discarding rest of line");
            lexer.diagnostics.push(error);
            lexer.skip_line();
            continue;
        }

        if let Some((name, location)) = lexer.pending_include.take() {
            if let Err(error) = lexer.open_file(&name, loader, location) {
                lexer.diagnostics.push(error);
                lexer.skip_line();
            }
        }
    }

    let location = lexer.location();
    lexer.push(MK_TOKEN!(
        TokenKind::EOF,
        TokenDetail::None,
        String::new(),
        location
    ));

    debug!(
        tokens = lexer.tokens.len(),
        diagnostics = lexer.diagnostics.len(),
        "scan finished"
    );

    (lexer.tokens, lexer.diagnostics)
}
