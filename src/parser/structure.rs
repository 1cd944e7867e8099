//! Structure pass: one forward scan over the token stream that registers type
//! aliases and collects function signatures, leaving every body unparsed.
//!
//! Bodies are kept as token ranges so that every declaration in the module is
//! known before any body is type checked.

use std::{collections::HashMap, fmt::Display, ops::Range};

use tracing::{debug, trace};

use crate::{
    ast::types::{Type, TypeTable},
    config::CompileOptions,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Keyword, TagKind, Token, TokenDetail, TokenKind},
    type_checker::frames::FrameArena,
    SourceLocation,
};

use super::{parser::Parser, types::parse_type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    /// Call positions the function is restricted to. Empty means any position.
    pub tags: Vec<TagKind>,
    pub argument_types: Vec<Type>,
    pub return_type: Type,
}

impl FunctionSignature {
    pub fn arity(&self) -> usize {
        self.argument_types.len()
    }

    pub fn usable_as(&self, tag: TagKind) -> bool {
        self.tags.is_empty() || self.tags.contains(&tag)
    }
}

impl Display for FunctionSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for tag in &self.tags {
            write!(f, "{} ", tag)?;
        }
        let arguments: Vec<String> = self.argument_types.iter().map(Type::to_string).collect();
        write!(f, "({}) -> {}", arguments.join(", "), self.return_type)
    }
}

/// A declared function whose body has not been parsed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedFunction {
    pub name: Token,
    pub signature: FunctionSignature,
    pub argument_names: Vec<Token>,
    /// Range into the module's tokens. Brace bodies include both braces.
    pub body: Range<usize>,
}

/// A `class` declaration. Only its extent is recorded, no type is registered for it.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedClass {
    pub name: Token,
    pub body: Range<usize>,
}

/// Everything the structure pass learned about a module. Read-only once built.
#[derive(Debug, Clone)]
pub struct Module {
    tokens: Vec<Token>,
    pub types: TypeTable,
    functions: Vec<CollectedFunction>,
    function_lookup: HashMap<String, Vec<FunctionId>>,
    classes: Vec<CollectedClass>,
    frames: FrameArena,
}

impl Module {
    fn new() -> Self {
        Module {
            tokens: vec![],
            types: TypeTable::new(),
            functions: vec![],
            function_lookup: HashMap::new(),
            classes: vec![],
            frames: FrameArena::new(),
        }
    }

    fn add_function(&mut self, function: CollectedFunction) {
        let id = FunctionId(self.functions.len());
        self.function_lookup
            .entry(function.name.value.clone())
            .or_default()
            .push(id);
        self.functions.push(function);
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn body_tokens(&self, function: &CollectedFunction) -> &[Token] {
        self.tokens.get(function.body.clone()).unwrap_or(&[])
    }

    /// Where running off the end of a body is reported: the first token after it.
    pub fn body_end(&self, function: &CollectedFunction) -> SourceLocation {
        self.tokens
            .get(function.body.end)
            .or_else(|| self.tokens.last())
            .map(|token| token.location.clone())
            .unwrap_or_else(|| function.name.location.clone())
    }

    pub fn function(&self, id: FunctionId) -> Option<&CollectedFunction> {
        self.functions.get(id.0)
    }

    /// All functions in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &CollectedFunction)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(index, function)| (FunctionId(index), function))
    }

    pub fn overloads(&self, name: &str) -> &[FunctionId] {
        self.function_lookup
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_function_with_arity(&self, name: &str, arity: usize) -> bool {
        self.overloads(name).iter().any(|id| {
            self.function(*id)
                .is_some_and(|function| function.signature.arity() == arity)
        })
    }

    /// Whether `name` has an overload callable in `tag` position with `arity` operands.
    pub fn has_tagged_overload(&self, name: &str, arity: usize, tag: TagKind) -> bool {
        self.overloads(name).iter().any(|id| {
            self.function(*id).is_some_and(|function| {
                function.signature.arity() == arity && function.signature.usable_as(tag)
            })
        })
    }

    pub fn classes(&self) -> &[CollectedClass] {
        &self.classes
    }

    /// Scope chain holding only the module root frame. Function bodies extend a copy.
    pub fn root_frames(&self) -> &FrameArena {
        &self.frames
    }

    /// Checks every pair of same-named overloads for identical argument types.
    pub fn verify(&self) -> Vec<Error> {
        let mut errors = vec![];

        for (index, function) in self.functions.iter().enumerate() {
            for other in self.functions[index + 1..]
                .iter()
                .filter(|other| other.name.value == function.name.value)
            {
                if other.signature.argument_types != function.signature.argument_types {
                    continue;
                }

                let function_name = function.name.value.clone();
                let error = if other.signature.return_type != function.signature.return_type {
                    ErrorImpl::ReturnTypeOverload {
                        function: function_name,
                    }
                } else {
                    ErrorImpl::DuplicateOverload {
                        function: function_name,
                    }
                };
                errors.push(Error::new(error, other.name.location.clone()));
            }
        }

        debug!(
            functions = self.functions.len(),
            errors = errors.len(),
            "verified overloads"
        );
        errors
    }
}

/// Collects the top level declarations of `tokens`.
pub fn structure_pass(tokens: Vec<Token>, options: &CompileOptions) -> (Module, Vec<Error>) {
    let mut module = Module::new();
    let mut errors = vec![];

    let end = tokens
        .last()
        .map(|token| token.location.clone())
        .unwrap_or_else(SourceLocation::internal);
    let mut parser = Parser::new(&tokens, end);

    while parser.has_tokens() && errors.len() < options.max_diagnostics {
        let start = parser.position();

        let result = match parser.current_token().detail {
            TokenDetail::Keyword(Keyword::Using) | TokenDetail::Keyword(Keyword::Alias) => {
                parse_alias(&mut parser, &mut module)
            }
            TokenDetail::Keyword(Keyword::Func) => parse_function(&mut parser, &mut module, vec![]),
            TokenDetail::Tag(_) => parse_tagged_function(&mut parser, &mut module),
            TokenDetail::Keyword(Keyword::Class) => parse_class(&mut parser, &mut module),
            _ => {
                let token = parser.current_token();
                Err(Error::new(
                    ErrorImpl::UnexpectedTokenAtTopLevel {
                        token: token.to_string(),
                    },
                    token.location.clone(),
                ))
            }
        };

        if let Err(error) = result {
            trace!(%error, "skipping rest of top level line");
            errors.push(error);
            parser.synchronize(start);
        }
    }

    debug!(
        functions = module.functions.len(),
        classes = module.classes.len(),
        errors = errors.len(),
        "structure pass finished"
    );

    module.tokens = tokens;
    (module, errors)
}

fn parse_alias(parser: &mut Parser, module: &mut Module) -> Result<(), Error> {
    parser.advance();
    let name = parser.expect(TokenKind::Identifier)?;
    parser.expect_value("=")?;
    let ty = parse_type(parser, &module.types)?;

    if !module.types.define(&name.value, ty) {
        return Err(Error::new(
            ErrorImpl::TypeAlreadyDefined {
                type_: name.value.clone(),
            },
            name.location,
        ));
    }

    trace!(alias = %name.value, "registered type alias");
    Ok(())
}

fn parse_tagged_function(parser: &mut Parser, module: &mut Module) -> Result<(), Error> {
    let mut tags = vec![];
    while let Some(tag) = parser.current_token().tag_kind() {
        parser.advance();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    if !parser.is_keyword(Keyword::Func) {
        return Err(parser.unexpected("`func` after tags"));
    }

    parse_function(parser, module, tags)
}

fn parse_function(parser: &mut Parser, module: &mut Module, tags: Vec<TagKind>) -> Result<(), Error> {
    parser.expect_keyword(Keyword::Func)?;
    let name = parser.expect(TokenKind::Identifier)?;
    parser.expect(TokenKind::OpenParen)?;

    let mut argument_names: Vec<Token> = vec![];
    let mut argument_types = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        if !argument_names.is_empty() {
            parser.expect(TokenKind::Comma)?;
        }

        let argument = parser.expect(TokenKind::Identifier)?;
        if argument_names.iter().any(|name| name.value == argument.value) {
            return Err(Error::new(
                ErrorImpl::VariableAlreadyDeclared {
                    variable: argument.value.clone(),
                },
                argument.location,
            ));
        }

        parser.expect(TokenKind::Colon)?;
        argument_types.push(parse_type(parser, &module.types)?);
        argument_names.push(argument);
    }
    parser.expect(TokenKind::CloseParen)?;

    let return_type = if parser.is_value("->") {
        parser.advance();
        parse_type(parser, &module.types)?
    } else {
        Type::None
    };

    let body = if parser.is_value("=") {
        let equals = parser.advance();
        let start = parser.position();
        while parser.has_tokens() && parser.current_token().location.same_line(&equals.location) {
            parser.advance();
        }

        if parser.position() == start {
            return Err(Error::new(
                ErrorImpl::ExpectedExpression {
                    found: parser.current_token().to_string(),
                },
                equals.location,
            ));
        }
        start..parser.position()
    } else {
        let open = parser.expect(TokenKind::OpenCurly)?;
        collect_braced(parser, &open, &format!("the body of `{}`", name.value))?
    };

    trace!(
        function = %name.value,
        arguments = argument_types.len(),
        "collected function"
    );

    module.add_function(CollectedFunction {
        name,
        signature: FunctionSignature {
            tags,
            argument_types,
            return_type,
        },
        argument_names,
        body,
    });
    Ok(())
}

fn parse_class(parser: &mut Parser, module: &mut Module) -> Result<(), Error> {
    parser.expect_keyword(Keyword::Class)?;
    let name = parser.expect(TokenKind::Identifier)?;
    let open = parser.expect(TokenKind::OpenCurly)?;
    let body = collect_braced(parser, &open, &format!("class `{}`", name.value))?;

    trace!(class = %name.value, "collected class");
    module.classes.push(CollectedClass { name, body });
    Ok(())
}

/// Skips to the `}` matching the already consumed `open`, returning the range
/// from `open` through that `}`. A body may not run into another file.
fn collect_braced(parser: &mut Parser, open: &Token, context: &str) -> Result<Range<usize>, Error> {
    let start = parser.position() - 1;
    let mut depth = 1usize;

    while depth > 0 {
        let token = parser.current_token();
        if !parser.has_tokens() || token.location.filename != open.location.filename {
            return Err(Error::new(
                ErrorImpl::UnexpectedEof {
                    context: context.to_string(),
                },
                open.location.clone(),
            ));
        }

        match token.kind {
            TokenKind::OpenCurly => depth += 1,
            TokenKind::CloseCurly => depth -= 1,
            _ => {}
        }
        parser.advance();
    }

    Ok(start..parser.position())
}
