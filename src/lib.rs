#![allow(clippy::module_inception)]

use std::{collections::HashMap, fmt::Display, rc::Rc};

use tracing::debug;

use crate::{
    ast::{ast::Node, types::TypeTable},
    config::CompileOptions,
    errors::errors::{Error, ErrorTip},
    lexer::{lexer::scan, source::SourceLoader, tokens::Token},
    parser::{
        expr::parse_function_body,
        structure::{structure_pass, CollectedClass, FunctionSignature},
    },
    type_checker::frames::FrameArena,
};

pub mod ast;
pub mod config;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;

extern crate regex;

/// A point in a source file. Lines and columns are 1-based, columns count characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub filename: Rc<String>,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: Rc<String>, line: u32, column: u32) -> Self {
        SourceLocation {
            filename,
            line,
            column,
        }
    }

    /// Location used for diagnostics that have no place in user source.
    pub fn internal() -> Self {
        SourceLocation::new(Rc::new(String::from("<internal>")), 0, 0)
    }

    pub fn same_line(&self, other: &SourceLocation) -> bool {
        self.line == other.line && self.filename == other.filename
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// A function whose body has been parsed and type checked.
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub name: Token,
    pub signature: FunctionSignature,
    pub argument_names: Vec<Token>,
    pub body: Node,
    /// Scopes referenced by the `frame` of every node in `body`.
    pub frames: FrameArena,
}

/// Read-only result of a successful compile, handed to later stages such as code generation.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    pub types: TypeTable,
    pub functions: HashMap<String, Vec<CompiledFunction>>,
    pub classes: Vec<CollectedClass>,
}

/// Runs Scan -> Structure Pass -> Verify -> per-function body parsing.
///
/// Stops after the first phase that reports anything and returns every diagnostic of
/// that phase, in source order.
pub fn compile(
    entry: &str,
    loader: &dyn SourceLoader,
    options: &CompileOptions,
) -> Result<CompiledModule, Vec<Error>> {
    let (tokens, errors) = scan(entry, loader, options);
    if !errors.is_empty() {
        return Err(errors);
    }

    let (module, errors) = structure_pass(tokens, options);
    if !errors.is_empty() {
        return Err(errors);
    }

    let errors = module.verify();
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut diagnostics = Vec::new();
    let mut functions: HashMap<String, Vec<CompiledFunction>> = HashMap::new();

    for (_, function) in module.functions() {
        if diagnostics.len() >= options.max_diagnostics {
            break;
        }

        let body = match parse_function_body(&module, function, options) {
            Ok(body) => body,
            Err(internal) => {
                diagnostics.push(internal);
                return Err(diagnostics);
            }
        };

        diagnostics.extend(body.diagnostics);
        if let Some(ast) = body.ast {
            functions
                .entry(function.name.value.clone())
                .or_default()
                .push(CompiledFunction {
                    name: function.name.clone(),
                    signature: function.signature.clone(),
                    argument_names: function.argument_names.clone(),
                    body: ast,
                    frames: body.frames,
                });
        }
    }

    if !diagnostics.is_empty() {
        diagnostics.truncate(options.max_diagnostics);
        return Err(diagnostics);
    }

    debug!(functions = functions.len(), "module compiled");

    Ok(CompiledModule {
        types: module.types.clone(),
        functions,
        classes: module.classes().to_vec(),
    })
}

/// Fetches the text of the line a location points at.
pub fn get_line_at_location(loader: &dyn SourceLoader, location: &SourceLocation) -> Option<String> {
    let content = loader.load(&location.filename).ok()?;
    let index = (location.line as usize).checked_sub(1)?;
    content.lines().nth(index).map(String::from)
}


pub fn format_error(error: &Error, line_text: Option<&str>) -> String {
    /*
        Error: name (tip)
        -> final.syl:20:9
          |
        20 | let a = #
          | --------^
    */

    let location = error.get_location();
    let mut output = String::new();

    if let ErrorTip::None = error.get_tip() {
        output.push_str(&format!("Error: {}\n", error.get_error_name()));
    } else {
        output.push_str(&format!("Error: {} ({})\n", error.get_error_name(), error.get_tip()));
    }
    output.push_str(&format!("-> {}\n", location));

    let Some(line_text) = line_text else {
        return output;
    };

    let line_string = location.line.to_string();
    let padding = line_string.len() + 2;
    output.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(line_text);
    output.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim_end()));

    let arrows = (location.column as usize).saturating_sub(removed_whitespace).max(1);
    output.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));

    output
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' || c == '\t' {
            start += 1;
        } else {
            break;
        }
    }

    (string.chars().skip(start).collect(), start)
}
