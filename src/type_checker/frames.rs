//! Lexical scopes.
//!
//! Frames live in a [`FrameArena`] and point at their parent by index, so a scope
//! chain is walked without shared ownership. The root frame belongs to the module;
//! every block, branch, loop and function body below it gets a fresh child.

use std::collections::HashMap;

use crate::{
    ast::types::Type,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::Token,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub usize);

impl FrameId {
    pub const ROOT: FrameId = FrameId(0);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub token: Token,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolFrame {
    symbols: HashMap<String, Symbol>,
    parent: Option<FrameId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameArena {
    frames: Vec<SymbolFrame>,
}

impl Default for FrameArena {
    fn default() -> Self {
        FrameArena::new()
    }
}

impl FrameArena {
    /// An arena holding only the root frame.
    pub fn new() -> Self {
        FrameArena {
            frames: vec![SymbolFrame::default()],
        }
    }

    pub fn push_child(&mut self, parent: FrameId) -> FrameId {
        self.frames.push(SymbolFrame {
            symbols: HashMap::new(),
            parent: Some(parent),
        });
        FrameId(self.frames.len() - 1)
    }

    pub fn parent(&self, frame: FrameId) -> Option<FrameId> {
        self.frames.get(frame.0).and_then(|frame| frame.parent)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Resolves `name` in `frame` or the nearest ancestor that declares it.
    pub fn lookup(&self, frame: FrameId, name: &str) -> Option<&Symbol> {
        let mut current = Some(frame);
        while let Some(id) = current {
            let frame = self.frames.get(id.0)?;
            if let Some(symbol) = frame.symbols.get(name) {
                return Some(symbol);
            }
            current = frame.parent;
        }
        None
    }

    pub fn lookup_local(&self, frame: FrameId, name: &str) -> Option<&Symbol> {
        self.frames
            .get(frame.0)
            .and_then(|frame| frame.symbols.get(name))
    }

    /// Adds `token` to `frame`. Shadowing an ancestor's symbol is allowed,
    /// redeclaring in the same frame is not.
    pub fn declare(&mut self, frame: FrameId, token: Token, ty: Type) -> Result<(), Error> {
        let Some(symbols) = self.frames.get_mut(frame.0).map(|frame| &mut frame.symbols) else {
            return Err(Error::internal(format!("declaration in unknown frame {}", frame.0)));
        };

        if symbols.contains_key(&token.value) {
            return Err(Error::new(
                ErrorImpl::VariableAlreadyDeclared {
                    variable: token.value.clone(),
                },
                token.location.clone(),
            ));
        }

        symbols.insert(token.value.clone(), Symbol { token, ty });
        Ok(())
    }
}
