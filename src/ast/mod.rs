/// AST (Abstract Syntax Tree) module
/// Contains the parsed form of function bodies and the type model
///
/// Submodules:
/// - ast: The node sum type, node tags and their traits
/// - types: Types, their sizes and the module type table
pub mod ast;
pub mod types;

#[cfg(test)]
mod tests;
