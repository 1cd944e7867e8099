//! Parser module: from the token stream to type checked function bodies.
//!
//! Parsing runs in two stages. The structure pass collects aliases, classes and
//! function signatures, keeping each body as a raw token range. Bodies are then
//! parsed one by one against the finished module, so a call may refer to a
//! function declared further down the file.
//!
//! - Structure pass and the module it produces
//! - Type grammar used by both stages
//! - Expression parsing with a Pratt loop for binary operators
//! - Panic-mode recovery to the next line
//!
//! The expression parser uses NUD (null denotation) and LED (left denotation)
//! dispatch with binding powers for precedence.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod structure;
pub mod types;

#[cfg(test)]
mod tests;
