//! Scopes and type rules.
//!
//! Symbols are resolved through a chain of frames held in a [`frames::FrameArena`].
//! [`type_checker::type_of`] computes the type of any parsed node, and the
//! assignability and operator rules here are what the expression parser checks
//! each node against as it builds it.

pub mod frames;
pub mod type_checker;

#[cfg(test)]
mod tests;
