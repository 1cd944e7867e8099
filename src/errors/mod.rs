//! Diagnostics produced by every compilation phase.
//!
//! An [`errors::Error`] pairs an [`errors::ErrorImpl`] with the
//! [`crate::SourceLocation`] it was raised at. Compile errors are recoverable at
//! the nearest recovery boundary; internal errors abort the compile.

pub mod errors;

#[cfg(test)]
mod tests;
