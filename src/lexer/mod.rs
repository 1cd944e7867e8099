//! Lexical analysis.
//!
//! Turns an entry file, and every file it pulls in with `include "..."` or
//! `import "..."`, into one flat token stream. Tokens carry 1-based line and
//! column locations in the file they came from.
//!
//! - Anchored regex patterns classify tokens in priority order
//! - `#` starts a comment that runs to the end of the line
//! - A file is opened at most once per scan
//! - A bad token becomes a diagnostic and the rest of its line is skipped

pub mod lexer;
pub mod source;
pub mod tokens;
