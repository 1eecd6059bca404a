//! Error types for displayfilter.

use thiserror::Error;

/// Errors produced while compiling a filter expression.
///
/// Evaluation has no error type of its own: a field or protocol that is
/// absent from a packet's dissection simply never matches.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The filter text was empty or all whitespace.
    #[error("empty filter expression")]
    InvalidArgument,

    /// The filter text could not be turned into a predicate tree.
    #[error("filter syntax error: {0}")]
    Syntax(String),
}

/// Result type alias using our CompileError type.
pub type Result<T> = std::result::Result<T, CompileError>;
