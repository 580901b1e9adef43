//! Errors raised by the message tokenizer.
//!
//! Only bracket structure can fail a parse. Literal evaluation and identifier
//! normalization always produce a value, so they have no error type here.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A closing bracket did not match the innermost open bracket, or closed
    /// nothing at all.
    #[error("malformed expression: {partial:?}")]
    MalformedExpression { partial: String },

    /// Input ended while at least one bracket was still open.
    #[error("unterminated expression: {partial:?}")]
    UnterminatedExpression { partial: String },
}

impl ParseError {
    /// The expression text accumulated before the failure.
    pub fn partial(&self) -> &str {
        match self {
            ParseError::MalformedExpression { partial }
            | ParseError::UnterminatedExpression { partial } => partial,
        }
    }
}
