//! Message parser — pulls bracketed sub-expressions out of free-text log lines.
//!
//! [`tokenize`] walks the message once with a bracket stack. Every top-level
//! balanced group (`(..)`, `[..]`, `{..}`) is cut out of the text and replaced
//! by [`PLACEHOLDER`]; nested groups stay inside their enclosing expression.
//! [`parse_message`] then runs each cut-out expression through
//! [`literal::evaluate`].
//!
//! ```text
//! "user {'id': 5} logged in"
//!     formatted:   "user $#$ logged in"
//!     expressions: [{"id": 5}]
//! ```

pub mod ident;
pub mod literal;

use crate::error::ParseError;
use crate::types::Value;

/// Marker substituted into the formatted message for each removed expression.
pub const PLACEHOLDER: &str = "$#$";

/// Output of [`parse_message`].
///
/// `formatted` contains exactly one [`PLACEHOLDER`] per entry of
/// `expressions`, in the same left-to-right order (as long as the input did not
/// already contain the marker text).
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub formatted: String,
    pub expressions: Vec<Value>,
}

/// Raw output of the bracket scan, before evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub formatted: String,
    pub expressions: Vec<String>,
}

/// Tokenize `message` and evaluate every top-level expression.
pub fn parse_message(message: &str) -> Result<ParseResult, ParseError> {
    let tokens = tokenize(message)?;
    Ok(ParseResult {
        formatted: tokens.formatted,
        expressions: tokens
            .expressions
            .iter()
            .map(|expr| literal::evaluate(expr))
            .collect(),
    })
}

/// Split `message` into formatted text and raw top-level expressions.
pub fn tokenize(message: &str) -> Result<Tokens, ParseError> {
    let mut stack: Vec<char> = Vec::new();
    let mut current = String::new();
    let mut formatted = String::with_capacity(message.len());
    let mut expressions = Vec::new();

    for ch in message.chars() {
        let opens = is_opener(ch);
        if !stack.is_empty() || opens {
            current.push(ch);
        } else {
            formatted.push(ch);
        }

        if opens {
            stack.push(ch);
        } else if let Some(opener) = opener_for(ch) {
            if stack.last() != Some(&opener) {
                return Err(ParseError::MalformedExpression { partial: current });
            }
            stack.pop();
            if stack.is_empty() {
                expressions.push(std::mem::take(&mut current));
                formatted.push_str(PLACEHOLDER);
            }
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::UnterminatedExpression { partial: current });
    }

    Ok(Tokens {
        formatted,
        expressions,
    })
}

fn is_opener(ch: char) -> bool {
    matches!(ch, '(' | '[' | '{')
}

fn opener_for(closer: char) -> Option<char> {
    match closer {
        ')' => Some('('),
        ']' => Some('['),
        '}' => Some('{'),
        _ => None,
    }
}
