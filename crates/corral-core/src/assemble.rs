//! Record assembly — raw source lines in, [`LogRecord`] values out.
//!
//! Lines matching a [`NoiseFilter`] pattern are dropped before parsing. A line
//! that fails to tokenize is still kept, with its raw message and empty
//! structured fields.

use crate::correlate::extract_correlation_id;
use crate::parser::parse_message;
use crate::types::{LogRecord, RawEvent};

/// Health-check access lines that flood every service log.
pub const DEFAULT_NOISE_PATTERNS: &[&str] = &[r#""GET / HTTP/1.1" 200"#];

/// Substring patterns for lines that are suppressed before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseFilter {
    patterns: Vec<String>,
}

impl NoiseFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// A filter that lets everything through.
    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn is_noise(&self, line: &str) -> bool {
        self.patterns.iter().any(|p| line.contains(p.as_str()))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_PATTERNS.iter().copied())
    }
}

/// Build one record. Never fails; tokenizer errors degrade the structured
/// fields only.
pub fn assemble(event: RawEvent) -> LogRecord {
    let (formatted_message, expressions) = match parse_message(&event.message) {
        Ok(parsed) => (Some(parsed.formatted), parsed.expressions),
        Err(err) => {
            tracing::debug!(source = %event.source, error = %err, "message left unparsed");
            (None, Vec::new())
        }
    };

    LogRecord {
        time: event.time,
        source: event.source,
        raw_message: event.message,
        correlation_id: extract_correlation_id(&expressions),
        formatted_message,
        event_id: event.event_id,
        expressions,
    }
}

/// Filter and assemble a batch, keeping input order.
pub fn assemble_all<I>(events: I, filter: &NoiseFilter) -> Vec<LogRecord>
where
    I: IntoIterator<Item = RawEvent>,
{
    events
        .into_iter()
        .filter(|event| !filter.is_noise(&event.message))
        .map(assemble)
        .collect()
}

/// Stable ascending sort by time; equal timestamps keep encounter order.
pub fn sort_by_time(records: &mut [LogRecord]) {
    records.sort_by_key(|record| record.time);
}
