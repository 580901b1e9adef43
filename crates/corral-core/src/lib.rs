//! corral-core — record model and message-parsing engine for corral.
//!
//! The crate is split into the pure parsing engine and the thin assembly layer
//! that turns raw source lines into [`LogRecord`] values.
//!
//! # Architecture
//!
//! ```text
//! raw line ──► parser::tokenize ──► parser::literal ──► correlate ──► LogRecord
//!                                        │
//!                                        └──► parser::ident
//! ```
//!
//! Nothing in here performs I/O. Source adapters and the aggregator live in
//! `corral-feeds`; the HTTP surface lives in `corral-http`.

pub mod assemble;
pub mod config;
pub mod correlate;
pub mod error;
pub mod parser;
pub mod types;

pub use assemble::{assemble, assemble_all, sort_by_time, NoiseFilter};
pub use correlate::{extract_correlation_id, group_by_correlation, RequestGroup};
pub use error::ParseError;
pub use parser::{parse_message, ParseResult, PLACEHOLDER};
pub use types::{LogRecord, RawEvent, SourceKind, TimeWindow, UnknownSourceKind, Value};
