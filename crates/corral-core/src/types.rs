//! Core types for corral-core.
//!
//! This module defines the data shared by every layer: the normalised
//! [`LogRecord`], the evaluated expression [`Value`], the [`RawEvent`] a source
//! adapter hands in, and the [`SourceKind`] discriminant.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// A normalised log record, one per ingested raw line.
///
/// Records are built once by [`crate::assemble`] and never mutated. Serialised
/// field names follow the JSON shape the web UI reads (`message`,
/// `request_uuid`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub time: DateTime<Utc>,
    /// Stream the line came from (log group name, container name).
    pub source: String,
    /// Raw line exactly as the source delivered it.
    #[serde(rename = "message")]
    pub raw_message: String,
    /// Correlation ("request") id, if one could be derived.
    #[serde(rename = "request_uuid")]
    pub correlation_id: Option<String>,
    /// Message with each top-level bracketed expression replaced by
    /// [`crate::PLACEHOLDER`]. `None` when the message failed to tokenize.
    pub formatted_message: Option<String>,
    pub event_id: String,
    pub expressions: Vec<Value>,
}

/// One raw line as supplied by a source adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub time: DateTime<Utc>,
    pub source: String,
    pub message: String,
    pub event_id: String,
}

/// A value recovered from one bracketed sub-expression of a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    /// A canonical UUID.
    Identifier(Uuid),
    Seq(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Evaluation failed; the raw text is kept verbatim.
    Opaque(String),
}

impl Value {
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Value::Opaque(_))
    }
}

/// String form: scalars print bare, identifiers in canonical hyphenated form,
/// containers as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) | Value::Opaque(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => f.write_str("null"),
            Value::Identifier(id) => write!(f, "{id}"),
            Value::Seq(_) | Value::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

/// Plain JSON: identifiers and opaque text both become strings.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) | Value::Opaque(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Null => serializer.serialize_unit(),
            Value::Identifier(id) => serializer.collect_str(id),
            Value::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

/// Which backend a stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Cloudwatch,
    Docker,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Cloudwatch => write!(f, "cloudwatch"),
            SourceKind::Docker => write!(f, "docker"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No environment '{0}'")]
pub struct UnknownSourceKind(pub String);

impl FromStr for SourceKind {
    type Err = UnknownSourceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cloudwatch" => Ok(SourceKind::Cloudwatch),
            "docker" => Ok(SourceKind::Docker),
            other => Err(UnknownSourceKind(other.to_string())),
        }
    }
}

/// Time range requested from a source. An open end means "up to now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn since(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Build a window from epoch milliseconds, as the HTTP surface receives it.
    pub fn from_millis(start_ms: i64, end_ms: Option<i64>) -> Option<Self> {
        let start = DateTime::from_timestamp_millis(start_ms)?;
        let end = match end_ms {
            Some(ms) => Some(DateTime::from_timestamp_millis(ms)?),
            None => None,
        };
        Some(Self { start, end })
    }

    /// Inclusive at both ends.
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.start && self.end.map_or(true, |end| time <= end)
    }
}
