//! Correlation — derives the request id of a message and groups records by it.
//!
//! Services put the request id either as the very first bracketed token of a
//! message (`(550e8400-...) user loaded`) or inside a logging-context dict
//! (`{'request_uuid': '...'}`). The first position is checked before scanning.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{LogRecord, Value};

/// Context keys that carry a request id, in lookup order.
pub const REQUEST_ID_KEYS: [&str; 2] = ["request_uuid", "requestUuid"];

/// Correlation id of one message, from its evaluated expressions.
pub fn extract_correlation_id(expressions: &[Value]) -> Option<String> {
    let first = expressions.first()?;
    if let Value::Identifier(id) = first {
        return Some(id.to_string());
    }

    expressions
        .iter()
        .filter_map(Value::as_map)
        .find_map(|map| REQUEST_ID_KEYS.iter().find_map(|key| map.get(*key)))
        .and_then(|value| match value {
            // The first matching context decides, even when it carries no id.
            Value::Null => None,
            other => Some(other.to_string()),
        })
}

/// All records sharing one correlation id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestGroup {
    pub correlation_id: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub records: Vec<LogRecord>,
}

/// Group records by correlation id.
///
/// Groups come out in order of the first appearance of their id; records keep
/// their input order within a group. Records without an id are skipped.
pub fn group_by_correlation(records: &[LogRecord]) -> Vec<RequestGroup> {
    let mut groups: Vec<RequestGroup> = Vec::new();
    let mut index: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();

    for record in records {
        let Some(id) = record.correlation_id.as_deref() else {
            continue;
        };
        match index.get(id) {
            Some(&slot) => {
                let group = &mut groups[slot];
                group.first_seen = group.first_seen.min(record.time);
                group.last_seen = group.last_seen.max(record.time);
                group.records.push(record.clone());
            }
            None => {
                index.insert(id, groups.len());
                groups.push(RequestGroup {
                    correlation_id: id.to_string(),
                    first_seen: record.time,
                    last_seen: record.time,
                    records: vec![record.clone()],
                });
            }
        }
    }

    groups
}
