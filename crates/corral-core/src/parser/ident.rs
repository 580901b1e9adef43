//! Identifier normalizer — recognises UUID-shaped text.
//!
//! Accepted shapes are anything that reduces to 32 hex digits once hyphens,
//! surrounding braces and a `urn:uuid:` prefix are removed. The canonical form
//! is the lowercase hyphenated string.

use uuid::Uuid;

use crate::types::Value;

/// `Identifier` when `text` is UUID-shaped, otherwise `Opaque(text)` unchanged.
pub fn normalize(text: &str) -> Value {
    match parse_identifier(text) {
        Some(id) => Value::Identifier(id),
        None => Value::Opaque(text.to_string()),
    }
}

pub fn parse_identifier(text: &str) -> Option<Uuid> {
    let rest = text.strip_prefix("urn:").unwrap_or(text);
    let rest = rest.strip_prefix("uuid:").unwrap_or(rest);
    let rest = rest.trim_matches(|c| c == '{' || c == '}');

    let hex: String = rest.chars().filter(|c| *c != '-').collect();
    if hex.len() != 32 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u128::from_str_radix(&hex, 16).ok().map(Uuid::from_u128)
}
