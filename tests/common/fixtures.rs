//! Static message corpora used across harnesses.
//!
//! Every line is in the shape services actually interpolate into their logs:
//! Python-style reprs of dicts, lists and tuples around free text.

pub const REQUEST_ID: &str = "550e8400-e29b-41d4-a716-446655440000";
pub const OTHER_REQUEST_ID: &str = "6fa459ea-ee8a-3ca4-894e-db77e160355e";

/// Messages that lead with a parenthesised request id.
pub const CORPUS_LEADING_ID: &[&str] = &[
    "(550e8400-e29b-41d4-a716-446655440000) user loaded",
    "(550e8400e29b41d4a716446655440000) cache miss for ['user', 42]",
    "(urn:uuid:550e8400-e29b-41d4-a716-446655440000) done in (0.25) s",
    "(550E8400-E29B-41D4-A716-446655440000) {'status': 200}",
];

/// Messages that carry the request id in a logging-context dict.
pub const CORPUS_CONTEXT: &[&str] = &[
    "payment accepted {'request_uuid': '550e8400-e29b-41d4-a716-446655440000', 'amount': 12.5}",
    "retrying [1, 2, 3] {'requestUuid': '550e8400-e29b-41d4-a716-446655440000'}",
    "ctx {'user': 'bob'} then {'request_uuid': '550e8400-e29b-41d4-a716-446655440000'}",
    r#"job {"request_uuid": "550e8400-e29b-41d4-a716-446655440000", "ok": True}"#,
];

/// Messages with expressions but no request id.
pub const CORPUS_NO_ID: &[&str] = &[
    "user {'id': 5} logged in",
    "GET /api/v1/users 200 [12ms]",
    "matrix [[1, 2], [3, 4]] is singular",
    "flags {'a', 'b'} set",
    "call f(x) failed",
    "plain text with no brackets at all",
];

/// Messages the tokenizer rejects.
pub const CORPUS_MALFORMED: &[&str] = &[
    "mismatched (]",
    "stray ) closer",
    "never closed [1, 2",
    "crossed ({)}",
];

/// `n` synthetic messages cycling through all well-formed corpora.
pub fn corpus_high_volume(n: usize) -> Vec<String> {
    let pool: Vec<&str> = CORPUS_LEADING_ID
        .iter()
        .chain(CORPUS_CONTEXT)
        .chain(CORPUS_NO_ID)
        .copied()
        .collect();
    (0..n)
        .map(|i| format!("{} #{i}", pool[i % pool.len()]))
        .collect()
}
