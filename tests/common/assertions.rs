//! Assertion macros for corral harnesses.
//!
//! These wrap `pretty_assertions` and say which record broke which rule, so a
//! failure in a 50-line corpus points at the offending line.

/// Assert the correlation id of a `LogRecord`.
///
/// ```rust
/// assert_correlation!(record, Some("550e8400-e29b-41d4-a716-446655440000"));
/// assert_correlation!(record, None);
/// ```
#[macro_export]
macro_rules! assert_correlation {
    ($record:expr, $expected:expr) => {{
        let record: &corral_core::LogRecord = &$record;
        let expected: Option<&str> = $expected;
        if record.correlation_id.as_deref() != expected {
            panic!(
                "assert_correlation! failed:\n  expected: {:?}\n  actual:   {:?}\n  message:  {:?}",
                expected, record.correlation_id, record.raw_message
            );
        }
    }};
}

/// Assert that one placeholder stands in for each expression of a record.
#[macro_export]
macro_rules! assert_placeholders_match {
    ($record:expr) => {{
        let record: &corral_core::LogRecord = &$record;
        if let Some(formatted) = &record.formatted_message {
            let holes = formatted.matches(corral_core::PLACEHOLDER).count();
            pretty_assertions::assert_eq!(
                holes,
                record.expressions.len(),
                "placeholder count differs from expression count for {:?}",
                record.raw_message
            );
        }
    }};
}

/// Assert that records are in non-decreasing time order.
#[macro_export]
macro_rules! assert_sorted_by_time {
    ($records:expr) => {{
        let records: &[corral_core::LogRecord] = &$records;
        if let Some(i) = records.windows(2).position(|w| w[0].time > w[1].time) {
            panic!(
                "assert_sorted_by_time! failed at index {}:\n  {} {:?}\n  {} {:?}",
                i,
                records[i].time,
                records[i].raw_message,
                records[i + 1].time,
                records[i + 1].raw_message
            );
        }
    }};
}

/// Assert the raw messages of a record list, in order.
#[macro_export]
macro_rules! assert_messages {
    ($records:expr, [$($message:expr),* $(,)?]) => {{
        let records: &[corral_core::LogRecord] = &$records;
        let actual: Vec<&str> = records.iter().map(|r| r.raw_message.as_str()).collect();
        pretty_assertions::assert_eq!(actual, Vec::<&str>::from([$($message),*]));
    }};
}
