//! Test builders for raw events, records and Docker frames.
//!
//! Built for readability in test assertions; they panic on bad input rather
//! than returning `Result`.

use chrono::{DateTime, TimeZone, Utc};
use corral_core::{assemble, LogRecord, RawEvent};

/// Fluent builder for [`RawEvent`] fixtures.
///
/// ```rust
/// let event = RawEventBuilder::new("user [5] logged in")
///     .source("/ecs/api")
///     .at_secs(1_705_312_800)
///     .build();
/// ```
pub struct RawEventBuilder {
    message: String,
    time: DateTime<Utc>,
    source: String,
    event_id: Option<String>,
}

impl RawEventBuilder {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            time: base_time(),
            source: "test-source".to_string(),
            event_id: None,
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    pub fn at_secs(self, secs: i64) -> Self {
        self.time(Utc.timestamp_opt(secs, 0).unwrap())
    }

    pub fn event_id(mut self, id: impl Into<String>) -> Self {
        self.event_id = Some(id.into());
        self
    }

    pub fn build(self) -> RawEvent {
        let event_id = self
            .event_id
            .unwrap_or_else(|| format!("{}-{}", self.source, self.time.timestamp_millis()));
        RawEvent {
            time: self.time,
            source: self.source,
            message: self.message,
            event_id,
        }
    }

    /// Build and run through the assembler.
    pub fn record(self) -> LogRecord {
        assemble(self.build())
    }
}

/// 2024-01-15T10:00:00Z, the moment every fixture is anchored to.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
}

/// `base_time()` plus `secs` seconds.
pub fn at(secs: i64) -> DateTime<Utc> {
    base_time() + chrono::Duration::seconds(secs)
}

/// One Docker multiplexed frame: `[stream, 0, 0, 0, len_be_u32] ++ payload`.
pub fn docker_frame(stream: u8, payload: &str) -> Vec<u8> {
    let mut frame = vec![stream, 0, 0, 0];
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload.as_bytes());
    frame
}
