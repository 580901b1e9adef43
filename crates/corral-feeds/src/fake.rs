//! Fake — in-memory [`LogSource`] for tests and benchmarks.
//!
//! Streams are seeded up front with the builder methods; `fetch` returns the
//! seeded events that fall inside the requested window, after an optional
//! delay. Individual streams can be made to fail with a canned status.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use corral_core::{RawEvent, SourceKind, TimeWindow};

use crate::error::FeedError;
use crate::{BoxFuture, LogSource};

#[derive(Debug)]
pub struct FakeSource {
    kind: SourceKind,
    streams: Vec<String>,
    events: HashMap<String, Vec<RawEvent>>,
    failures: HashMap<String, u16>,
    delays: HashMap<String, Duration>,
    fetches: AtomicUsize,
}

impl FakeSource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            streams: Vec::new(),
            events: HashMap::new(),
            failures: HashMap::new(),
            delays: HashMap::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Seed a stream with its events.
    pub fn with_stream(mut self, name: &str, events: Vec<RawEvent>) -> Self {
        if !self.streams.iter().any(|s| s == name) {
            self.streams.push(name.to_string());
        }
        self.events.entry(name.to_string()).or_default().extend(events);
        self
    }

    /// Make fetches of `name` answer with an HTTP `status`.
    pub fn failing(mut self, name: &str, status: u16) -> Self {
        self.failures.insert(name.to_string(), status);
        self
    }

    /// Hold fetches of `name` for `delay` before answering.
    pub fn delayed(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    /// Number of `fetch` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn fetch_stream(
        &self,
        stream: &str,
        window: TimeWindow,
    ) -> Result<Vec<RawEvent>, FeedError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(stream) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(status) = self.failures.get(stream) {
            return Err(FeedError::Status {
                endpoint: format!("fake://{}", self.kind),
                status: *status,
                body: format!("canned failure for {stream}"),
            });
        }
        let events = self.events.get(stream).ok_or_else(|| FeedError::Status {
            endpoint: format!("fake://{}", self.kind),
            status: 404,
            body: format!("no such stream {stream}"),
        })?;
        Ok(events
            .iter()
            .filter(|e| window.contains(e.time))
            .cloned()
            .collect())
    }
}

impl LogSource for FakeSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn list_streams(&self) -> BoxFuture<'_, Result<Vec<String>, FeedError>> {
        let streams = self.streams.clone();
        Box::pin(async move { Ok(streams) })
    }

    fn fetch<'a>(
        &'a self,
        stream: &'a str,
        window: TimeWindow,
    ) -> BoxFuture<'a, Result<Vec<RawEvent>, FeedError>> {
        Box::pin(self.fetch_stream(stream, window))
    }
}
