//! Aggregator — fans one ingest request out over its streams.
//!
//! Every stream is fetched on its own task under the configured timeout.
//! Results are slotted back by request index before assembly, so records
//! sharing a timestamp keep request order through the stable sort.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use corral_core::{
    assemble_all, sort_by_time, LogRecord, NoiseFilter, RawEvent, SourceKind, TimeWindow,
};

use crate::error::FeedError;
use crate::LogSource;

pub struct Aggregator {
    sources: HashMap<SourceKind, Arc<dyn LogSource>>,
    filter: NoiseFilter,
    fetch_timeout: Duration,
}

impl Aggregator {
    /// A later source of the same kind replaces an earlier one.
    pub fn new(
        sources: Vec<Arc<dyn LogSource>>,
        filter: NoiseFilter,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            sources: sources.into_iter().map(|s| (s.kind(), s)).collect(),
            filter,
            fetch_timeout,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    fn source(&self, kind: SourceKind) -> Result<&Arc<dyn LogSource>, FeedError> {
        self.sources.get(&kind).ok_or(FeedError::UnknownSource(kind))
    }

    pub async fn list_streams(&self, kind: SourceKind) -> Result<Vec<String>, FeedError> {
        self.source(kind)?.list_streams().await
    }

    /// Fetch, filter, parse and time-sort the records of `streams`.
    ///
    /// The first stream to fail fails the whole call; the remaining fetches
    /// are aborted.
    pub async fn ingest(
        &self,
        kind: SourceKind,
        streams: &[String],
        window: TimeWindow,
    ) -> Result<Vec<LogRecord>, FeedError> {
        let source = self.source(kind)?;
        let timeout = self.fetch_timeout;

        let mut tasks = JoinSet::new();
        for (index, stream) in streams.iter().cloned().enumerate() {
            let source = Arc::clone(source);
            tasks.spawn(async move {
                let fetched = tokio::time::timeout(timeout, source.fetch(&stream, window))
                    .await
                    .unwrap_or(Err(FeedError::Timeout(timeout)))
                    .map_err(|err| err.in_stream(stream.as_str()));
                (index, fetched)
            });
        }

        let mut slots: Vec<Vec<RawEvent>> = vec![Vec::new(); streams.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, fetched) = joined.map_err(|err| FeedError::Task(err.to_string()))?;
            match fetched {
                Ok(events) => slots[index] = events,
                Err(err) => {
                    tracing::warn!(%kind, error = %err, "ingest failed");
                    return Err(err);
                }
            }
        }

        let raw_count: usize = slots.iter().map(Vec::len).sum();
        let mut records = assemble_all(slots.into_iter().flatten(), &self.filter);
        sort_by_time(&mut records);

        tracing::info!(
            %kind,
            streams = streams.len(),
            lines = raw_count,
            records = records.len(),
            "ingest complete"
        );
        Ok(records)
    }
}
