//! corral-feeds — log source adapters for corral.
//!
//! Each adapter connects to one backend, lists the streams it offers, and
//! fetches the raw lines of a stream for a time window as
//! [`corral_core::RawEvent`] values. The [`aggregate::Aggregator`] fans out
//! over streams and hands the merged, time-sorted records back.
//!
//! Adapters are plain values built once at startup and shared behind an
//! `Arc<dyn LogSource>`; there is no global client.

pub mod aggregate;
pub mod cloudwatch;
pub mod docker;
pub mod error;
pub mod fake;
pub mod http;

use std::future::Future;
use std::pin::Pin;

use corral_core::{RawEvent, SourceKind, TimeWindow};

pub use aggregate::Aggregator;
pub use cloudwatch::CloudwatchSource;
pub use docker::DockerSource;
pub use error::FeedError;
pub use fake::FakeSource;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Implemented by each log backend.
///
/// Object-safe thanks to boxed futures, so the aggregator can hold any mix of
/// adapters.
pub trait LogSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Names of the streams this backend can serve.
    fn list_streams(&self) -> BoxFuture<'_, Result<Vec<String>, FeedError>>;

    /// Raw lines of one stream inside `window`.
    fn fetch<'a>(
        &'a self,
        stream: &'a str,
        window: TimeWindow,
    ) -> BoxFuture<'a, Result<Vec<RawEvent>, FeedError>>;
}
