use std::time::Duration;

use corral_core::SourceKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("no {0} source configured")]
    UnknownSource(SourceKind),

    #[error("invalid endpoint {0:?}")]
    InvalidEndpoint(String),

    #[error("invalid stream name {0:?}")]
    InvalidStream(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("cannot connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("http error talking to {endpoint}: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: hyper::Error,
    },

    #[error("{endpoint} answered {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("cannot decode response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("stream {stream:?}: {source}")]
    Stream {
        stream: String,
        #[source]
        source: Box<FeedError>,
    },

    #[error("fetch task failed: {0}")]
    Task(String),
}

impl FeedError {
    /// Attach the stream name to an adapter error.
    pub fn in_stream(self, stream: impl Into<String>) -> Self {
        FeedError::Stream {
            stream: stream.into(),
            source: Box::new(self),
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            FeedError::Timeout(_) => true,
            FeedError::Stream { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// The backend answered with a 404.
    pub fn is_not_found(&self) -> bool {
        match self {
            FeedError::Status { status, .. } => *status == 404,
            FeedError::Stream { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}
