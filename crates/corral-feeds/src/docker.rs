//! Docker — reads container logs from the Docker Engine API.
//!
//! Streams are named `<container name>:<short id>`, the form
//! [`DockerSource::list_streams`] hands out. Logs are requested with
//! `timestamps=1`, so every line starts with an RFC 3339 timestamp followed by
//! a single space.
//!
//! Containers started without a TTY multiplex stdout and stderr in one body,
//! each chunk prefixed by an 8-byte frame header
//! (`[stream_type, 0, 0, 0, size_be_u32]`). [`demultiplex`] strips those
//! headers; TTY bodies are passed through untouched.

use chrono::{DateTime, Utc};
use hyper::Method;
use serde::Deserialize;
use uuid::Uuid;

use corral_core::{RawEvent, SourceKind, TimeWindow};

use crate::error::FeedError;
use crate::http::{self, Endpoint};
use crate::{BoxFuture, LogSource};

const SHORT_ID_LEN: usize = 12;
const FRAME_HEADER_LEN: usize = 8;

/// Docker Engine API adapter.
#[derive(Debug, Clone)]
pub struct DockerSource {
    endpoint: Endpoint,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerSummary {
    id: String,
    #[serde(default)]
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerInspect {
    name: String,
}

impl DockerSource {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    /// Build from a config string such as `unix:///var/run/docker.sock`.
    pub fn from_config(endpoint: &str) -> Result<Self, FeedError> {
        Ok(Self::new(Endpoint::parse(endpoint)?))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, FeedError> {
        let body = self.get(path).await?;
        serde_json::from_slice(&body).map_err(|err| FeedError::Decode {
            endpoint: self.endpoint.to_string(),
            reason: err.to_string(),
        })
    }

    async fn get(&self, path: &str) -> Result<hyper::body::Bytes, FeedError> {
        http::send(&self.endpoint, Method::GET, path, &[], Vec::new())
            .await?
            .into_success(&self.endpoint)
    }

    async fn running_containers(&self) -> Result<Vec<String>, FeedError> {
        let containers: Vec<ContainerSummary> = self.get_json("/containers/json").await?;
        Ok(containers
            .into_iter()
            .map(|c| {
                let name = c
                    .names
                    .first()
                    .map(|n| n.trim_start_matches('/').to_string())
                    .unwrap_or_default();
                let short_id: String = c.id.chars().take(SHORT_ID_LEN).collect();
                format!("{name}:{short_id}")
            })
            .collect())
    }

    async fn container_logs(
        &self,
        stream: &str,
        window: TimeWindow,
    ) -> Result<Vec<RawEvent>, FeedError> {
        let id = container_id(stream)?;
        let inspect: ContainerInspect = self.get_json(&format!("/containers/{id}/json")).await?;
        let name = inspect.name.trim_start_matches('/').to_string();

        let mut path = format!(
            "/containers/{id}/logs?stdout=1&stderr=1&timestamps=1&since={}",
            window.start.timestamp()
        );
        if let Some(end) = window.end {
            path.push_str(&format!("&until={}", end.timestamp()));
        }
        let body = self.get(&path).await?;

        let events = split_lines(&demultiplex(&body))
            .iter()
            .map(|line| {
                let (time, message) = split_timestamp(line);
                RawEvent {
                    time: time.unwrap_or_else(Utc::now),
                    source: name.clone(),
                    message: message.to_string(),
                    event_id: Uuid::new_v4().simple().to_string(),
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(container = %name, lines = events.len(), "fetched docker logs");
        Ok(events)
    }
}

impl LogSource for DockerSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Docker
    }

    fn list_streams(&self) -> BoxFuture<'_, Result<Vec<String>, FeedError>> {
        Box::pin(self.running_containers())
    }

    fn fetch<'a>(
        &'a self,
        stream: &'a str,
        window: TimeWindow,
    ) -> BoxFuture<'a, Result<Vec<RawEvent>, FeedError>> {
        Box::pin(self.container_logs(stream, window))
    }
}

/// The container id of a `<name>:<id>` stream; a bare id is accepted too.
pub fn container_id(stream: &str) -> Result<&str, FeedError> {
    let id = stream.rsplit(':').next().unwrap_or(stream);
    let valid = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if id.is_empty() || !valid || id.starts_with('.') {
        return Err(FeedError::InvalidStream(stream.to_string()));
    }
    Ok(id)
}

/// Strip Docker stream frame headers, if the body carries them.
pub fn demultiplex(body: &[u8]) -> Vec<u8> {
    if !is_multiplexed(body) {
        return body.to_vec();
    }

    let mut out = Vec::with_capacity(body.len());
    let mut rest = body;
    while rest.len() >= FRAME_HEADER_LEN {
        let size = u32::from_be_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize;
        let payload = &rest[FRAME_HEADER_LEN..];
        let take = size.min(payload.len());
        out.extend_from_slice(&payload[..take]);
        rest = &payload[take..];
    }
    out
}

fn is_multiplexed(body: &[u8]) -> bool {
    body.len() >= FRAME_HEADER_LEN && body[0] <= 2 && body[1..4] == [0, 0, 0]
}

/// Non-empty lines of a log body, lossily decoded.
pub fn split_lines(body: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(body)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `"<rfc3339> <message>"`. Lines without a leading timestamp keep the
/// whole text as the message.
pub fn split_timestamp(line: &str) -> (Option<DateTime<Utc>>, &str) {
    if let Some((stamp, message)) = line.split_once(' ') {
        if let Ok(time) = DateTime::parse_from_rfc3339(stamp) {
            return (Some(time.with_timezone(&Utc)), message);
        }
    }
    (None, line)
}
