//! CloudWatch Logs over the JSON 1.1 protocol.
//!
//! Requests go unsigned to a configured endpoint, which suits local emulators
//! and signing proxies. Streams are log group names.

use chrono::{DateTime, TimeZone, Utc};
use hyper::Method;
use serde::{Deserialize, Serialize};

use corral_core::{RawEvent, SourceKind, TimeWindow};

use crate::error::FeedError;
use crate::http::{self, Endpoint};
use crate::{BoxFuture, LogSource};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "Logs_20140328";

#[derive(Debug, Clone)]
pub struct CloudwatchSource {
    endpoint: Endpoint,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct DescribeLogGroupsRequest {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeLogGroupsResponse {
    #[serde(default)]
    log_groups: Vec<LogGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogGroup {
    log_group_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterLogEventsRequest<'a> {
    log_group_name: &'a str,
    start_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterLogEventsResponse {
    #[serde(default)]
    events: Vec<FilteredEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilteredEvent {
    timestamp: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    event_id: String,
}

impl CloudwatchSource {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn from_config(endpoint: &str) -> Result<Self, FeedError> {
        Ok(Self::new(Endpoint::parse(endpoint)?))
    }

    async fn call<Req, Resp>(&self, action: &str, request: &Req) -> Result<Resp, FeedError>
    where
        Req: Serialize,
        Resp: serde::de::DeserializeOwned,
    {
        let body = serde_json::to_vec(request)
            .map_err(|err| FeedError::InvalidRequest(err.to_string()))?;
        let target = format!("{TARGET_PREFIX}.{action}");
        let headers = [("content-type", CONTENT_TYPE), ("x-amz-target", target.as_str())];

        let bytes = http::send(&self.endpoint, Method::POST, "/", &headers, body)
            .await?
            .into_success(&self.endpoint)?;
        serde_json::from_slice(&bytes).map_err(|err| FeedError::Decode {
            endpoint: self.endpoint.to_string(),
            reason: format!("{action}: {err}"),
        })
    }

    async fn log_groups(&self) -> Result<Vec<String>, FeedError> {
        let response: DescribeLogGroupsResponse = self
            .call("DescribeLogGroups", &DescribeLogGroupsRequest::default())
            .await?;
        Ok(response
            .log_groups
            .into_iter()
            .map(|g| g.log_group_name)
            .collect())
    }

    async fn filter_events(
        &self,
        group: &str,
        window: TimeWindow,
    ) -> Result<Vec<RawEvent>, FeedError> {
        if group.is_empty() {
            return Err(FeedError::InvalidStream(group.to_string()));
        }
        let request = FilterLogEventsRequest {
            log_group_name: group,
            start_time: window.start.timestamp_millis(),
            end_time: window.end.map(|end| end.timestamp_millis()),
        };
        let response: FilterLogEventsResponse = self.call("FilterLogEvents", &request).await?;

        let events = response
            .events
            .into_iter()
            .map(|event| {
                Ok(RawEvent {
                    time: from_millis(event.timestamp).ok_or_else(|| FeedError::Decode {
                        endpoint: self.endpoint.to_string(),
                        reason: format!("timestamp {} out of range", event.timestamp),
                    })?,
                    source: group.to_string(),
                    message: event.message,
                    event_id: event.event_id,
                })
            })
            .collect::<Result<Vec<_>, FeedError>>()?;

        tracing::debug!(group, events = events.len(), "fetched cloudwatch events");
        Ok(events)
    }
}

impl LogSource for CloudwatchSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Cloudwatch
    }

    fn list_streams(&self) -> BoxFuture<'_, Result<Vec<String>, FeedError>> {
        Box::pin(self.log_groups())
    }

    fn fetch<'a>(
        &'a self,
        stream: &'a str,
        window: TimeWindow,
    ) -> BoxFuture<'a, Result<Vec<RawEvent>, FeedError>> {
        Box::pin(self.filter_events(stream, window))
    }
}

fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
