//! Fake CloudWatch Logs endpoint speaking the JSON 1.1 protocol.
//!
//! Everything is a `POST /` dispatched on the `X-Amz-Target` header. Only
//! `DescribeLogGroups` and `FilterLogEvents` are implemented; anything else
//! answers 400 with an `UnknownOperationException`, as the real service does.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Default)]
struct ApiState {
    /// Log group name → (timestamp millis, message, event id).
    groups: BTreeMap<String, Vec<(i64, String, String)>>,
    /// `(target, body)` of every request, in arrival order.
    requests: Vec<(String, Value)>,
}

pub struct FakeCloudwatchApi {
    addr: SocketAddr,
    state: Arc<Mutex<ApiState>>,
}

impl FakeCloudwatchApi {
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(ApiState::default()));

        let app = Router::new()
            .route("/", post(dispatch))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self { addr, state })
    }

    /// Endpoint string for `CloudwatchSource::from_config`.
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn add_group(&self, name: &str) {
        self.state.lock().await.groups.entry(name.to_string()).or_default();
    }

    pub async fn put_event(&self, group: &str, time: DateTime<Utc>, message: &str) {
        let mut state = self.state.lock().await;
        let events = state.groups.entry(group.to_string()).or_default();
        let id = format!("{group}/{}", events.len());
        events.push((time.timestamp_millis(), message.to_string(), id));
    }

    /// Requests received so far as `(X-Amz-Target, JSON body)`.
    pub async fn requests(&self) -> Vec<(String, Value)> {
        self.state.lock().await.requests.clone()
    }
}

fn aws_error(kind: &str, message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "__type": kind, "message": message })),
    )
        .into_response()
}

async fn dispatch(
    State(state): State<Arc<Mutex<ApiState>>>,
    headers: HeaderMap,
    raw: Bytes,
) -> Response {
    // `application/x-amz-json-1.1` bodies are refused by the `Json` extractor.
    let Ok(body) = serde_json::from_slice::<Value>(&raw) else {
        return aws_error("SerializationException", "body is not JSON".to_string());
    };

    let target = headers
        .get("x-amz-target")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let mut state = state.lock().await;
    state.requests.push((target.clone(), body.clone()));

    match target.as_str() {
        "Logs_20140328.DescribeLogGroups" => {
            let groups: Vec<_> = state
                .groups
                .keys()
                .map(|name| json!({ "logGroupName": name, "storedBytes": 0 }))
                .collect();
            Json(json!({ "logGroups": groups })).into_response()
        }
        "Logs_20140328.FilterLogEvents" => {
            let name = body["logGroupName"].as_str().unwrap_or_default();
            let Some(events) = state.groups.get(name) else {
                return aws_error(
                    "ResourceNotFoundException",
                    format!("The specified log group does not exist: {name}"),
                );
            };
            let start = body["startTime"].as_i64().unwrap_or(i64::MIN);
            let end = body["endTime"].as_i64().unwrap_or(i64::MAX);
            let events: Vec<_> = events
                .iter()
                .filter(|(t, _, _)| *t >= start && *t <= end)
                .map(|(t, message, id)| {
                    json!({
                        "logStreamName": "stream-1",
                        "timestamp": t,
                        "message": message,
                        "ingestionTime": t + 5,
                        "eventId": id
                    })
                })
                .collect();
            Json(json!({ "events": events, "searchedLogStreams": [] })).into_response()
        }
        other => aws_error("UnknownOperationException", format!("unknown target {other:?}")),
    }
}
