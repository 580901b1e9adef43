//! Fake Docker Engine API server for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Serves:
//! - `GET /containers/json`: the configured containers
//! - `GET /containers/{id}/json`: inspect, answering `Name` only
//! - `GET /containers/{id}/logs`: buffered lines, timestamped, filtered by
//!   `since`/`until`, optionally in multiplexed frames
//!
//! Production talks to a Unix socket; tests point a `DockerSource` at
//! [`FakeDockerApi::endpoint`] over TCP instead.
//!
//! # Example
//!
//! ```rust,no_run
//! let api = FakeDockerApi::start().await.unwrap();
//! api.add_container("0123456789abcdef", "web").await;
//! api.push_log("0123456789abcdef", at(1), "user [5] logged in").await;
//! let source = DockerSource::from_config(&api.endpoint()).unwrap();
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use super::builders::docker_frame;

#[derive(Default)]
struct ApiState {
    containers: Vec<Container>,
    /// Raw query strings of every logs request, in arrival order.
    log_queries: Vec<String>,
}

struct Container {
    id: String,
    name: String,
    lines: Vec<(DateTime<Utc>, String)>,
    multiplexed: bool,
}

/// Handle to the running fake Docker API server.
pub struct FakeDockerApi {
    addr: SocketAddr,
    state: Arc<Mutex<ApiState>>,
}

impl FakeDockerApi {
    /// Start the server on a random port. Returns once the listener is bound.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(ApiState::default()));

        let app = Router::new()
            .route("/containers/json", get(list_containers))
            .route("/containers/{id}/json", get(inspect_container))
            .route("/containers/{id}/logs", get(container_logs))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self { addr, state })
    }

    /// Endpoint string for `DockerSource::from_config`.
    pub fn endpoint(&self) -> String {
        format!("tcp://{}", self.addr)
    }

    /// Register a running container; logs are served raw (TTY style).
    pub async fn add_container(&self, id: &str, name: &str) {
        self.state.lock().await.containers.push(Container {
            id: id.to_string(),
            name: name.to_string(),
            lines: Vec::new(),
            multiplexed: false,
        });
    }

    /// Serve this container's logs in stdout/stderr frames.
    pub async fn multiplex(&self, id: &str) {
        if let Some(c) = self.state.lock().await.containers.iter_mut().find(|c| c.id == id) {
            c.multiplexed = true;
        }
    }

    /// Buffer one log line written at `time`.
    pub async fn push_log(&self, id: &str, time: DateTime<Utc>, line: &str) {
        if let Some(c) = self.state.lock().await.containers.iter_mut().find(|c| c.id == id) {
            c.lines.push((time, line.to_string()));
        }
    }

    /// Query strings of the logs requests received so far.
    pub async fn log_queries(&self) -> Vec<String> {
        self.state.lock().await.log_queries.clone()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

type Shared = State<Arc<Mutex<ApiState>>>;

async fn list_containers(State(state): Shared) -> impl IntoResponse {
    let state = state.lock().await;
    let containers: Vec<_> = state
        .containers
        .iter()
        .map(|c| {
            serde_json::json!({
                "Id": c.id,
                "Names": [format!("/{}", c.name)],
                "State": "running",
                "Labels": {}
            })
        })
        .collect();
    Json(containers)
}

/// Docker resolves any unique id prefix; so does the fake.
fn find<'a>(state: &'a ApiState, id: &str) -> Option<&'a Container> {
    state.containers.iter().find(|c| c.id.starts_with(id))
}

fn no_such_container(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "message": format!("No such container: {id}") })),
    )
        .into_response()
}

async fn inspect_container(Path(id): Path<String>, State(state): Shared) -> Response {
    let state = state.lock().await;
    match find(&state, &id) {
        Some(c) => Json(serde_json::json!({ "Id": c.id, "Name": format!("/{}", c.name) }))
            .into_response(),
        None => no_such_container(&id),
    }
}

async fn container_logs(
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(state): Shared,
) -> Response {
    let mut state = state.lock().await;
    let query = {
        let mut pairs: Vec<_> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        pairs.sort();
        pairs.join("&")
    };
    state.log_queries.push(query);

    let Some(container) = find(&state, &id) else {
        return no_such_container(&id);
    };

    let secs = |key: &str| params.get(key).and_then(|v| v.parse::<i64>().ok());
    let since = secs("since").unwrap_or(0);
    let until = secs("until").unwrap_or(i64::MAX);

    let mut body = Vec::new();
    for (i, (time, line)) in container.lines.iter().enumerate() {
        let stamp = time.timestamp();
        if stamp < since || stamp > until {
            continue;
        }
        let text = format!("{} {line}\n", time.to_rfc3339_opts(SecondsFormat::Nanos, true));
        if container.multiplexed {
            let stream = if i % 2 == 0 { 1 } else { 2 };
            body.extend(docker_frame(stream, &text));
        } else {
            body.extend_from_slice(text.as_bytes());
        }
    }
    (StatusCode::OK, body).into_response()
}
