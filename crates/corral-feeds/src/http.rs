//! Minimal HTTP/1.1 client used by the adapters.
//!
//! One connection per request, over TCP or a Unix socket. Both backends answer
//! small, bounded bodies (one page of log events), so the body is collected in
//! full.

use std::fmt;
use std::path::PathBuf;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::FeedError;

/// Longest error body quoted back in [`FeedError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Where a backend listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    /// `host:port`
    Tcp(String),
}

impl Endpoint {
    /// Accepts `unix:///path`, `tcp://host:port` and `http://host:port`.
    pub fn parse(text: &str) -> Result<Self, FeedError> {
        if let Some(path) = text.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(FeedError::InvalidEndpoint(text.to_string()));
            }
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }

        let authority = text
            .strip_prefix("tcp://")
            .or_else(|| text.strip_prefix("http://"))
            .map(|rest| rest.trim_end_matches('/'))
            .ok_or_else(|| FeedError::InvalidEndpoint(text.to_string()))?;
        if authority.is_empty() || authority.contains('/') {
            return Err(FeedError::InvalidEndpoint(text.to_string()));
        }
        Ok(Endpoint::Tcp(authority.to_string()))
    }

    fn host(&self) -> &str {
        match self {
            Endpoint::Unix(_) => "localhost",
            Endpoint::Tcp(authority) => authority,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
            Endpoint::Tcp(authority) => write!(f, "http://{authority}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Bytes,
}

impl Response {
    /// The body of a 2xx response, or [`FeedError::Status`].
    pub fn into_success(self, endpoint: &Endpoint) -> Result<Bytes, FeedError> {
        if (200..300).contains(&self.status) {
            return Ok(self.body);
        }
        let mut body = String::from_utf8_lossy(&self.body).trim().to_string();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            body.truncate(cut);
        }
        Err(FeedError::Status {
            endpoint: endpoint.to_string(),
            status: self.status,
            body,
        })
    }
}

/// Send one request and collect the whole response.
pub async fn send(
    endpoint: &Endpoint,
    method: Method,
    path: &str,
    headers: &[(&str, &str)],
    body: Vec<u8>,
) -> Result<Response, FeedError> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(hyper::header::HOST, endpoint.host());
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder
        .body(Full::new(Bytes::from(body)))
        .map_err(|err| FeedError::InvalidRequest(err.to_string()))?;

    tracing::trace!(%endpoint, path, "sending request");

    match endpoint {
        Endpoint::Tcp(authority) => {
            let stream = tokio::net::TcpStream::connect(authority.as_str())
                .await
                .map_err(|source| FeedError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
            exchange(endpoint, stream, request).await
        }
        #[cfg(unix)]
        Endpoint::Unix(socket) => {
            let stream = tokio::net::UnixStream::connect(socket)
                .await
                .map_err(|source| FeedError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
            exchange(endpoint, stream, request).await
        }
        #[cfg(not(unix))]
        Endpoint::Unix(_) => Err(FeedError::InvalidEndpoint(endpoint.to_string())),
    }
}

async fn exchange<S>(
    endpoint: &Endpoint,
    stream: S,
    request: Request<Full<Bytes>>,
) -> Result<Response, FeedError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let http_err = |source: hyper::Error| FeedError::Http {
        endpoint: endpoint.to_string(),
        source,
    };

    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(http_err)?;
    tokio::spawn(async move {
        if let Err(err) = conn.await {
            tracing::debug!(error = %err, "backend connection closed with error");
        }
    });

    let response = sender.send_request(request).await.map_err(http_err)?;
    let status = response.status().as_u16();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(http_err)?
        .to_bytes();

    Ok(Response { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::unix("unix:///var/run/docker.sock", Endpoint::Unix("/var/run/docker.sock".into()))]
    #[case::tcp("tcp://10.0.0.2:2375", Endpoint::Tcp("10.0.0.2:2375".into()))]
    #[case::http("http://localhost:4566/", Endpoint::Tcp("localhost:4566".into()))]
    fn endpoints_parse(#[case] text: &str, #[case] expected: Endpoint) {
        assert_eq!(Endpoint::parse(text).unwrap(), expected);
    }

    #[rstest]
    #[case::no_scheme("localhost:4566")]
    #[case::https("https://logs.us-east-1.amazonaws.com")]
    #[case::path("http://localhost:4566/prefix")]
    #[case::empty_socket("unix://")]
    fn bad_endpoints_are_rejected(#[case] text: &str) {
        assert!(matches!(
            Endpoint::parse(text),
            Err(FeedError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn error_bodies_are_quoted_and_bounded() {
        let endpoint = Endpoint::Tcp("h:1".into());
        let response = Response {
            status: 500,
            body: Bytes::from("x".repeat(2_000)),
        };
        match response.into_success(&endpoint) {
            Err(FeedError::Status { status, body, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), MAX_ERROR_BODY);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
