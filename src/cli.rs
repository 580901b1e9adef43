//! Command-line surface: argument types and the command runners.

use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use corral_core::config::Config;
use corral_core::{group_by_correlation, SourceKind, TimeWindow};
use corral_feeds::{Aggregator, CloudwatchSource, DockerSource, LogSource};

#[derive(Debug, Parser)]
#[command(
    name = "corral",
    about = "Aggregate Docker and CloudWatch logs and follow requests across them"
)]
pub struct Cli {
    /// Write debug logs to /tmp/corral-debug.log (tail -f to inspect).
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file to use instead of ~/.config/corral/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the JSON HTTP API.
    Serve {
        /// Address to listen on; defaults to `[server] bind`.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// List the streams of an environment.
    Sources {
        #[arg(long, default_value = "cloudwatch")]
        environment: SourceKind,
    },
    /// Print the records of some streams as JSON lines.
    Logs {
        #[arg(long, default_value = "cloudwatch")]
        environment: SourceKind,
        /// Comma-separated stream names.
        #[arg(long, value_delimiter = ',', required = true)]
        sources: Vec<String>,
        /// RFC 3339 time or epoch milliseconds.
        #[arg(long, value_parser = parse_time)]
        since: DateTime<Utc>,
        #[arg(long, value_parser = parse_time)]
        until: Option<DateTime<Utc>>,
        /// Print one request group per line instead of one record.
        #[arg(long)]
        group: bool,
    },
}

/// Accepts `2024-01-15T10:00:00Z` or `1705312800000`.
pub fn parse_time(text: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(millis) = text.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| format!("{millis} is out of range"));
    }
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|err| format!("expected RFC 3339 or epoch millis: {err}"))
}

pub fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Config::load().context("loading config"),
    }
}

/// Build both adapters from config and wrap them in an [`Aggregator`].
pub fn build_aggregator(config: &Config) -> anyhow::Result<Aggregator> {
    let docker = DockerSource::from_config(&config.docker.endpoint)
        .context("invalid [docker] endpoint")?;
    let cloudwatch = CloudwatchSource::from_config(&config.cloudwatch.endpoint)
        .context("invalid [cloudwatch] endpoint")?;

    Ok(Aggregator::new(
        vec![
            Arc::new(docker) as Arc<dyn LogSource>,
            Arc::new(cloudwatch) as Arc<dyn LogSource>,
        ],
        config.ingest.noise_filter(),
        config.ingest.fetch_timeout(),
    ))
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let aggregator = build_aggregator(&config)?;

    match cli.command {
        Command::Serve { bind } => {
            let addr = match bind {
                Some(addr) => addr,
                None => config
                    .server
                    .bind
                    .parse()
                    .with_context(|| format!("invalid [server] bind {:?}", config.server.bind))?,
            };
            serve(aggregator, addr).await
        }
        Command::Sources { environment } => {
            let streams = aggregator.list_streams(environment).await?;
            let mut out = std::io::stdout().lock();
            for stream in streams {
                writeln!(out, "{stream}")?;
            }
            Ok(())
        }
        Command::Logs {
            environment,
            sources,
            since,
            until,
            group,
        } => {
            let window = TimeWindow { start: since, end: until };
            let records = aggregator.ingest(environment, &sources, window).await?;
            let mut out = std::io::stdout().lock();
            if group {
                write_json_lines(&mut out, &group_by_correlation(&records))
            } else {
                write_json_lines(&mut out, &records)
            }
        }
    }
}

async fn serve(aggregator: Aggregator, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, corral_http::router(Arc::new(aggregator)))
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %err, "cannot listen for ctrl-c");
            }
            tracing::info!("shutting down");
        })
        .await
        .context("server error")
}

/// One compact JSON document per line.
pub fn write_json_lines<W, T>(out: &mut W, items: &[T]) -> anyhow::Result<()>
where
    W: Write,
    T: serde::Serialize,
{
    for item in items {
        serde_json::to_writer(&mut *out, item)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
