//! Configuration types for corral.
//!
//! [`Config::load`] reads `~/.config/corral/config.toml`, creating it with
//! hardcoded defaults if it does not yet exist, then applies
//! `CORRAL__SECTION__KEY` environment overrides. [`Config::defaults`] returns
//! the same defaults without touching the filesystem (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assemble::NoiseFilter;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[server]
bind = "127.0.0.1:8000"

[docker]
endpoint = "unix:///var/run/docker.sock"

[cloudwatch]
endpoint = "http://127.0.0.1:4566"

[ingest]
fetch_timeout_secs = 30
noise_patterns     = ['"GET / HTTP/1.1" 200']
"#;

const ENV_PREFIX: &str = "CORRAL";

/// Splits list-valued environment overrides, e.g.
/// `CORRAL__INGEST__NOISE_PATTERNS=healthz,/metrics`.
const LIST_SEPARATOR: &str = ",";

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration, loaded from `~/.config/corral/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub cloudwatch: CloudwatchConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// `[server]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String { "127.0.0.1:8000".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// `[docker]` section. `endpoint` is `unix://<socket path>` or
/// `tcp://<host>:<port>`.
#[derive(Debug, Clone, Deserialize)]
pub struct DockerConfig {
    #[serde(default = "default_docker_endpoint")]
    pub endpoint: String,
}

fn default_docker_endpoint() -> String { "unix:///var/run/docker.sock".to_string() }

impl Default for DockerConfig {
    fn default() -> Self {
        Self { endpoint: default_docker_endpoint() }
    }
}

/// `[cloudwatch]` section. Requests are unsigned, so `endpoint` should point
/// at an emulator or a signing proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudwatchConfig {
    #[serde(default = "default_cloudwatch_endpoint")]
    pub endpoint: String,
}

fn default_cloudwatch_endpoint() -> String { "http://127.0.0.1:4566".to_string() }

impl Default for CloudwatchConfig {
    fn default() -> Self {
        Self { endpoint: default_cloudwatch_endpoint() }
    }
}

/// `[ingest]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_noise_patterns")]
    pub noise_patterns: Vec<String>,
}

fn default_fetch_timeout_secs() -> u64 { 30 }
fn default_noise_patterns() -> Vec<String> { vec![r#""GET / HTTP/1.1" 200"#.to_string()] }

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
            noise_patterns: default_noise_patterns(),
        }
    }
}

impl IngestConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn noise_filter(&self) -> NoiseFilter {
        NoiseFilter::new(self.noise_patterns.iter().cloned())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/corral/config.toml`, layered on top of the built-in
    /// defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path())
    }

    /// Same as [`Config::load`] with an explicit file path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, DEFAULT_CONFIG.trim_start())?;
        }

        Self::layered(path, None)
    }

    /// Defaults, then the file at `path`, then environment overrides.
    /// `env` replaces the process environment when given.
    fn layered(path: &Path, env: Option<config::Map<String, String>>) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(LIST_SEPARATOR)
                    .with_list_parse_key("ingest.noise_patterns")
                    .source(env),
            )
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("corral")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
