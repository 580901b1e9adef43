//! corral — aggregate Docker and CloudWatch logs, parse bracketed expressions
//! out of each message, and follow one request across services.
//!
//! This crate is the binary's library half. It re-exports the workspace crates
//! so that integration tests and benchmarks can import them from one place.
//!
//! # Architecture
//!
//! ```text
//! DockerSource ─┐
//!               ├──► Aggregator ──► assemble ──► LogRecord ──► HTTP / CLI
//! Cloudwatch ───┘                      │
//!                                      └──► parse_message ──► correlation id
//! ```
//!
//! Streams are fetched concurrently on tokio tasks; parsing is synchronous and
//! pure.

pub mod cli;

pub use corral_core;
pub use corral_feeds;
pub use corral_http;
