//! Shared test utilities for corral integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. The fake backends bind to 127.0.0.1 on a random port
//! and live as long as the test's runtime.

#![allow(dead_code)]

pub mod assertions;
pub mod builders;
pub mod fake_cloudwatch_api;
pub mod fake_docker_api;
pub mod fixtures;

pub use builders::*;
pub use fixtures::*;
