// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! # relflow - Release Publication Orchestrator
//!
//! `relflow` publishes release artifacts as container images, manifest
//! lists and files, or runs validation workloads against them, under one
//! ceiling on concurrent actions.
//!
//! ## Features
//!
//! - **Tag derivation** - Image tags and manifest keys from artifact names
//! - **Two-phase publication** - Manifests are built only after every image is pushed
//! - **Bounded concurrency** - One budget shared by every phase of a run
//! - **Fail fast** - The first failure cancels pending work and is the one error reported
//!
//! ## Quick Start
//!
//! ```bash
//! # Show the tags an artifact would be published under
//! relflow tags grafana_9.5.0_123_linux_amd64.tar.gz
//!
//! # Build, push and combine images, four at a time
//! relflow --parallel 4 docker-publish --package 'dist/*.docker.tar.gz'
//!
//! # Copy packages to a bucket
//! relflow publish --package 'dist/*.deb' --destination gs://bucket/release
//! ```

pub mod artifacts;
pub mod cli;
pub mod errors;
pub mod executors;
pub mod pipeline;
pub mod tags;

// Re-export commonly used types
pub use errors::{RelflowError, RelflowResult};
pub use pipeline::{ConcurrencyBudget, Orchestrator, ReleaseConfig, RunContext, RunState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
