// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Publish and validate actions
//!
//! The orchestrator treats these as opaque: each returns an output line or
//! an error that is passed through unchanged.

mod file;
mod shell;

pub use file::{is_local_destination, LocalFilePublisher};
pub use shell::{ShellActions, ShellCommands};

use async_trait::async_trait;

use crate::artifacts::Artifact;
use crate::pipeline::ImagePublication;
use crate::tags::{ManifestKey, Tag};

/// Publishes a single-variant image
#[async_trait]
pub trait ImagePublisher: Send + Sync {
    async fn publish_image(&self, publication: &ImagePublication) -> anyhow::Result<String>;
}

/// Combines published tags into one manifest list
#[async_trait]
pub trait ManifestPublisher: Send + Sync {
    async fn publish_manifest(&self, manifest: &ManifestKey, tags: &[Tag]) -> anyhow::Result<String>;
}

/// Copies an artifact to a destination
#[async_trait]
pub trait FilePublisher: Send + Sync {
    async fn publish_file(&self, artifact: &Artifact, destination: &str) -> anyhow::Result<String>;
}

/// Runs validation workloads against an artifact
#[async_trait]
pub trait PackageValidator: Send + Sync {
    async fn validate(&self, artifact: &Artifact) -> anyhow::Result<String>;
}

/// Join a destination prefix and a file name with a single `/`
pub fn destination_for(destination: &str, file_name: &str) -> String {
    format!("{}/{}", destination.trim_end_matches('/'), file_name)
}
