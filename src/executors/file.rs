// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! File publication
//!
//! Local destinations are written directly; anything with a remote scheme
//! (`gs://`, `s3://`, ...) is handed to the configured shell command.

use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;

use super::{FilePublisher, ShellActions};
use crate::artifacts::Artifact;

/// Whether `destination` is a path on the local filesystem
pub fn is_local_destination(destination: &str) -> bool {
    destination.starts_with("file://") || !destination.contains("://")
}

/// Copies artifacts to local destinations, delegating remote ones
#[derive(Debug, Clone)]
pub struct LocalFilePublisher {
    remote: ShellActions,
}

impl LocalFilePublisher {
    pub fn new(remote: ShellActions) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl FilePublisher for LocalFilePublisher {
    async fn publish_file(&self, artifact: &Artifact, destination: &str) -> anyhow::Result<String> {
        if !is_local_destination(destination) {
            return self.remote.publish_file(artifact, destination).await;
        }

        let path = PathBuf::from(destination.strip_prefix("file://").unwrap_or(destination));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        tokio::fs::copy(&artifact.path, &path)
            .await
            .with_context(|| format!("copying {} to {}", artifact.path.display(), path.display()))?;

        Ok(path.display().to_string())
    }
}
