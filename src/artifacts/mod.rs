// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Build artifacts
//!
//! Artifacts are produced before a run starts and are read-only to the
//! orchestrator. An [`ArtifactSource`] turns an artifact identity into a
//! handle the publish and validate actions can work with.

mod name;

pub use name::{ArtifactName, UBUNTU_MARKER};

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::errors::{RelflowError, RelflowResult};

/// Handle to a produced file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Identity the artifact was requested by
    pub name: String,
    /// Location of the file
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// File name without leading directories
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Retrieves artifacts by identity
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Fetch a single artifact
    async fn fetch(&self, name: &str) -> RelflowResult<Artifact>;

    /// Fetch all artifacts in order. The first failure aborts.
    async fn fetch_all(&self, names: &[String]) -> RelflowResult<Vec<Artifact>> {
        let mut artifacts = Vec::with_capacity(names.len());
        for name in names {
            artifacts.push(self.fetch(name).await?);
        }
        Ok(artifacts)
    }
}

/// Artifacts stored in a local directory
#[derive(Debug, Clone)]
pub struct LocalArtifactSource {
    root: PathBuf,
}

impl LocalArtifactSource {
    /// Create a source rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArtifactSource for LocalArtifactSource {
    async fn fetch(&self, name: &str) -> RelflowResult<Artifact> {
        let path = if Path::new(name).is_absolute() {
            PathBuf::from(name)
        } else {
            self.root.join(name)
        };

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Artifact::new(name, path)),
            Ok(_) => Err(RelflowError::ArtifactRetrieval {
                name: name.to_string(),
                error: format!("{} is not a file", path.display()),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RelflowError::ArtifactNotFound {
                    name: name.to_string(),
                    dir: self.root.clone(),
                })
            }
            Err(e) => Err(RelflowError::ArtifactRetrieval {
                name: name.to_string(),
                error: e.to_string(),
            }),
        }
    }
}

/// Expand package arguments into artifact names.
///
/// Arguments containing glob metacharacters are matched against `base_dir`
/// and must match at least one file; plain names are passed through.
pub fn resolve_packages(patterns: &[String], base_dir: &Path) -> RelflowResult<Vec<String>> {
    let mut names = Vec::new();

    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            names.push(pattern.clone());
            continue;
        }

        let full_pattern = if Path::new(pattern).is_absolute() {
            pattern.clone()
        } else {
            base_dir.join(pattern).to_string_lossy().to_string()
        };

        let mut matches: Vec<String> = glob::glob(&full_pattern)?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .map(|p| {
                p.strip_prefix(base_dir)
                    .unwrap_or(&p)
                    .to_string_lossy()
                    .to_string()
            })
            .collect();

        if matches.is_empty() {
            return Err(RelflowError::NoInputFiles {
                pattern: pattern.clone(),
            });
        }

        matches.sort();
        names.extend(matches);
    }

    Ok(names)
}
