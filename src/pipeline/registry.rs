// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Two-phase task graph for image publication
//!
//! Phase one publishes every (artifact, tag) pair. Phase two publishes one
//! manifest per manifest key, and can only be built from the
//! [`BatchReport`] of a successful phase one.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::scheduler::BatchReport;
use super::task::Task;
use crate::artifacts::Artifact;
use crate::errors::{RelflowError, RelflowResult};
use crate::executors::{ImagePublisher, ManifestPublisher};
use crate::tags::{self, BaseImage, ManifestKey, Tag};

/// Inputs of one image publication task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePublication {
    pub artifact: Artifact,
    pub base: BaseImage,
    pub tag: Tag,
}

/// Tags grouped under one manifest key, in derivation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestGroup {
    pub manifest: ManifestKey,
    pub tags: Vec<Tag>,
}

/// Manifest key to member tags, keeping first-seen key order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestGroups {
    groups: Vec<ManifestGroup>,
    index: HashMap<ManifestKey, usize>,
}

impl ManifestGroups {
    /// Append `tag` to its key's group. Repeated tags are kept.
    pub fn push(&mut self, manifest: ManifestKey, tag: Tag) {
        match self.index.get(&manifest) {
            Some(&i) => self.groups[i].tags.push(tag),
            None => {
                self.index.insert(manifest.clone(), self.groups.len());
                self.groups.push(ManifestGroup {
                    manifest,
                    tags: vec![tag],
                });
            }
        }
    }

    pub fn get(&self, manifest: &ManifestKey) -> Option<&[Tag]> {
        self.index
            .get(manifest)
            .map(|&i| self.groups[i].tags.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Publication plan for a set of image artifacts
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    publications: Vec<ImagePublication>,
    manifests: ManifestGroups,
}

impl TaskRegistry {
    /// Derive every tag and manifest key for `artifacts`.
    ///
    /// Fails on the first artifact whose name cannot be turned into tags.
    pub fn derive(artifacts: &[Artifact], registry: &str) -> RelflowResult<Self> {
        let mut plan = Self::default();

        for artifact in artifacts {
            let derived = tags::derive(artifact.file_name(), registry)?;
            for (tag, manifest) in derived.tags {
                plan.manifests.push(manifest, tag.clone());
                plan.publications.push(ImagePublication {
                    artifact: artifact.clone(),
                    base: derived.base,
                    tag,
                });
            }
        }

        Ok(plan)
    }

    pub fn publications(&self) -> &[ImagePublication] {
        &self.publications
    }

    pub fn manifests(&self) -> &ManifestGroups {
        &self.manifests
    }

    /// One "publish this artifact under this tag" task per publication
    pub fn phase_one(&self, publisher: Arc<dyn ImagePublisher>) -> Vec<Task> {
        self.publications
            .iter()
            .cloned()
            .map(|publication| {
                let publisher = publisher.clone();
                Task::new(publication.tag.to_string(), "publish image", move || async move {
                    publisher.publish_image(&publication).await
                })
            })
            .collect()
    }

    /// One "combine these tags" task per manifest key.
    ///
    /// Requires the report of this plan's completed phase one: one report
    /// per publication, each for one of this plan's tags.
    pub fn phase_two(
        &self,
        phase_one: &BatchReport,
        publisher: Arc<dyn ManifestPublisher>,
    ) -> RelflowResult<Vec<Task>> {
        let planned: HashSet<String> = self
            .publications
            .iter()
            .map(|p| p.tag.to_string())
            .collect();
        let matching = phase_one
            .reports()
            .iter()
            .filter(|r| planned.contains(&r.id))
            .count();

        if phase_one.len() != self.publications.len() || matching != phase_one.len() {
            return Err(RelflowError::PhaseOneIncomplete {
                expected: self.publications.len(),
                completed: matching,
            });
        }

        Ok(self.manifests
            .iter()
            .cloned()
            .map(|group| {
                let publisher = publisher.clone();
                Task::new(group.manifest.to_string(), "publish manifest", move || async move {
                    publisher
                        .publish_manifest(&group.manifest, &group.tags)
                        .await
                })
            })
            .collect())
    }
}
