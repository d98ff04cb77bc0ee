// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Image tag derivation
//!
//! Pure functions mapping an artifact name to the image tags it is published
//! under, and each tag to the manifest list it belongs to.
//!
//! A per-variant tag lives in a `*-image-tags` repository and ends in the
//! architecture:
//!
//! ```text
//! docker.io/grafana/grafana-image-tags:9.5.0-ubuntu-arm64
//! ```
//!
//! Its manifest key drops the channel suffix and the architecture:
//!
//! ```text
//! docker.io/grafana/grafana:9.5.0-ubuntu
//! ```

use serde::Serialize;
use std::fmt;

use crate::artifacts::ArtifactName;
use crate::errors::{RelflowError, RelflowResult};

/// Marks a repository holding per-variant tags rather than manifests.
pub const IMAGE_TAG_SUFFIX: &str = "-image-tags";

/// Separator between the version and the variant parts of a tag.
pub const VARIANT_SEPARATOR: char = '-';

/// Base image family of a container build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseImage {
    Alpine,
    Ubuntu,
}

impl BaseImage {
    /// Classify an artifact by the distribution marker in its name
    pub fn from_name(name: &str) -> Self {
        if name.contains(crate::artifacts::UBUNTU_MARKER) {
            Self::Ubuntu
        } else {
            Self::Alpine
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alpine => "alpine",
            Self::Ubuntu => "ubuntu",
        }
    }

    /// Suffix appended to the version in tags
    pub fn tag_suffix(self) -> &'static str {
        match self {
            Self::Alpine => "",
            Self::Ubuntu => "-ubuntu",
        }
    }
}

/// One fully-qualified output identifier for an image
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Manifest list this tag is a member of
    pub fn manifest(&self) -> RelflowResult<ManifestKey> {
        manifest_key(&self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reference unifying the per-variant tags of one release
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ManifestKey(String);

impl ManifestKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ManifestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ManifestKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the manifest key for a tag.
///
/// Removes the channel suffix, then cuts at the last separator. A tag with
/// no separator left has no valid split point and is rejected.
pub fn manifest_key(tag: &str) -> RelflowResult<ManifestKey> {
    let manifest = tag.replace(IMAGE_TAG_SUFFIX, "");
    let last = manifest
        .rfind(VARIANT_SEPARATOR)
        .ok_or_else(|| RelflowError::InvalidTag {
            tag: tag.to_string(),
        })?;
    Ok(ManifestKey(manifest[..last].to_string()))
}

/// Repositories an artifact's images are pushed to
pub fn image_repositories(name: &ArtifactName) -> Vec<String> {
    match &name.edition {
        None => vec![
            format!("{}{}", name.product, IMAGE_TAG_SUFFIX),
            format!("{}-oss{}", name.product, IMAGE_TAG_SUFFIX),
        ],
        Some(edition) => vec![format!("{}-{}{}", name.product, edition, IMAGE_TAG_SUFFIX)],
    }
}

/// Tags for an artifact published to `registry`
pub fn image_tags(base: BaseImage, registry: &str, name: &ArtifactName) -> RelflowResult<Vec<Tag>> {
    let registry = registry.trim_end_matches('/');
    if registry.is_empty() || registry.contains(char::is_whitespace) {
        return Err(RelflowError::InvalidRegistry {
            registry: registry.to_string(),
        });
    }

    Ok(image_repositories(name)
        .into_iter()
        .map(|repo| {
            Tag(format!(
                "{}/{}:{}{}{}{}",
                registry,
                repo,
                name.tag_version(),
                base.tag_suffix(),
                VARIANT_SEPARATOR,
                name.arch
            ))
        })
        .collect())
}

/// Tags derived for one artifact, each paired with its manifest key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedTags {
    pub artifact: String,
    pub base: BaseImage,
    pub tags: Vec<(Tag, ManifestKey)>,
}

/// Derive base family, tags and manifest keys from an artifact file name.
pub fn derive(artifact: &str, registry: &str) -> RelflowResult<DerivedTags> {
    let name = ArtifactName::parse(artifact)?;
    let base = BaseImage::from_name(artifact);

    let tags = image_tags(base, registry, &name)?
        .into_iter()
        .map(|tag| {
            let key = tag.manifest()?;
            Ok((tag, key))
        })
        .collect::<RelflowResult<Vec<_>>>()?;

    Ok(DerivedTags {
        artifact: artifact.to_string(),
        base,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(artifact: &str, registry: &str) -> Vec<String> {
        derive(artifact, registry)
            .unwrap()
            .tags
            .into_iter()
            .map(|(_, key)| key.to_string())
            .collect()
    }

    #[test]
    fn test_base_image_classification() {
        assert_eq!(BaseImage::from_name("grafana-9.5.0-amd64.tar.gz"), BaseImage::Alpine);
        assert_eq!(
            BaseImage::from_name("grafana_9.5.0_1_linux_amd64.ubuntu.docker.tar.gz"),
            BaseImage::Ubuntu
        );
    }

    #[test]
    fn test_oss_artifact_gets_two_tags() {
        let derived = derive("grafana-9.5.0-amd64.tar.gz", "example/repo").unwrap();
        let tags: Vec<&str> = derived.tags.iter().map(|(t, _)| t.as_str()).collect();

        assert_eq!(
            tags,
            vec![
                "example/repo/grafana-image-tags:9.5.0-amd64",
                "example/repo/grafana-oss-image-tags:9.5.0-amd64",
            ]
        );
        assert_eq!(
            keys("grafana-9.5.0-amd64.tar.gz", "example/repo"),
            vec!["example/repo/grafana:9.5.0", "example/repo/grafana-oss:9.5.0"]
        );
    }

    #[test]
    fn test_architectures_share_manifest_key() {
        let amd = keys("grafana-9.5.0-amd64.tar.gz", "example/repo");
        let arm = keys("grafana-9.5.0-arm64.tar.gz", "example/repo");
        let armv7 = keys("grafana_9.5.0_77_linux_arm_7.tar.gz", "example/repo");

        assert_eq!(amd, arm);
        assert_eq!(amd, armv7);
    }

    #[test]
    fn test_ubuntu_variants_share_their_own_key() {
        let amd = keys("grafana-9.5.0-amd64-ubuntu.tar.gz", "example/repo");
        let arm = keys("grafana_9.5.0_1_linux_arm64.ubuntu.docker.tar.gz", "example/repo");

        assert_eq!(amd, arm);
        assert_eq!(amd[0], "example/repo/grafana:9.5.0-ubuntu");
        assert_ne!(amd, keys("grafana-9.5.0-amd64.tar.gz", "example/repo"));
    }

    #[test]
    fn test_distinct_releases_never_collide() {
        let releases = [
            "grafana-9.5.0-amd64.tar.gz",
            "grafana-9.5.1-amd64.tar.gz",
            "grafana-9.5.0-beta1-amd64.tar.gz",
            "grafana-enterprise-9.5.0-amd64.tar.gz",
            "grafana-pro-9.5.0-amd64.tar.gz",
        ];

        let mut seen = std::collections::HashSet::new();
        for release in releases {
            for key in keys(release, "example/repo") {
                assert!(seen.insert(key.clone()), "duplicate key {}", key);
            }
        }
    }

    #[test]
    fn test_enterprise_artifact_gets_one_tag() {
        let derived = derive("grafana-enterprise_10.0.0_123_linux_arm64.tar.gz", "docker.io/grafana/").unwrap();
        assert_eq!(derived.tags.len(), 1);
        assert_eq!(
            derived.tags[0].0.as_str(),
            "docker.io/grafana/grafana-enterprise-image-tags:10.0.0-arm64"
        );
        assert_eq!(
            derived.tags[0].1.as_str(),
            "docker.io/grafana/grafana-enterprise:10.0.0"
        );
    }

    #[test]
    fn test_manifest_key_without_separator_fails() {
        assert!(matches!(
            manifest_key("registry/grafana-image-tags:latest"),
            Err(RelflowError::InvalidTag { .. })
        ));
    }

    #[test]
    fn test_manifest_key_strips_suffix_then_truncates() {
        let key = manifest_key("my-registry/grafana-image-tags:10.0.0-beta2-s390x").unwrap();
        assert_eq!(key.as_str(), "my-registry/grafana:10.0.0-beta2");
    }

    #[test]
    fn test_empty_registry_is_rejected() {
        assert!(matches!(
            derive("grafana-9.5.0-amd64.tar.gz", "/"),
            Err(RelflowError::InvalidRegistry { .. })
        ));
    }
}
