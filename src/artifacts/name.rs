// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Artifact file name parsing
//!
//! Package file names encode product, edition, version, build and platform.
//! Two layouts are in use:
//!
//! - `grafana-enterprise_10.0.0_123_linux_arm_7.docker.tar.gz`
//! - `grafana-9.5.0-amd64.tar.gz`

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

use crate::errors::{RelflowError, RelflowResult};

/// Extensions recognised on artifact names, longest first.
const EXTENSIONS: &[&str] = &[
    ".docker.tar.gz",
    ".tar.gz",
    ".tgz",
    ".deb",
    ".rpm",
    ".zip",
    ".exe",
    ".msi",
];

/// Marker for builds on the alternate base image family.
pub const UBUNTU_MARKER: &str = "ubuntu";

const DEFAULT_OS: &str = "linux";

fn hyphen_layout() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<name>[A-Za-z][A-Za-z0-9]*(?:-[A-Za-z][A-Za-z0-9]*)*)-(?P<version>v?[0-9][0-9A-Za-z.+~-]*?)-(?:(?P<os>linux|darwin|windows)-)?(?P<arch>[0-9A-Za-z]+)$",
        )
        .expect("artifact name pattern is valid")
    })
}

/// Metadata decoded from an artifact's file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactName {
    /// Product name, e.g. `grafana`
    pub product: String,
    /// Edition, e.g. `enterprise`. `None` is the OSS edition.
    pub edition: Option<String>,
    pub version: String,
    pub build_id: Option<String>,
    pub os: String,
    /// Architecture with any ARM variant folded in (`armv7`)
    pub arch: String,
    /// Whether the artifact targets the ubuntu base image
    pub ubuntu: bool,
    pub extension: String,
}

impl ArtifactName {
    /// Parse an artifact file name. Leading directories are ignored.
    pub fn parse(file_name: &str) -> RelflowResult<Self> {
        let base = file_name.rsplit('/').next().unwrap_or(file_name);

        let extension = EXTENSIONS
            .iter()
            .find(|ext| base.ends_with(*ext))
            .copied()
            .unwrap_or("");
        let stem = &base[..base.len() - extension.len()];

        let ubuntu = base.contains(UBUNTU_MARKER);
        let stem = stem
            .strip_suffix(".ubuntu")
            .or_else(|| stem.strip_suffix("-ubuntu"))
            .or_else(|| stem.strip_suffix("_ubuntu"))
            .unwrap_or(stem);

        if stem.is_empty() {
            return Err(RelflowError::invalid_name(file_name, "empty name"));
        }

        let mut name = if stem.contains('_') {
            Self::parse_underscore(file_name, stem)?
        } else {
            Self::parse_hyphen(file_name, stem)?
        };
        name.ubuntu = ubuntu;
        name.extension = extension.to_string();
        Ok(name)
    }

    fn parse_underscore(file_name: &str, stem: &str) -> RelflowResult<Self> {
        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() < 5 || parts.len() > 6 {
            return Err(RelflowError::invalid_name(
                file_name,
                format!("expected 5 or 6 '_'-separated fields, found {}", parts.len()),
            ));
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(RelflowError::invalid_name(file_name, "empty field"));
        }

        let (product, edition) = split_product(parts[0]);
        let arch = match parts.get(5) {
            Some(variant) => format!("{}v{}", parts[4], variant.trim_start_matches('v')),
            None => parts[4].to_string(),
        };

        Ok(Self {
            product,
            edition,
            version: parts[1].to_string(),
            build_id: Some(parts[2].to_string()),
            os: parts[3].to_string(),
            arch,
            ubuntu: false,
            extension: String::new(),
        })
    }

    fn parse_hyphen(file_name: &str, stem: &str) -> RelflowResult<Self> {
        let caps = hyphen_layout().captures(stem).ok_or_else(|| {
            RelflowError::invalid_name(file_name, "expected '<product>-<version>-<arch>'")
        })?;

        let (product, edition) = split_product(&caps["name"]);
        Ok(Self {
            product,
            edition,
            version: caps["version"].to_string(),
            build_id: None,
            os: caps
                .name("os")
                .map_or(DEFAULT_OS, |m| m.as_str())
                .to_string(),
            arch: caps["arch"].to_string(),
            ubuntu: false,
            extension: String::new(),
        })
    }

    /// Version as used in image tags (no leading `v`)
    pub fn tag_version(&self) -> &str {
        self.version.strip_prefix('v').unwrap_or(&self.version)
    }

    /// Product name including the edition, e.g. `grafana-enterprise`
    pub fn package_name(&self) -> String {
        match &self.edition {
            Some(edition) => format!("{}-{}", self.product, edition),
            None => self.product.clone(),
        }
    }

    /// Canonical file name in the underscore layout
    pub fn file_name(&self) -> String {
        let mut out = format!(
            "{}_{}_{}_{}_{}",
            self.package_name(),
            self.version,
            self.build_id.as_deref().unwrap_or("0"),
            self.os,
            arch_with_variant(&self.arch),
        );
        if self.ubuntu {
            out.push_str(".ubuntu");
        }
        out.push_str(&self.extension);
        out
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

fn split_product(name: &str) -> (String, Option<String>) {
    match name.split_once('-') {
        Some((product, edition)) if edition != "oss" => {
            (product.to_string(), Some(edition.to_string()))
        }
        Some((product, _)) => (product.to_string(), None),
        None => (name.to_string(), None),
    }
}

/// `armv7` -> `arm_7` for the underscore layout.
fn arch_with_variant(arch: &str) -> String {
    match arch.strip_prefix("armv") {
        Some(variant) if !variant.is_empty() => format!("arm_{}", variant),
        _ => arch.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hyphen_layout() {
        let name = ArtifactName::parse("grafana-9.5.0-amd64.tar.gz").unwrap();
        assert_eq!(name.product, "grafana");
        assert_eq!(name.edition, None);
        assert_eq!(name.version, "9.5.0");
        assert_eq!(name.os, "linux");
        assert_eq!(name.arch, "amd64");
        assert!(!name.ubuntu);
        assert_eq!(name.extension, ".tar.gz");
    }

    #[test]
    fn test_parse_hyphen_layout_with_prerelease_and_edition() {
        let name = ArtifactName::parse("grafana-enterprise-10.1.0-beta1-arm64-ubuntu.tar.gz").unwrap();
        assert_eq!(name.product, "grafana");
        assert_eq!(name.edition.as_deref(), Some("enterprise"));
        assert_eq!(name.version, "10.1.0-beta1");
        assert_eq!(name.arch, "arm64");
        assert!(name.ubuntu);
    }

    #[test]
    fn test_parse_hyphen_layout_with_os() {
        let name = ArtifactName::parse("grafana-v9.5.0-darwin-arm64.tar.gz").unwrap();
        assert_eq!(name.version, "v9.5.0");
        assert_eq!(name.tag_version(), "9.5.0");
        assert_eq!(name.os, "darwin");
        assert_eq!(name.arch, "arm64");
    }

    #[test]
    fn test_parse_underscore_layout() {
        let name =
            ArtifactName::parse("dist/grafana-enterprise_10.0.0_123_linux_arm_7.ubuntu.docker.tar.gz")
                .unwrap();
        assert_eq!(name.package_name(), "grafana-enterprise");
        assert_eq!(name.build_id.as_deref(), Some("123"));
        assert_eq!(name.arch, "armv7");
        assert!(name.ubuntu);
        assert_eq!(name.extension, ".docker.tar.gz");
        assert_eq!(
            name.file_name(),
            "grafana-enterprise_10.0.0_123_linux_arm_7.ubuntu.docker.tar.gz"
        );
    }

    #[test]
    fn test_oss_suffix_is_oss_edition() {
        let name = ArtifactName::parse("grafana-oss_9.5.0_1_linux_amd64.tar.gz").unwrap();
        assert_eq!(name.edition, None);
    }

    #[test]
    fn test_malformed_names_fail() {
        assert!(ArtifactName::parse("grafana.tar.gz").is_err());
        assert!(ArtifactName::parse("grafana_9.5.0_linux.tar.gz").is_err());
        assert!(ArtifactName::parse("grafana__1_linux_amd64.tar.gz").is_err());
        assert!(ArtifactName::parse("").is_err());
    }
}
