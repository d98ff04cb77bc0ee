// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Shell-command actions
//!
//! Each action runs a configured command through a shell. Inputs are passed
//! as `RELFLOW_*` environment variables rather than spliced into the command
//! text, so tags and paths never need quoting.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tokio::process::Command;

use super::{FilePublisher, ImagePublisher, ManifestPublisher, PackageValidator};
use crate::artifacts::Artifact;
use crate::errors::{RelflowError, RelflowResult};
use crate::pipeline::ImagePublication;
use crate::tags::{ManifestKey, Tag};

/// Command templates for each action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellCommands {
    pub publish_image: String,
    pub publish_manifest: String,
    pub publish_file: Option<String>,
    pub validate: Option<String>,
}

impl Default for ShellCommands {
    fn default() -> Self {
        Self {
            publish_image: concat!(
                "docker build --build-arg GRAFANA_TGZ=\"$RELFLOW_ARTIFACT\" --build-arg BASE=\"$RELFLOW_BASE\" ",
                "--tag \"$RELFLOW_TAG\" . >&2 && docker push \"$RELFLOW_TAG\" >&2 && echo \"$RELFLOW_TAG\""
            )
            .to_string(),
            publish_manifest: concat!(
                "docker manifest create \"$RELFLOW_MANIFEST\" $RELFLOW_TAGS >&2 && ",
                "docker manifest push \"$RELFLOW_MANIFEST\""
            )
            .to_string(),
            publish_file: None,
            validate: None,
        }
    }
}

/// Runs [`ShellCommands`] with a given shell
#[derive(Debug, Clone)]
pub struct ShellActions {
    shell: String,
    commands: ShellCommands,
    env: HashMap<String, String>,
    working_dir: Option<PathBuf>,
}

impl ShellActions {
    pub fn new(shell: impl Into<String>, commands: ShellCommands) -> Self {
        Self {
            shell: shell.into(),
            commands,
            env: HashMap::new(),
            working_dir: None,
        }
    }

    /// Extra environment for every command
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn commands(&self) -> &ShellCommands {
        &self.commands
    }

    /// Check that the configured shell can be found
    pub fn check_available(&self) -> RelflowResult<()> {
        which::which(&self.shell)
            .map(|_| ())
            .map_err(|_| RelflowError::ToolNotFound {
                tool: self.shell.clone(),
            })
    }

    /// Run `command` and return its trimmed stdout.
    async fn run(&self, action: &str, command: &str, vars: &[(&str, &str)]) -> anyhow::Result<String> {
        let start = Instant::now();

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command);
        cmd.envs(&self.env);
        cmd.envs(vars.iter().copied());
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .with_context(|| format!("failed to spawn shell '{}'", self.shell))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::debug!(
            "{} finished in {:.2}s with {}",
            action,
            start.elapsed().as_secs_f64(),
            output.status
        );

        if output.status.success() {
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            anyhow::bail!("{} exited with {}: {}", action, code, stderr.trim())
        }
    }

    fn artifact_vars(artifact: &Artifact) -> [(&'static str, String); 2] {
        [
            ("RELFLOW_ARTIFACT", artifact.path.to_string_lossy().to_string()),
            ("RELFLOW_ARTIFACT_NAME", artifact.name.clone()),
        ]
    }
}

#[async_trait]
impl ImagePublisher for ShellActions {
    async fn publish_image(&self, publication: &ImagePublication) -> anyhow::Result<String> {
        let [artifact, name] = Self::artifact_vars(&publication.artifact);
        self.run(
            "publish_image",
            &self.commands.publish_image,
            &[
                (artifact.0, artifact.1.as_str()),
                (name.0, name.1.as_str()),
                ("RELFLOW_TAG", publication.tag.as_str()),
                ("RELFLOW_BASE", publication.base.as_str()),
            ],
        )
        .await
    }
}

#[async_trait]
impl ManifestPublisher for ShellActions {
    async fn publish_manifest(&self, manifest: &ManifestKey, tags: &[Tag]) -> anyhow::Result<String> {
        let tags = tags.iter().map(Tag::as_str).collect::<Vec<_>>().join(" ");
        self.run(
            "publish_manifest",
            &self.commands.publish_manifest,
            &[("RELFLOW_MANIFEST", manifest.as_str()), ("RELFLOW_TAGS", tags.as_str())],
        )
        .await
    }
}

#[async_trait]
impl FilePublisher for ShellActions {
    async fn publish_file(&self, artifact: &Artifact, destination: &str) -> anyhow::Result<String> {
        let command = self
            .commands
            .publish_file
            .as_deref()
            .context("no publish_file command configured for remote destinations")?;

        let [path, name] = Self::artifact_vars(artifact);
        let output = self
            .run(
                "publish_file",
                command,
                &[
                    (path.0, path.1.as_str()),
                    (name.0, name.1.as_str()),
                    ("RELFLOW_DESTINATION", destination),
                ],
            )
            .await?;

        Ok(if output.is_empty() {
            destination.to_string()
        } else {
            output
        })
    }
}

#[async_trait]
impl PackageValidator for ShellActions {
    async fn validate(&self, artifact: &Artifact) -> anyhow::Result<String> {
        let command = self
            .commands
            .validate
            .as_deref()
            .context("no validate command configured")?;

        let [path, name] = Self::artifact_vars(artifact);
        self.run(
            "validate",
            command,
            &[(path.0, path.1.as_str()), (name.0, name.1.as_str())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::BaseImage;

    fn actions(commands: ShellCommands) -> ShellActions {
        ShellActions::new("sh", commands)
    }

    fn publication() -> ImagePublication {
        ImagePublication {
            artifact: Artifact::new("grafana-9.5.0-amd64.tar.gz", "/dist/grafana-9.5.0-amd64.tar.gz"),
            base: BaseImage::Alpine,
            tag: Tag::new("example/repo/grafana-image-tags:9.5.0-amd64"),
        }
    }

    #[tokio::test]
    async fn test_publish_image_receives_tag() {
        let shell = actions(ShellCommands {
            publish_image: "echo \"$RELFLOW_TAG from $RELFLOW_ARTIFACT_NAME on $RELFLOW_BASE\"".into(),
            ..ShellCommands::default()
        });

        let out = shell.publish_image(&publication()).await.unwrap();
        assert_eq!(
            out,
            "example/repo/grafana-image-tags:9.5.0-amd64 from grafana-9.5.0-amd64.tar.gz on alpine"
        );
    }

    #[tokio::test]
    async fn test_publish_manifest_receives_tags_in_order() {
        let shell = actions(ShellCommands {
            publish_manifest: "echo \"$RELFLOW_MANIFEST <- $RELFLOW_TAGS\"".into(),
            ..ShellCommands::default()
        });

        let out = shell
            .publish_manifest(
                &crate::tags::manifest_key("r/grafana-image-tags:1.0.0-amd64").unwrap(),
                &[Tag::new("r/grafana-image-tags:1.0.0-amd64"), Tag::new("r/grafana-image-tags:1.0.0-arm64")],
            )
            .await
            .unwrap();

        assert_eq!(
            out,
            "r/grafana:1.0.0 <- r/grafana-image-tags:1.0.0-amd64 r/grafana-image-tags:1.0.0-arm64"
        );
    }

    #[tokio::test]
    async fn test_failing_command_carries_stderr() {
        let shell = actions(ShellCommands {
            publish_image: "echo 'denied: requested access' >&2; exit 3".into(),
            ..ShellCommands::default()
        });

        let err = shell.publish_image(&publication()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("exited with 3"));
        assert!(message.contains("denied: requested access"));
    }

    #[tokio::test]
    async fn test_validate_requires_command() {
        let shell = actions(ShellCommands::default());
        let artifact = publication().artifact;
        assert!(shell.validate(&artifact).await.is_err());
    }

    #[tokio::test]
    async fn test_extra_env_is_passed() {
        let mut env = HashMap::new();
        env.insert("RELEASE_CHANNEL".to_string(), "stable".to_string());
        let shell = actions(ShellCommands {
            validate: Some("echo \"$RELEASE_CHANNEL\"".into()),
            ..ShellCommands::default()
        })
        .with_env(env);

        let out = shell.validate(&publication().artifact).await.unwrap();
        assert_eq!(out, "stable");
    }

    #[test]
    fn test_missing_shell_is_reported() {
        let shell = ShellActions::new("definitely-not-a-shell-binary", ShellCommands::default());
        assert!(matches!(
            shell.check_available(),
            Err(RelflowError::ToolNotFound { .. })
        ));
    }
}
