// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Release configuration
//!
//! Defines the schema for `.relflow.yaml` (or `.relflow.toml`) files.
//! Every field is optional; command-line flags override file values.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use super::budget::ConcurrencyBudget;
use crate::errors::{RelflowError, RelflowResult};
use crate::executors::{ShellActions, ShellCommands};

/// File names searched for when no config path is given
pub const CONFIG_FILES: &[&str] = &[".relflow.yaml", ".relflow.yml", ".relflow.toml"];

/// Release settings from a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Maximum number of actions in flight
    pub parallel: usize,

    /// Registry prefix for image tags
    pub registry: String,

    /// Directory artifact names are resolved against
    pub artifacts_dir: PathBuf,

    /// Destination prefix for file publication
    pub destination: Option<String>,

    /// Shell used to run commands
    pub shell: String,

    /// Extra environment for every command
    pub env: HashMap<String, String>,

    /// Command templates per action
    pub commands: ShellCommands,
}

fn default_parallel() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            registry: "docker.io/grafana".to_string(),
            artifacts_dir: PathBuf::from("."),
            destination: None,
            shell: "bash".to_string(),
            env: HashMap::new(),
            commands: ShellCommands::default(),
        }
    }
}

/// Values given on the command line or through `RELFLOW_*` variables
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub parallel: Option<usize>,
    pub registry: Option<String>,
    pub artifacts_dir: Option<PathBuf>,
    pub destination: Option<String>,
    pub shell: Option<String>,
}

impl ReleaseConfig {
    /// Load config from a YAML or TOML file, chosen by extension
    pub fn from_file(path: &Path) -> RelflowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RelflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn from_yaml(yaml: &str) -> RelflowResult<Self> {
        // An empty document deserializes to unit, not an empty map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    pub fn from_toml(content: &str) -> RelflowResult<Self> {
        toml::from_str(content).map_err(Into::into)
    }

    /// Load the config for a run.
    ///
    /// An explicit path must exist. Otherwise the first of [`CONFIG_FILES`]
    /// found in `dir` is used, falling back to defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> RelflowResult<Self> {
        if let Some(path) = explicit {
            tracing::debug!("Loading config from {}", path.display());
            return Self::from_file(path);
        }

        for name in CONFIG_FILES {
            let path = dir.join(name);
            if path.is_file() {
                tracing::debug!("Loading config from {}", path.display());
                return Self::from_file(&path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Apply command-line overrides, then validate the result
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> RelflowResult<Self> {
        if let Some(parallel) = overrides.parallel {
            self.parallel = parallel;
        }
        if let Some(registry) = overrides.registry {
            self.registry = registry;
        }
        if let Some(dir) = overrides.artifacts_dir {
            self.artifacts_dir = dir;
        }
        if let Some(destination) = overrides.destination {
            self.destination = Some(destination);
        }
        if let Some(shell) = overrides.shell {
            self.shell = shell;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> RelflowResult<()> {
        if self.parallel == 0 {
            return Err(RelflowError::InvalidBudget { value: 0 });
        }
        if self.shell.trim().is_empty() {
            return Err(RelflowError::InvalidConfig {
                reason: "shell must not be empty".to_string(),
                help: Some("Set 'shell' to e.g. bash or sh".to_string()),
            });
        }
        Ok(())
    }

    /// Budget shared by every phase of one run
    pub fn budget(&self) -> RelflowResult<ConcurrencyBudget> {
        ConcurrencyBudget::new(self.parallel)
    }

    /// Shell actions running the configured commands from `working_dir`
    pub fn shell_actions(&self, working_dir: &Path) -> ShellActions {
        ShellActions::new(self.shell.clone(), self.commands.clone())
            .with_env(self.env.clone())
            .with_working_dir(working_dir)
    }
}
