// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Error types
//!
//! Every failure a run can surface is a [`RelflowError`]. Task failures keep
//! the collaborator's error opaque and only annotate it with the task id.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::AcquireError;

/// Result type for relflow operations
pub type RelflowResult<T> = Result<T, RelflowError>;

/// Main error type for relflow
#[derive(Error, Debug, Diagnostic)]
pub enum RelflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Input Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Artifact name '{name}' is malformed: {reason}")]
    #[diagnostic(
        code(relflow::invalid_artifact_name),
        help("Expected e.g. 'grafana_9.5.0_123_linux_amd64.tar.gz' or 'grafana-9.5.0-amd64.tar.gz'")
    )]
    InvalidArtifactName { name: String, reason: String },

    #[error("Tag '{tag}' has no separator to derive a manifest from")]
    #[diagnostic(
        code(relflow::invalid_tag),
        help("Image tags must end in '-<arch>'")
    )]
    InvalidTag { tag: String },

    #[error("Registry '{registry}' is invalid")]
    #[diagnostic(
        code(relflow::invalid_registry),
        help("Pass a registry such as 'docker.io/grafana' with --registry")
    )]
    InvalidRegistry { registry: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Artifact Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Artifact '{name}' not found in {dir}")]
    #[diagnostic(
        code(relflow::artifact_not_found),
        help("Check --package and the artifacts_dir setting")
    )]
    ArtifactNotFound { name: String, dir: PathBuf },

    #[error("Failed to retrieve artifact '{name}': {error}")]
    #[diagnostic(code(relflow::artifact_retrieval))]
    ArtifactRetrieval { name: String, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("[{task}] failed to acquire concurrency unit: {reason}")]
    #[diagnostic(code(relflow::acquisition))]
    Acquisition {
        task: String,
        #[source]
        reason: AcquireError,
    },

    #[error("[{task}] error: {source}")]
    #[diagnostic(code(relflow::task_failed))]
    TaskFailed {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("[{task}] panicked: {message}")]
    #[diagnostic(code(relflow::task_panicked))]
    TaskPanicked { task: String, message: String },

    #[error("Concurrency budget must be at least 1, got {value}")]
    #[diagnostic(
        code(relflow::invalid_budget),
        help("Set --parallel (or RELFLOW_PARALLEL) to a positive number")
    )]
    InvalidBudget { value: usize },

    #[error("Phase one incomplete: {completed} of {expected} planned images published")]
    #[diagnostic(
        code(relflow::phase_one_incomplete),
        help("Manifests can only be built from the report of the same plan's phase one")
    )]
    PhaseOneIncomplete { expected: usize, completed: usize },

    #[error("Orchestrator already ran (state: {state})")]
    #[diagnostic(
        code(relflow::orchestrator_reused),
        help("Create a new Orchestrator for every run")
    )]
    OrchestratorReused { state: String },

    #[error("Tool '{tool}' not found")]
    #[diagnostic(code(relflow::tool_not_found), help("Install {tool} and ensure it's in your PATH"))]
    ToolNotFound { tool: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid configuration: {reason}")]
    #[diagnostic(code(relflow::invalid_config))]
    InvalidConfig {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(relflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("No input files matched pattern: {pattern}")]
    #[diagnostic(
        code(relflow::no_input_files),
        help("Check that files matching '{pattern}' exist in your artifacts directory")
    )]
    NoInputFiles { pattern: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(relflow::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(relflow::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(relflow::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(relflow::toml_error))]
    Toml { message: String },

    #[error("Glob pattern error: {message}")]
    #[diagnostic(code(relflow::glob_error))]
    GlobPattern { message: String },
}

impl From<std::io::Error> for RelflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for RelflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for RelflowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for RelflowError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<glob::PatternError> for RelflowError {
    fn from(e: glob::PatternError) -> Self {
        Self::GlobPattern { message: e.to_string() }
    }
}

impl RelflowError {
    /// Create a malformed artifact name error
    pub fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArtifactName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Identifier of the task this error is annotated with, if any
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::Acquisition { task, .. }
            | Self::TaskFailed { task, .. }
            | Self::TaskPanicked { task, .. } => Some(task),
            _ => None,
        }
    }

    /// Whether this error was raised before any task was scheduled
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArtifactName { .. } | Self::InvalidTag { .. } | Self::InvalidRegistry { .. }
        )
    }
}
