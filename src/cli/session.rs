// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Shared setup for commands that run tasks

use miette::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::GlobalArgs;
use crate::artifacts::{resolve_packages, LocalArtifactSource};
use crate::executors::ShellActions;
use crate::pipeline::{
    ConfigOverrides, Orchestrator, ProgressBarSink, ReleaseConfig, RunContext, RunReport,
};

/// Config, run context and artifact lookup for one command
pub struct Session {
    pub config: ReleaseConfig,
    pub working_dir: PathBuf,
    ctx: RunContext,
    progress: Option<Arc<ProgressBarSink>>,
}

impl Session {
    /// Load config and wire up cancellation, deadline and progress output.
    ///
    /// Ctrl-C cancels the run: tasks still waiting for a concurrency unit
    /// fail, tasks already running finish.
    pub fn open(globals: &GlobalArgs, mut overrides: ConfigOverrides) -> Result<Self> {
        let working_dir = std::env::current_dir()
            .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;

        overrides.parallel = globals.parallel;
        overrides.artifacts_dir = globals.artifacts_dir.clone();
        overrides.shell = globals.shell.clone();

        let config = ReleaseConfig::load(globals.config.as_deref(), &working_dir)?
            .with_overrides(overrides)?;

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling pending tasks");
                interrupt.cancel();
            }
        });

        let mut ctx = RunContext::new().with_cancel(cancel);
        if let Some(secs) = globals.timeout {
            ctx = ctx.with_deadline(tokio::time::Instant::now() + Duration::from_secs(secs));
        }

        let progress = globals.progress.then(|| Arc::new(ProgressBarSink::new(0, "")));
        if let Some(ref bar) = progress {
            ctx = ctx.with_sink(bar.clone());
        }

        Ok(Self {
            config,
            working_dir,
            ctx,
            progress,
        })
    }

    fn artifacts_dir(&self) -> PathBuf {
        self.working_dir.join(&self.config.artifacts_dir)
    }

    /// Expand `--package` arguments against the artifacts directory
    pub fn packages(&self, patterns: &[String]) -> Result<Vec<String>> {
        let packages = resolve_packages(patterns, &self.artifacts_dir())?;
        tracing::debug!("Resolved {} package(s)", packages.len());
        Ok(packages)
    }

    pub fn source(&self) -> LocalArtifactSource {
        LocalArtifactSource::new(self.artifacts_dir())
    }

    pub fn actions(&self) -> Result<ShellActions> {
        let actions = self.config.shell_actions(&self.working_dir);
        actions.check_available()?;
        Ok(actions)
    }

    /// A fresh orchestrator with this session's budget and context
    pub fn orchestrator(&self) -> Result<Orchestrator> {
        Ok(Orchestrator::new(self.config.budget()?, self.ctx.clone()))
    }

    /// Clear the progress bar, if any, and hand back the run's outcome
    pub fn finish(&self, outcome: crate::RelflowResult<RunReport>) -> Result<RunReport> {
        if let Some(ref bar) = self.progress {
            bar.finish();
        }
        Ok(outcome?)
    }
}
