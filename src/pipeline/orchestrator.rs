// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Run orchestration
//!
//! Composes tag derivation, the task registry and the scheduler into a
//! linear state machine:
//!
//! ```text
//! Idle -> FetchingArtifacts -> DerivingTags -> RunningPhase1 -> Phase1Failed
//!                                                           -> AggregatingKeys -> RunningPhase2 -> Phase2Failed
//!                                                                                              -> Succeeded
//! ```
//!
//! Retrieval and derivation failures end in `InputFailed`. Fan-out flows
//! skip derivation, aggregation and phase two.
//!
//! Nothing is rolled back on failure: images, manifests or files published
//! before the failing task stay live and must be cleaned up by the operator.

use std::fmt;
use std::sync::Arc;

use super::budget::ConcurrencyBudget;
use super::registry::{ManifestGroups, TaskRegistry};
use super::scheduler::{BatchReport, BoundedScheduler, RunContext};
use super::task::Task;
use crate::artifacts::{Artifact, ArtifactSource};
use crate::errors::{RelflowError, RelflowResult};
use crate::executors::{
    destination_for, FilePublisher, ImagePublisher, ManifestPublisher, PackageValidator,
};

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    FetchingArtifacts,
    InputFailed,
    DerivingTags,
    RunningPhase1,
    Phase1Failed,
    AggregatingKeys,
    RunningPhase2,
    Phase2Failed,
    Succeeded,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::InputFailed | Self::Phase1Failed | Self::Phase2Failed | Self::Succeeded
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::FetchingArtifacts => "fetching artifacts",
            Self::InputFailed => "input failed",
            Self::DerivingTags => "deriving tags",
            Self::RunningPhase1 => "running phase 1",
            Self::Phase1Failed => "phase 1 failed",
            Self::AggregatingKeys => "aggregating keys",
            Self::RunningPhase2 => "running phase 2",
            Self::Phase2Failed => "phase 2 failed",
            Self::Succeeded => "succeeded",
        };
        f.write_str(name)
    }
}

/// Results of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub phase_one: BatchReport,
    pub phase_two: Option<BatchReport>,
    /// Manifest groups published in phase two
    pub manifests: ManifestGroups,
}

impl RunReport {
    /// Output lines of every task, phase one first
    pub fn outputs(&self) -> Vec<&str> {
        self.phase_one
            .outputs()
            .chain(self.phase_two.iter().flat_map(|b| b.outputs()))
            .collect()
    }
}

/// Drives one publication or validation run.
///
/// Single-use: the budget is scoped to the run and shared by both phases.
pub struct Orchestrator {
    scheduler: BoundedScheduler,
    ctx: RunContext,
    state: RunState,
}

impl Orchestrator {
    pub fn new(budget: ConcurrencyBudget, ctx: RunContext) -> Self {
        Self {
            scheduler: BoundedScheduler::new(budget),
            ctx,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn budget(&self) -> &ConcurrencyBudget {
        self.scheduler.budget()
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!("Run state: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Leave `Idle`, rejecting a second run whatever the first one's outcome
    fn start(&mut self) -> RelflowResult<()> {
        if self.state != RunState::Idle {
            return Err(RelflowError::OrchestratorReused {
                state: self.state.to_string(),
            });
        }
        self.transition(RunState::FetchingArtifacts);
        Ok(())
    }

    /// Move to `InputFailed` if `result` is an error
    fn check_input<T>(&mut self, result: RelflowResult<T>) -> RelflowResult<T> {
        if result.is_err() {
            self.transition(RunState::InputFailed);
        }
        result
    }

    async fn fetch(
        &mut self,
        source: &dyn ArtifactSource,
        packages: &[String],
    ) -> RelflowResult<Vec<Artifact>> {
        self.start()?;
        let fetched = source.fetch_all(packages).await;
        self.check_input(fetched)
    }

    /// Run one batch, moving to `failed` if it does not succeed.
    async fn run_phase(&mut self, tasks: Vec<Task>, failed: RunState) -> RelflowResult<BatchReport> {
        tracing::info!("Scheduling {} task(s)", tasks.len());
        self.ctx.sink.phase(&self.state.to_string(), tasks.len());
        match self.scheduler.run(tasks, &self.ctx).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.transition(failed);
                Err(e)
            }
        }
    }

    /// Publish every artifact under each of its tags, then one manifest per
    /// manifest key.
    ///
    /// Phase two is only built once every phase-one task has succeeded.
    pub async fn publish_images(
        &mut self,
        source: &dyn ArtifactSource,
        packages: &[String],
        registry: &str,
        images: Arc<dyn ImagePublisher>,
        manifests: Arc<dyn ManifestPublisher>,
    ) -> RelflowResult<RunReport> {
        let artifacts = self.fetch(source, packages).await?;

        self.transition(RunState::DerivingTags);
        let registry = self.check_input(TaskRegistry::derive(&artifacts, registry))?;

        self.transition(RunState::RunningPhase1);
        let phase_one = self
            .run_phase(registry.phase_one(images), RunState::Phase1Failed)
            .await?;

        self.transition(RunState::AggregatingKeys);
        let tasks = match registry.phase_two(&phase_one, manifests) {
            Ok(tasks) => tasks,
            Err(e) => {
                self.transition(RunState::Phase2Failed);
                return Err(e);
            }
        };

        self.transition(RunState::RunningPhase2);
        let phase_two = self.run_phase(tasks, RunState::Phase2Failed).await?;

        self.transition(RunState::Succeeded);
        Ok(RunReport {
            phase_one,
            phase_two: Some(phase_two),
            manifests: registry.manifests().clone(),
        })
    }

    /// Run a single batch with no aggregation step
    pub async fn fan_out(&mut self, tasks: Vec<Task>) -> RelflowResult<RunReport> {
        self.start()?;
        self.fan_out_started(tasks).await
    }

    async fn fan_out_started(&mut self, tasks: Vec<Task>) -> RelflowResult<RunReport> {
        self.transition(RunState::RunningPhase1);
        let phase_one = self.run_phase(tasks, RunState::Phase1Failed).await?;

        self.transition(RunState::Succeeded);
        Ok(RunReport {
            phase_one,
            phase_two: None,
            manifests: ManifestGroups::default(),
        })
    }

    /// Copy every artifact to `{destination}/{file name}`
    pub async fn publish_files(
        &mut self,
        source: &dyn ArtifactSource,
        packages: &[String],
        destination: &str,
        publisher: Arc<dyn FilePublisher>,
    ) -> RelflowResult<RunReport> {
        let artifacts = self.fetch(source, packages).await?;

        let tasks = artifacts
            .into_iter()
            .map(|artifact| {
                let dst = destination_for(destination, artifact.file_name());
                let publisher = publisher.clone();
                Task::new(dst.clone(), "publish file", move || async move {
                    publisher.publish_file(&artifact, &dst).await
                })
            })
            .collect();

        self.fan_out_started(tasks).await
    }

    /// Run the validation workload against every artifact
    pub async fn validate_packages(
        &mut self,
        source: &dyn ArtifactSource,
        packages: &[String],
        validator: Arc<dyn PackageValidator>,
    ) -> RelflowResult<RunReport> {
        let artifacts = self.fetch(source, packages).await?;

        let tasks = artifacts
            .into_iter()
            .map(|artifact: Artifact| {
                let validator = validator.clone();
                Task::new(artifact.name.clone(), "validate package", move || async move {
                    validator.validate(&artifact).await
                })
            })
            .collect();

        self.fan_out_started(tasks).await
    }
}
