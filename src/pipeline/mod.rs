// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Bounded-concurrency task execution
//!
//! Tasks are scheduled against a shared [`ConcurrencyBudget`]. The first
//! failure in a batch cancels everything still waiting for a unit and is
//! the only error reported for that batch.

mod budget;
mod definition;
mod failure;
mod orchestrator;
mod progress;
mod registry;
mod scheduler;
mod task;

pub use budget::{AcquireError, BudgetPermit, BudgetStats, ConcurrencyBudget};
pub use definition::{ConfigOverrides, ReleaseConfig, CONFIG_FILES};
pub use failure::FailureAggregator;
pub use orchestrator::{Orchestrator, RunReport, RunState};
pub use progress::{ProgressBarSink, ProgressEvent, ProgressSink, RecordingSink, TracingSink};
pub use registry::{ImagePublication, ManifestGroup, ManifestGroups, TaskRegistry};
pub use scheduler::{BatchReport, BoundedScheduler, RunContext};
pub use task::{Task, TaskFuture, TaskReport};
