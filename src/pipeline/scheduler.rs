// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Bounded task scheduler
//!
//! Dispatches a batch of independent tasks under a shared
//! [`ConcurrencyBudget`]. Units are handed out in submission order; a task
//! only starts once it holds one, and gives it back when it finishes, fails
//! or panics.
//!
//! The first failure cancels the batch: tasks still waiting for a unit never
//! start, tasks already running finish and their results are discarded.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::budget::ConcurrencyBudget;
use super::failure::FailureAggregator;
use super::progress::{ProgressEvent, ProgressSink, TracingSink};
use super::task::{Task, TaskReport};
use crate::errors::{RelflowError, RelflowResult};

/// Caller-side controls for a run
#[derive(Clone)]
pub struct RunContext {
    /// Cancelled by the caller to abandon the run
    pub cancel: CancellationToken,
    /// No unit is handed out after this instant
    pub deadline: Option<tokio::time::Instant>,
    pub sink: Arc<dyn ProgressSink>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_deadline(mut self, deadline: tokio::time::Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Results of a fully successful batch.
///
/// Only the scheduler constructs one, so holding it proves every task of
/// the batch completed.
#[derive(Debug, Clone)]
pub struct BatchReport {
    reports: Vec<TaskReport>,
}

impl BatchReport {
    /// Per-task results in completion order
    pub fn reports(&self) -> &[TaskReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Output lines in completion order
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.reports.iter().map(|r| r.output.as_str())
    }
}

/// Runs batches of tasks under one budget
#[derive(Debug, Clone)]
pub struct BoundedScheduler {
    budget: ConcurrencyBudget,
}

impl BoundedScheduler {
    pub fn new(budget: ConcurrencyBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> &ConcurrencyBudget {
        &self.budget
    }

    /// Run every task of `tasks`, at most `capacity` at a time.
    ///
    /// Returns once all started tasks have finished. On failure the first
    /// error, annotated with its task id, is returned and nothing else.
    pub async fn run(&self, tasks: Vec<Task>, ctx: &RunContext) -> RelflowResult<BatchReport> {
        let aggregator = Arc::new(FailureAggregator::new(ctx.cancel.child_token()));
        let mut running = JoinSet::new();

        for task in tasks {
            let (id, verb, action) = task.into_parts();
            ctx.sink.event(&id, verb, &ProgressEvent::Attempting);

            let permit = match self.budget.acquire(aggregator.token(), ctx.deadline).await {
                Ok(permit) => permit,
                Err(reason) => {
                    tracing::debug!("[{}] Not started: {}", id, reason);
                    aggregator.fail(RelflowError::Acquisition { task: id, reason });
                    break;
                }
            };
            ctx.sink.event(&id, verb, &ProgressEvent::Acquired);

            let aggregator = aggregator.clone();
            let sink = ctx.sink.clone();
            running.spawn(async move {
                let _permit = permit;
                let start = Instant::now();

                let outcome = AssertUnwindSafe(async move { action().await })
                    .catch_unwind()
                    .await;

                match outcome {
                    Ok(Ok(output)) => {
                        sink.event(&id, verb, &ProgressEvent::Completed);
                        Some(TaskReport {
                            id,
                            output,
                            duration: start.elapsed(),
                        })
                    }
                    Ok(Err(source)) => {
                        sink.event(&id, verb, &ProgressEvent::Failed(format!("{:#}", source)));
                        aggregator.fail(RelflowError::TaskFailed { task: id, source });
                        None
                    }
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        sink.event(&id, verb, &ProgressEvent::Failed(message.clone()));
                        aggregator.fail(RelflowError::TaskPanicked { task: id, message });
                        None
                    }
                }
            });
        }

        let mut reports = Vec::new();
        while let Some(joined) = running.join_next().await {
            match joined {
                Ok(Some(report)) => reports.push(report),
                Ok(None) => {}
                Err(e) => {
                    aggregator.fail(RelflowError::TaskPanicked {
                        task: "<unknown>".into(),
                        message: e.to_string(),
                    });
                }
            }
        }

        aggregator.finish(BatchReport { reports })
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
