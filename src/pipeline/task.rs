// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Units of work handed to the scheduler

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Future produced by a task's action
pub type TaskFuture = BoxFuture<'static, anyhow::Result<String>>;

type Action = Box<dyn FnOnce() -> TaskFuture + Send>;

/// A named, single-shot action.
///
/// The action owns a snapshot of its inputs; it is only invoked once a
/// concurrency unit has been acquired. Tasks are never retried.
pub struct Task {
    id: String,
    verb: &'static str,
    action: Action,
}

impl Task {
    /// Create a task. `verb` describes the action in progress messages,
    /// e.g. `"publish image"`.
    pub fn new<F, Fut>(id: impl Into<String>, verb: &'static str, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
    {
        Self {
            id: id.into(),
            verb,
            action: Box::new(move || Box::pin(action()) as TaskFuture),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn verb(&self) -> &'static str {
        self.verb
    }

    pub(crate) fn into_parts(self) -> (String, &'static str, Action) {
        (self.id, self.verb, self.action)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("verb", &self.verb)
            .finish_non_exhaustive()
    }
}

/// Outcome of a successful task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub id: String,
    /// Output line reported by the action
    pub output: String,
    pub duration: Duration,
}
