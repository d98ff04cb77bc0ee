// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Progress notifications
//!
//! A one-way channel for operator logs. Sinks never influence control flow.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Observable step in a task's life
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Attempting,
    Acquired,
    Completed,
    Failed(String),
}

/// Receives task progress events
pub trait ProgressSink: Send + Sync {
    fn event(&self, task: &str, verb: &str, event: &ProgressEvent);

    /// A batch of `total` tasks is about to be scheduled
    fn phase(&self, _name: &str, _total: usize) {}
}

/// Logs events through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&self, task: &str, verb: &str, event: &ProgressEvent) {
        match event {
            ProgressEvent::Attempting => tracing::info!("[{}] Attempting to {}", task, verb),
            ProgressEvent::Acquired => tracing::info!("[{}] Acquired concurrency unit", task),
            ProgressEvent::Completed => tracing::info!("[{}] Done: {}", task, verb),
            ProgressEvent::Failed(error) => {
                tracing::error!("[{}] Failed to {}: {}", task, verb, error)
            }
        }
    }
}

/// Progress bar over a known number of tasks
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    pub fn new(total: u64, message: &str) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Retarget the bar for the next phase
    pub fn reset(&self, total: u64, message: &str) {
        self.bar.reset();
        self.bar.set_length(total);
        self.bar.set_message(message.to_string());
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for ProgressBarSink {
    fn event(&self, task: &str, verb: &str, event: &ProgressEvent) {
        match event {
            ProgressEvent::Attempting | ProgressEvent::Acquired => {}
            ProgressEvent::Completed => self.bar.inc(1),
            ProgressEvent::Failed(error) => {
                self.bar.println(format!("  ✗ [{}] failed to {}: {}", task, verb, error));
                self.bar.inc(1);
            }
        }
    }

    fn phase(&self, name: &str, total: usize) {
        self.reset(total as u64, name);
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, ProgressEvent)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far, in arrival order
    pub fn events(&self) -> Vec<(String, ProgressEvent)> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Events recorded for one task
    pub fn events_for(&self, task: &str) -> Vec<ProgressEvent> {
        self.events()
            .into_iter()
            .filter(|(id, _)| id == task)
            .map(|(_, event)| event)
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn event(&self, task: &str, _verb: &str, event: &ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((task.to_string(), event.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_filters_by_task() {
        let sink = RecordingSink::new();
        sink.event("a", "publish image", &ProgressEvent::Attempting);
        sink.event("b", "publish image", &ProgressEvent::Attempting);
        sink.event("a", "publish image", &ProgressEvent::Completed);

        assert_eq!(
            sink.events_for("a"),
            vec![ProgressEvent::Attempting, ProgressEvent::Completed]
        );
        assert_eq!(sink.events().len(), 3);
    }
}
