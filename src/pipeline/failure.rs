// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! First-error capture for a batch of tasks

use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::errors::{RelflowError, RelflowResult};

/// Keeps the first error of a batch and cancels the rest of it.
///
/// Later errors are dropped; only one error is ever surfaced.
#[derive(Debug)]
pub struct FailureAggregator {
    first: Mutex<Option<RelflowError>>,
    cancel: CancellationToken,
}

impl FailureAggregator {
    /// Create an aggregator that cancels `cancel` on the first failure
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            first: Mutex::new(None),
            cancel,
        }
    }

    /// Token pending work should watch
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Record a failure. Returns `true` if this was the first one.
    pub fn fail(&self, error: RelflowError) -> bool {
        let won = {
            let mut slot = self.first.lock().unwrap_or_else(|e| e.into_inner());
            if slot.is_none() {
                *slot = Some(error);
                true
            } else {
                tracing::debug!("Discarding later failure: {}", error);
                false
            }
        };
        self.cancel.cancel();
        won
    }

    pub fn has_failed(&self) -> bool {
        self.first
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Resolve the batch: the recorded error if any, otherwise `value`.
    pub fn finish<T>(&self, value: T) -> RelflowResult<T> {
        match self.first.lock().unwrap_or_else(|e| e.into_inner()).take() {
            Some(error) => Err(error),
            None => Ok(value),
        }
    }
}
