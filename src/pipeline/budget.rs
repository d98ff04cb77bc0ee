// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Concurrency budget
//!
//! A counting semaphore scoped to one orchestrator run. Every task holds one
//! [`BudgetPermit`] while it executes; the permit is returned on drop, which
//! also covers panics and aborted futures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::{RelflowError, RelflowResult};

/// Why a concurrency unit could not be obtained
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    #[error("run was cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("budget closed")]
    Closed,
}

#[derive(Debug, Default)]
struct Counters {
    acquired: AtomicUsize,
    released: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Snapshot of a budget's usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BudgetStats {
    pub capacity: usize,
    pub acquired: usize,
    pub released: usize,
    pub in_flight: usize,
    /// Highest number of units held at once
    pub peak: usize,
}

/// Shared ceiling on simultaneously executing tasks
#[derive(Debug, Clone)]
pub struct ConcurrencyBudget {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    counters: Arc<Counters>,
}

impl ConcurrencyBudget {
    /// Create a budget of `capacity` units. Zero is rejected.
    pub fn new(capacity: usize) -> RelflowResult<Self> {
        if capacity == 0 || capacity > Semaphore::MAX_PERMITS {
            return Err(RelflowError::InvalidBudget { value: capacity });
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            counters: Arc::new(Counters::default()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Units currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for one unit.
    ///
    /// Fails immediately when `cancel` is already cancelled or `deadline` has
    /// passed, and gives up while waiting when either fires.
    pub async fn acquire(
        &self,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<BudgetPermit, AcquireError> {
        if cancel.is_cancelled() {
            return Err(AcquireError::Cancelled);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(AcquireError::DeadlineExceeded);
        }

        let expired = async {
            match deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending().await,
            }
        };

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AcquireError::Cancelled),
            _ = expired => return Err(AcquireError::DeadlineExceeded),
            permit = self.semaphore.clone().acquire_owned() => {
                permit.map_err(|_| AcquireError::Closed)?
            }
        };

        Ok(BudgetPermit::new(permit, self.counters.clone()))
    }

    pub fn stats(&self) -> BudgetStats {
        BudgetStats {
            capacity: self.capacity,
            acquired: self.counters.acquired.load(Ordering::SeqCst),
            released: self.counters.released.load(Ordering::SeqCst),
            in_flight: self.counters.in_flight.load(Ordering::SeqCst),
            peak: self.counters.peak.load(Ordering::SeqCst),
        }
    }
}

/// One held unit of a [`ConcurrencyBudget`]
#[derive(Debug)]
pub struct BudgetPermit {
    _permit: OwnedSemaphorePermit,
    counters: Arc<Counters>,
}

impl BudgetPermit {
    fn new(permit: OwnedSemaphorePermit, counters: Arc<Counters>) -> Self {
        counters.acquired.fetch_add(1, Ordering::SeqCst);
        let in_flight = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak.fetch_max(in_flight, Ordering::SeqCst);
        Self {
            _permit: permit,
            counters,
        }
    }
}

impl Drop for BudgetPermit {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}
