//! Fanout - running many reconciliations on a bounded worker pool
//!
//! Batch operations (one resource per cluster node, one per tenant) run as
//! an explicit task list with a per-task result each, never as
//! unsupervised process spawning. At most `max_in_flight` reconciliations
//! are live at once; on failure the pool stops launching new tasks, drains
//! the ones in flight, and reports everything not started as skipped.

use futures::stream::{FuturesUnordered, StreamExt};

use crate::creator::Create;
use crate::descriptor::{ResourceDescriptor, ResourceHandle};
use crate::error::ReconcileError;
use crate::locator::Locate;
use crate::reconciler::Reconciler;

/// Fanout configuration
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Maximum number of reconciliations in flight at once
    pub max_in_flight: usize,
    /// Keep launching tasks after a failure
    pub continue_on_error: bool,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            continue_on_error: false,
        }
    }
}

/// Result of one task in the batch
#[derive(Debug)]
pub enum TaskStatus {
    /// Reconciliation returned a handle
    Completed(ResourceHandle),
    /// Reconciliation failed
    Failed(ReconcileError),
    /// Never started because an earlier task failed
    Skipped,
}

/// One descriptor and what happened to it
#[derive(Debug)]
pub struct TaskOutcome {
    pub descriptor: ResourceDescriptor,
    pub status: TaskStatus,
}

/// Result of executing the whole batch, in input order
#[derive(Debug)]
pub struct FanoutReport {
    pub outcomes: Vec<TaskOutcome>,
    pub success_count: usize,
    pub failure_count: usize,
    pub skipped_count: usize,
}

impl FanoutReport {
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }
}

/// Bounded-concurrency driver over a Reconciler
pub struct Fanout<'a, L, C> {
    reconciler: &'a Reconciler<L, C>,
    config: FanoutConfig,
}

impl<'a, L: Locate, C: Create> Fanout<'a, L, C> {
    pub fn new(reconciler: &'a Reconciler<L, C>) -> Self {
        Self {
            reconciler,
            config: FanoutConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FanoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Reconcile every descriptor, collecting a per-task outcome
    ///
    /// Racing on the same descriptor is tolerated: the provider arbitrates
    /// and the loser's conflict resolves to "already exists".
    pub async fn run(&self, descriptors: Vec<ResourceDescriptor>) -> FanoutReport {
        let total = descriptors.len();
        let limit = self.config.max_in_flight.max(1);
        let reconciler = self.reconciler;

        let run_one = |idx: usize, descriptor: ResourceDescriptor| async move {
            let result = reconciler.reconcile(&descriptor).await;
            (idx, descriptor, result)
        };

        let mut slots: Vec<Option<TaskOutcome>> = (0..total).map(|_| None).collect();
        let mut pending = descriptors.into_iter().enumerate();
        let mut in_flight = FuturesUnordered::new();

        for _ in 0..limit {
            if let Some((idx, descriptor)) = pending.next() {
                in_flight.push(run_one(idx, descriptor));
            }
        }

        let mut halted = false;
        while let Some((idx, descriptor, result)) = in_flight.next().await {
            let status = match result {
                Ok(handle) => TaskStatus::Completed(handle),
                Err(err) => {
                    if !self.config.continue_on_error {
                        halted = true;
                    }
                    TaskStatus::Failed(err)
                }
            };
            slots[idx] = Some(TaskOutcome { descriptor, status });

            if !halted && let Some((next_idx, next_descriptor)) = pending.next() {
                in_flight.push(run_one(next_idx, next_descriptor));
            }
        }

        // Tasks that never started are reported, not silently dropped.
        for (idx, descriptor) in pending {
            slots[idx] = Some(TaskOutcome {
                descriptor,
                status: TaskStatus::Skipped,
            });
        }

        let outcomes: Vec<TaskOutcome> = slots.into_iter().flatten().collect();
        let mut success_count = 0;
        let mut failure_count = 0;
        let mut skipped_count = 0;
        for outcome in &outcomes {
            match outcome.status {
                TaskStatus::Completed(_) => success_count += 1,
                TaskStatus::Failed(_) => failure_count += 1,
                TaskStatus::Skipped => skipped_count += 1,
            }
        }

        FanoutReport {
            outcomes,
            success_count,
            failure_count,
            skipped_count,
        }
    }
}
