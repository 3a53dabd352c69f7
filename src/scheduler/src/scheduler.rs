// Copyright 2026 ShardStore Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The Speculative Execution Scheduler: picks a non-conflicting
//! single-partition transaction from a partition's work queue to run while
//! a distributed transaction is stalled there.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use shardstore_common::PartitionId;
use tracing::trace;

use crate::checker::ConflictChecker;
use crate::config::{SchedulerConfig, SchedulingPolicy};
use crate::metrics::SchedulerMetrics;
use crate::queue::{QueueCursor, QueuedTxn, WorkQueue};

/// Tags a `next` call so the FIRST-policy cursor cache only resumes a scan
/// when the caller is asking about the same kind of speculation as last
/// time. Opaque to the scheduler beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeculationType {
    /// The stalled transaction has not yet issued any work; any
    /// non-conflicting candidate is eligible.
    Unset,
    /// Only read-only candidates may run underneath the stall.
    SafeReads,
    /// Candidates with side effects are eligible too, on the caller's
    /// assurance that rollback on misspeculation is handled elsewhere.
    Unsafe,
}

/// Picks a speculative candidate from one partition's [`WorkQueue`].
/// Expected to live on that partition's dispatcher thread; the queue itself
/// is behind a mutex purely so other threads can enqueue newly-arrived
/// transactions concurrently with a scan.
pub struct SpecExecScheduler<C> {
    partition_id: PartitionId,
    queue: Arc<Mutex<WorkQueue>>,
    checker: C,
    config: SchedulerConfig,
    metrics: Option<SchedulerMetrics>,
    last_dtxn_id: Option<i64>,
    last_spec_type: Option<SpeculationType>,
    last_cursor: Option<QueueCursor>,
}

impl<C: ConflictChecker> SpecExecScheduler<C> {
    pub fn new(partition_id: PartitionId, checker: C, config: SchedulerConfig) -> Self {
        let metrics = config.profiling.then(SchedulerMetrics::for_test);
        Self {
            partition_id,
            queue: Arc::new(Mutex::new(WorkQueue::new())),
            checker,
            config,
            metrics,
            last_dtxn_id: None,
            last_spec_type: None,
            last_cursor: None,
        }
    }

    pub fn with_metrics(mut self, metrics: SchedulerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn queue_handle(&self) -> Arc<Mutex<WorkQueue>> {
        Arc::clone(&self.queue)
    }

    pub fn enqueue(&self, txn: QueuedTxn) {
        self.queue.lock().push_back(txn);
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Scan the work queue for a transaction that may run speculatively
    /// underneath `dtxn`. Returns `None` if none qualifies; on success the
    /// returned transaction has already been removed from the queue.
    ///
    /// The caller is responsible for checking
    /// `ConflictChecker::should_ignore_procedure` against `dtxn.procedure`
    /// before calling `next` at all; this scan only ever filters
    /// candidates, never the stalled transaction itself.
    ///
    /// Errors from the conflict checker propagate unchanged and leave the
    /// queue untouched.
    #[tracing::instrument(skip_all, fields(partition_id = self.partition_id, dtxn_id = dtxn.id))]
    pub fn next(
        &mut self,
        dtxn: &QueuedTxn,
        spec_type: SpeculationType,
    ) -> anyhow::Result<Option<QueuedTxn>> {
        let start = Instant::now();

        if self.config.ignore_all_local && dtxn.is_local && dtxn.predict_all_local {
            trace!(txn_id = dtxn.id, "skipping scan: dtxn is all-local");
            return Ok(None);
        }

        let mut queue = self.queue.lock();
        if let Some(metrics) = &self.metrics {
            metrics.queue_size.set(queue.len() as i64);
        }

        let resumable = self.config.policy == SchedulingPolicy::First
            && self.last_dtxn_id == Some(dtxn.id)
            && self.last_spec_type == Some(spec_type)
            && self.last_cursor.is_some();
        let mut cursor = if resumable {
            self.last_cursor.unwrap()
        } else {
            QueueCursor::start()
        };

        let mut best: Option<(usize, QueuedTxn, f64)> = None;
        let mut examined = 0usize;
        let mut comparisons = 0u64;

        let result = loop {
            let Some(candidate) = queue.get(cursor.next_index) else {
                break Ok(());
            };

            if !candidate.is_local || !candidate.is_single_partition || candidate.is_speculative {
                cursor.next_index += 1;
                continue;
            }

            comparisons += 1;
            let can_execute = match self.checker.can_execute(dtxn, candidate, self.partition_id) {
                Ok(v) => v,
                Err(e) => break Err(e),
            };
            if !can_execute {
                cursor.next_index += 1;
                continue;
            }

            match self.config.policy {
                SchedulingPolicy::First => {
                    best = Some((cursor.next_index, candidate.clone(), 0.0));
                    break Ok(());
                }
                SchedulingPolicy::Shortest | SchedulingPolicy::Longest => {
                    if let Some(remaining) = candidate
                        .estimator_state
                        .map(|s| s.last_estimate.remaining_execution_time)
                    {
                        let better = match &best {
                            None => true,
                            Some((_, _, best_time)) => match self.config.policy {
                                SchedulingPolicy::Shortest => remaining < *best_time,
                                SchedulingPolicy::Longest => remaining > *best_time,
                                SchedulingPolicy::First => unreachable!(),
                            },
                        };
                        if better {
                            best = Some((cursor.next_index, candidate.clone(), remaining));
                        }
                    }
                    examined += 1;
                    cursor.next_index += 1;
                    if examined >= self.config.window_size() {
                        break Ok(());
                    }
                }
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.comparisons.inc_by(comparisons);
        }

        self.last_dtxn_id = Some(dtxn.id);
        self.last_spec_type = Some(spec_type);

        let outcome = match result {
            Err(e) => {
                self.last_cursor = None;
                return Err(e);
            }
            Ok(()) => match best {
                Some((idx, txn, _)) => {
                    queue.remove_at(idx);
                    self.last_cursor = Some(QueueCursor { next_index: idx });
                    tracing::debug!(dtxn_id = dtxn.id, candidate_id = txn.id, "picked speculative candidate");
                    Some(txn)
                }
                None => {
                    self.last_cursor = Some(cursor);
                    tracing::trace!(dtxn_id = dtxn.id, "no non-conflicting candidate found");
                    None
                }
            },
        };

        drop(queue);

        if let Some(metrics) = &self.metrics {
            if outcome.is_some() {
                metrics.successes.inc();
            }
            metrics
                .scan_time_seconds
                .observe(start.elapsed().as_secs_f64());
        }

        Ok(outcome)
    }
}
