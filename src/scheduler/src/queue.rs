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

//! The per-partition work queue the scheduler scans: the queued
//! transactions waiting to run, in arrival order, plus a resumable cursor
//! over them.

use std::collections::VecDeque;

use shardstore_common::PartitionId;

/// A transaction's remaining-time estimate as of the last time it was
/// (re-)estimated; stale once the transaction has executed further
/// fragments, but that staleness is accepted by SHORTEST/LONGEST.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemainingEstimate {
    pub remaining_execution_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorState {
    pub last_estimate: RemainingEstimate,
}

/// The scheduler's view of one transaction sitting in, or stalled ahead of,
/// a partition's work queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedTxn {
    pub id: i64,
    pub procedure: String,
    pub base_partition: PartitionId,
    /// True iff this transaction's coordinator thread lives on this
    /// partition.
    pub is_local: bool,
    /// True iff this transaction touches only one partition.
    pub is_single_partition: bool,
    /// True iff this transaction is itself already running speculatively;
    /// such a transaction can never itself be picked (no nested
    /// speculation).
    pub is_speculative: bool,
    /// True iff the partition estimator predicted, at dispatch time, that
    /// this transaction would touch only its local partition.
    pub predict_all_local: bool,
    pub estimator_state: Option<EstimatorState>,
}

impl QueuedTxn {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        procedure: impl Into<String>,
        base_partition: PartitionId,
        is_local: bool,
        is_single_partition: bool,
        is_speculative: bool,
        predict_all_local: bool,
    ) -> Self {
        Self {
            id,
            procedure: procedure.into(),
            base_partition,
            is_local,
            is_single_partition,
            is_speculative,
            predict_all_local,
            estimator_state: None,
        }
    }

    pub fn with_estimate(mut self, remaining_execution_time: f64) -> Self {
        self.estimator_state = Some(EstimatorState {
            last_estimate: RemainingEstimate {
                remaining_execution_time,
            },
        });
        self
    }
}

/// A resumable position into a [`WorkQueue`] scan. Plain data so the
/// scheduler can cache it between calls to `next` for the FIRST policy
/// without holding a borrow of the queue across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueCursor {
    pub(crate) next_index: usize,
}

impl QueueCursor {
    pub fn start() -> Self {
        Self::default()
    }
}

/// The priority-ordered sequence of transactions queued at one partition,
/// in arrival order. Removal during a scan goes through the same index the
/// scan is positioned at, so a cached [`QueueCursor`] stays valid across the
/// removal that produced it.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: VecDeque<QueuedTxn>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, txn: QueuedTxn) {
        self.items.push_back(txn);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&QueuedTxn> {
        self.items.get(index)
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Option<QueuedTxn> {
        self.items.remove(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedTxn> {
        self.items.iter()
    }
}
