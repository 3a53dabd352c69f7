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

//! The conflict-checker contract: the scheduler never decides conflicts
//! itself, it only asks.

use shardstore_common::PartitionId;

use crate::queue::QueuedTxn;

/// Supplied by the caller; answers whether running `candidate` speculatively
/// underneath the stalled `dtxn` is safe. Implementations typically consult
/// a table/row conflict graph or a read/write set intersection, both
/// external collaborators this trait never sees.
pub trait ConflictChecker: Send + Sync {
    /// Procedures the checker never wants considered as the stalled side of
    /// a speculative scan at all (e.g. procedures with externally visible
    /// side effects). The caller checks this once against the stalled
    /// transaction's own procedure before calling `SpecExecScheduler::next`
    /// at all; it is not part of the per-candidate scan.
    fn should_ignore_procedure(&self, procedure: &str) -> bool {
        let _ = procedure;
        false
    }

    /// Whether `candidate` may run speculatively at `partition_id` while
    /// `dtxn` is stalled there. Errors propagate to the scheduler's caller
    /// unchanged and leave the queue unmodified.
    fn can_execute(
        &self,
        dtxn: &QueuedTxn,
        candidate: &QueuedTxn,
        partition_id: PartitionId,
    ) -> anyhow::Result<bool>;
}
