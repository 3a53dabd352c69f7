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

//! Planning failures. `Mispredict` is always surfaced to the caller
//! unchanged; the other variants bubble up wrapped with the statement index
//! and owning procedure, per the propagation policy.

use shardstore_common::param::SerializationError;
use thiserror::Error;

pub type PlanningResult<T> = std::result::Result<T, PlanningError>;

#[derive(Error, Debug)]
pub enum PlanningError {
    /// The caller predicted single-partition execution but the partition
    /// estimator proved the statement touches more than one partition.
    /// Recoverable: the caller restarts the transaction as multi-partition.
    #[error("transaction {txn_id} mispredicted as single-partition")]
    Mispredict { txn_id: i64 },

    /// The partition estimator (or the catalog behind it) failed or
    /// returned an inconsistent result. Fatal to this plan, not to the
    /// process.
    #[error(
        "partition estimator failed for statement {statement_index} of procedure \
         {procedure:?}: {source}"
    )]
    Estimator {
        statement_index: usize,
        procedure: String,
        #[source]
        source: anyhow::Error,
    },

    /// Parameter serialization failed while assembling fragment-task
    /// messages. Fatal to this plan.
    #[error(
        "failed to serialize parameters for statement {statement_index} of procedure \
         {procedure:?}: {source}"
    )]
    Serialization {
        statement_index: usize,
        procedure: String,
        #[source]
        source: SerializationError,
    },

    /// The graph builder rejected a vertex with no output dependency id;
    /// this can only happen if the planner itself has a bug, since every
    /// vertex it constructs is assigned a fresh dependency id.
    #[error("internal error: attempted to add a plan vertex with no output dependency id")]
    NullOutputDependency,
}
