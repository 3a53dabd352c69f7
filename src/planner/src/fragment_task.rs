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

//! Fragment-task message assembly and the bit-exact wire layout sent to an
//! execution site.

use shardstore_common::catalog::FragmentId;
use shardstore_common::dependency::{DependencyId, NULL_DEPENDENCY_ID};
use shardstore_common::PartitionId;

/// Whether the owning stored procedure is a system procedure (one
/// fragment-task per partition, used for catalog/DDL-style work) or an
/// ordinary user procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    UserProc,
    SysProcPerPartition,
}

/// Mirrors [`ProcedureKind`] on the wire; kept distinct so the wire enum
/// can't silently drift from the planning-time one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    UserProc,
    SysProcPerPartition,
}

impl From<ProcedureKind> for TaskType {
    fn from(kind: ProcedureKind) -> Self {
        match kind {
            ProcedureKind::UserProc => TaskType::UserProc,
            ProcedureKind::SysProcPerPartition => TaskType::SysProcPerPartition,
        }
    }
}

/// One partition's work for one round of a `BatchPlan`. Field layout is
/// bit-exact with the wire protocol an execution site expects.
#[derive(Debug, Clone)]
pub struct FragmentTaskMessage {
    pub target_partition: PartitionId,
    pub initiator_id: i32,
    pub txn_id: i64,
    pub client_handle: i64,
    pub fragment_ids: Vec<FragmentId>,
    /// Sentinel [`NULL_DEPENDENCY_ID`] for "no input".
    pub input_dep_ids: Vec<DependencyId>,
    pub output_dep_ids: Vec<DependencyId>,
    pub statement_indexes: Vec<i32>,
    /// Each payload is the serialized `ParameterSet` for that vertex; the
    /// length prefix is the wire framing layer's responsibility, not this
    /// struct's.
    pub parameter_payloads: Vec<Vec<u8>>,
    pub task_type: TaskType,
    pub final_task: bool,
}

impl FragmentTaskMessage {
    pub fn input_dep_id_or_sentinel(dep: Option<DependencyId>) -> DependencyId {
        dep.unwrap_or(NULL_DEPENDENCY_ID)
    }
}
