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

//! The Plan Graph Builder and Batch Planner: turns one batch of bound
//! statements into a partition-aware execution DAG.

pub mod batch_plan;
pub mod batch_planner;
pub mod error;
pub mod estimator;
pub mod fragment_task;
pub mod graph;

pub use batch_plan::BatchPlan;
pub use batch_planner::{AtomicTxnIdSource, BatchPlanner, TxnIdSource};
pub use error::{PlanningError, PlanningResult};
pub use estimator::PartitionEstimator;
pub use fragment_task::{FragmentTaskMessage, ProcedureKind, TaskType};
pub use graph::{PlanGraphBuilder, PlanVertex, VertexIndex};
