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

//! Shared catalog types, identifiers and pooled scratch buffers used by both
//! the batch planner and the speculative execution scheduler.

pub mod catalog;
pub mod dependency;
pub mod param;
pub mod pool;

pub use catalog::{FragmentRole, PlanFragment, Statement};
pub use dependency::{DependencyId, NULL_DEPENDENCY_ID};
pub use param::{ParameterSet, SerializationError, Value};

/// A partition (shard) identifier. Partitions are assigned by the
/// out-of-scope partition-plan rebalancer; this crate only ever reads them.
pub type PartitionId = i32;

/// A stable, catalog-assigned statement identifier.
pub type StatementId = i32;
