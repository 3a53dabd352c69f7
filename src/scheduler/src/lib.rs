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

//! The Speculative Execution Scheduler: scans a partition's work queue for a
//! non-conflicting single-partition transaction to run while a distributed
//! transaction is stalled, under a pluggable ordering policy.

pub mod checker;
pub mod config;
pub mod metrics;
pub mod queue;
pub mod scheduler;

pub use checker::ConflictChecker;
pub use config::{InvalidWindowSize, ParsePolicyError, SchedulerConfig, SchedulingPolicy};
pub use metrics::SchedulerMetrics;
pub use queue::{EstimatorState, QueueCursor, QueuedTxn, RemainingEstimate, WorkQueue};
pub use scheduler::{SpecExecScheduler, SpeculationType};
