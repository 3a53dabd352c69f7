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

//! The partition estimator contract. Provided externally; this crate only
//! depends on the trait, never on a concrete implementation.

use std::collections::{HashMap, HashSet};

use shardstore_common::catalog::{FragmentId, PlanFragment};
use shardstore_common::param::ParameterSet;
use shardstore_common::PartitionId;

/// Stateless service that, given a plan fragment set and bound parameters,
/// returns the set of partitions each fragment must touch.
///
/// Implementations MUST be deterministic for identical inputs and MUST
/// clear and refill both output collections on every call.
pub trait PartitionEstimator {
    /// Populate `frag_partitions` (fragment id -> touched partitions) and
    /// `all_partitions` (the union across all fragments) for the given
    /// fragment set, bound parameters and base partition.
    fn get_all_fragment_partitions(
        &self,
        frag_partitions: &mut HashMap<FragmentId, HashSet<PartitionId>>,
        all_partitions: &mut HashSet<PartitionId>,
        fragments: &[PlanFragment],
        params: &ParameterSet,
        base_partition: PartitionId,
    ) -> anyhow::Result<()>;
}
