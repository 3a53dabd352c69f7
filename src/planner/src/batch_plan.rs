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

//! `BatchPlan`: the finalized DAG plus the per-statement touched
//! partitions, the four aggregate booleans, and the memoized round
//! grouping used to assemble fragment-task messages.

use std::collections::BTreeMap;

use shardstore_common::dependency::DependencyId;
use shardstore_common::PartitionId;

use crate::error::{PlanningError, PlanningResult};
use crate::fragment_task::{FragmentTaskMessage, ProcedureKind, TaskType};
use crate::graph::{PlanGraphBuilder, PlanVertex, VertexIndex};

/// The round number a vertex was placed in and the partition it runs at;
/// this is the `(round, partition)` bucket key used to group fragment-task
/// messages.
type RoundBucketKey = (usize, PartitionId);

/// A finalized, query-ready batch plan. Exclusively owns its vertices,
/// edges and DAG; callers only ever see vertex data by value or reference
/// through this type, never the graph's internal indices.
pub struct BatchPlan {
    base_partition: PartitionId,
    initiator_id: i32,
    procedure: ProcedureKind,
    graph: PlanGraphBuilder,
    stmt_partition_ids: Vec<Vec<PartitionId>>,
    readonly: bool,
    all_local: bool,
    all_single_sited: bool,
    local_frags_nontx: bool,
    /// Memoized at finalization time: buckets ordered by round ascending,
    /// then partition ascending; vertices within a bucket keep the
    /// longest-path traversal's insertion order.
    round_buckets: Vec<(RoundBucketKey, Vec<VertexIndex>)>,
}

impl BatchPlan {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn finalize(
        base_partition: PartitionId,
        initiator_id: i32,
        procedure: ProcedureKind,
        mut graph: PlanGraphBuilder,
        stmt_partition_ids: Vec<Vec<PartitionId>>,
        readonly: bool,
        all_local: bool,
        all_single_sited: bool,
    ) -> PlanningResult<Self> {
        graph.build_edges();

        let mut buckets: BTreeMap<RoundBucketKey, Vec<VertexIndex>> = BTreeMap::new();
        graph.traverse_longest_path(|idx, depth| {
            let partition = graph.vertices()[idx].partition;
            buckets.entry((depth, partition)).or_default().push(idx);
        });

        let local_frags_nontx = graph
            .vertices()
            .iter()
            .filter(|v| v.partition == base_partition)
            .all(|v| v.local);

        Ok(Self {
            base_partition,
            initiator_id,
            procedure,
            round_buckets: buckets.into_iter().collect(),
            graph,
            stmt_partition_ids,
            readonly,
            all_local,
            all_single_sited,
            local_frags_nontx,
        })
    }

    pub fn base_partition(&self) -> PartitionId {
        self.base_partition
    }

    pub fn is_read_only(&self) -> bool {
        self.readonly
    }

    pub fn is_local(&self) -> bool {
        self.all_local
    }

    pub fn is_single_sited(&self) -> bool {
        self.all_single_sited
    }

    /// True iff every fragment scheduled at the base partition touches
    /// only the base partition, so the work done there needs no
    /// transactional coordination with remote partitions.
    pub fn local_frags_nontx(&self) -> bool {
        self.local_frags_nontx
    }

    pub fn statement_partitions(&self) -> &[Vec<PartitionId>] {
        &self.stmt_partition_ids
    }

    pub fn vertices(&self) -> &[PlanVertex] {
        self.graph.vertices()
    }

    pub fn edges(&self) -> &[(VertexIndex, VertexIndex)] {
        self.graph.edges()
    }

    /// Assemble fragment-task messages for this plan, one per non-empty
    /// `(round, partition)` bucket, ordered by round ascending.
    ///
    /// `final_task` is computed per target partition, not against the
    /// plan's global last round: a partition whose work all lands in round
    /// 0 has no more messages coming even if another partition's fragments
    /// run a later round.
    pub fn fragment_task_messages(
        &self,
        txn_id: i64,
        client_handle: i64,
    ) -> PlanningResult<Vec<FragmentTaskMessage>> {
        let mut max_round_by_partition: std::collections::HashMap<PartitionId, usize> =
            std::collections::HashMap::new();
        for &((round, partition), ref vertex_indices) in &self.round_buckets {
            if vertex_indices.is_empty() {
                continue;
            }
            max_round_by_partition
                .entry(partition)
                .and_modify(|r| *r = (*r).max(round))
                .or_insert(round);
        }

        let mut messages = Vec::with_capacity(self.round_buckets.len());
        for &((round, partition), ref vertex_indices) in &self.round_buckets {
            if vertex_indices.is_empty() {
                continue;
            }

            let mut fragment_ids = Vec::with_capacity(vertex_indices.len());
            let mut input_dep_ids = Vec::with_capacity(vertex_indices.len());
            let mut output_dep_ids: Vec<DependencyId> = Vec::with_capacity(vertex_indices.len());
            let mut statement_indexes = Vec::with_capacity(vertex_indices.len());
            let mut parameter_payloads = Vec::with_capacity(vertex_indices.len());

            for &idx in vertex_indices {
                let vertex = &self.graph.vertices()[idx];
                fragment_ids.push(vertex.fragment.id);
                input_dep_ids.push(FragmentTaskMessage::input_dep_id_or_sentinel(
                    vertex.input_dep_id,
                ));
                output_dep_ids.push(vertex.output_dep_id);
                statement_indexes.push(vertex.stmt_index as i32);
                let payload =
                    vertex
                        .params
                        .serialize()
                        .map_err(|source| PlanningError::Serialization {
                            statement_index: vertex.stmt_index,
                            procedure: format!("{:?}", self.procedure),
                            source,
                        })?;
                parameter_payloads.push(payload);
            }

            messages.push(FragmentTaskMessage {
                target_partition: partition,
                initiator_id: self.initiator_id,
                txn_id,
                client_handle,
                fragment_ids,
                input_dep_ids,
                output_dep_ids,
                statement_indexes,
                parameter_payloads,
                task_type: TaskType::from(self.procedure),
                final_task: Some(round) == max_round_by_partition.get(&partition).copied(),
            });
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use shardstore_common::catalog::FragmentRole;
    use shardstore_common::param::ParameterSet;

    use super::*;
    use crate::graph::PlanVertex;
    use shardstore_common::catalog::PlanFragment;
    use shardstore_common::dependency::next_dependency_id;

    fn build_three_vertex_plan() -> BatchPlan {
        let mut graph = PlanGraphBuilder::new();
        let params = Arc::new(ParameterSet::default());

        let leaf_output = next_dependency_id();
        for partition in [0, 1, 2] {
            graph
                .add_vertex(PlanVertex::new(
                    PlanFragment::new(100, 0, FragmentRole::Output),
                    partition,
                    0,
                    None,
                    leaf_output,
                    Arc::clone(&params),
                    partition == 0,
                ))
                .unwrap();
        }
        let agg_output = next_dependency_id();
        graph
            .add_vertex(PlanVertex::new(
                PlanFragment::new(200, 1, FragmentRole::Input),
                0,
                1,
                Some(leaf_output),
                agg_output,
                Arc::clone(&params),
                true,
            ))
            .unwrap();

        BatchPlan::finalize(
            0,
            1,
            ProcedureKind::UserProc,
            graph,
            vec![vec![0, 1, 2], vec![0]],
            true,
            false,
            false,
        )
        .unwrap()
    }

    #[test]
    fn output_dependency_ids_are_per_fragment_and_inputs_resolve() {
        let plan = build_three_vertex_plan();
        // Every vertex of one fragment (here: the leaf fragment's three
        // partitions) shares one output id, since the mapping is
        // one-to-many; distinct fragments never collide.
        let mut by_fragment: std::collections::HashMap<shardstore_common::catalog::FragmentId, DependencyId> =
            std::collections::HashMap::new();
        for v in plan.vertices() {
            let existing = by_fragment.entry(v.fragment.id).or_insert(v.output_dep_id);
            assert_eq!(*existing, v.output_dep_id);
        }
        let distinct_outputs: HashSet<_> = by_fragment.values().copied().collect();
        assert_eq!(distinct_outputs.len(), by_fragment.len());

        for v in plan.vertices() {
            if let Some(input) = v.input_dep_id {
                assert!(plan.vertices().iter().any(|o| o.output_dep_id == input));
            }
        }
    }

    #[test]
    fn graph_is_acyclic_topological_order_exists() {
        let plan = build_three_vertex_plan();
        // A DAG admits a topological order iff repeatedly removing vertices
        // with no remaining outgoing edge empties it.
        let mut remaining: HashSet<usize> = (0..plan.vertices().len()).collect();
        let mut edges = plan.edges().to_vec();
        while !remaining.is_empty() {
            let ready: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|v| !edges.iter().any(|&(c, _)| c == *v && remaining.contains(v)))
                .collect();
            assert!(!ready.is_empty(), "cycle detected");
            for v in &ready {
                remaining.remove(v);
            }
            edges.retain(|&(c, p)| remaining.contains(&c) && remaining.contains(&p));
        }
    }

    #[test]
    fn round_grouping_respects_edge_order() {
        let plan = build_three_vertex_plan();
        let messages = plan.fragment_task_messages(1, 1).unwrap();
        let leaf_round = messages
            .iter()
            .find(|m| m.fragment_ids == [100])
            .unwrap();
        let agg_round = messages
            .iter()
            .find(|m| m.fragment_ids == [200])
            .unwrap();
        assert!(!leaf_round.final_task);
        assert!(agg_round.final_task);
        assert_eq!(agg_round.input_dep_ids[0], leaf_round.output_dep_ids[0]);
    }

    #[test]
    fn final_task_is_per_partition_not_plan_wide() {
        let plan = build_three_vertex_plan();
        let messages = plan.fragment_task_messages(1, 1).unwrap();

        // Partition 0 gets the aggregator's round after this one, so its
        // round-0 message isn't final.
        let partition0_round0 = messages
            .iter()
            .find(|m| m.target_partition == 0 && m.fragment_ids == [100])
            .unwrap();
        assert!(!partition0_round0.final_task);

        // Partitions 1 and 2 never hear from this transaction again, even
        // though round 0 isn't the plan's last round overall.
        let partition1 = messages.iter().find(|m| m.target_partition == 1).unwrap();
        let partition2 = messages.iter().find(|m| m.target_partition == 2).unwrap();
        assert!(partition1.final_task);
        assert!(partition2.final_task);
    }

    #[test]
    fn is_local_matches_single_partition_statements() {
        let plan = build_three_vertex_plan();
        assert!(!plan.is_local());
        assert_eq!(plan.statement_partitions(), &[vec![0, 1, 2], vec![0]]);
    }
}
