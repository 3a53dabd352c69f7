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

//! The Plan Graph Builder: the mutable DAG of a single [`BatchPlan`] during
//! planning.
//!
//! Vertices are stored in a flat `Vec` and referred to by stable index, so
//! the DAG never hands out pointers to vertices. This breaks the cyclic
//! ownership that a pointer-based graph between `BatchPlan`, the DAG and
//! its vertices would otherwise create.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use shardstore_common::catalog::PlanFragment;
use shardstore_common::dependency::{DependencyId, NULL_DEPENDENCY_ID};
use shardstore_common::param::ParameterSet;
use shardstore_common::PartitionId;

use crate::error::PlanningError;

/// A stable index into a [`PlanGraphBuilder`]'s vertex list.
pub type VertexIndex = usize;

/// One fragment execution scheduled at one partition.
#[derive(Debug, Clone)]
pub struct PlanVertex {
    pub fragment: PlanFragment,
    pub partition: PartitionId,
    pub stmt_index: usize,
    pub input_dep_id: Option<DependencyId>,
    pub output_dep_id: DependencyId,
    pub params: Arc<ParameterSet>,
    /// True iff the owning fragment touches only the plan's base partition.
    pub local: bool,
}

impl PlanVertex {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fragment: PlanFragment,
        partition: PartitionId,
        stmt_index: usize,
        input_dep_id: Option<DependencyId>,
        output_dep_id: DependencyId,
        params: Arc<ParameterSet>,
        local: bool,
    ) -> Self {
        Self {
            fragment,
            partition,
            stmt_index,
            input_dep_id,
            output_dep_id,
            params,
            local,
        }
    }
}

// Equality identity is the full vertex tuple; the hash is derived from
// (fragment, partition) alone and must stay stable across the vertex's
// lifetime, independent of the other fields.
impl PartialEq for PlanVertex {
    fn eq(&self, other: &Self) -> bool {
        self.fragment == other.fragment
            && self.partition == other.partition
            && self.stmt_index == other.stmt_index
            && self.input_dep_id == other.input_dep_id
            && self.output_dep_id == other.output_dep_id
            && self.params == other.params
    }
}

impl Eq for PlanVertex {}

impl Hash for PlanVertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fragment.hash(state);
        self.partition.hash(state);
    }
}

/// Builds the DAG for one `BatchPlan`. Single-threaded within one `plan()`
/// call, no internal synchronization.
#[derive(Default)]
pub struct PlanGraphBuilder {
    vertices: Vec<PlanVertex>,
    /// output_dep_id -> indices of vertices producing it. A partial
    /// function over dependency ids, indexed by the graph.
    producers_by_output: HashMap<DependencyId, Vec<VertexIndex>>,
    /// (consumer, producer) edges, consumer -> producer.
    edges: Vec<(VertexIndex, VertexIndex)>,
    edge_set: std::collections::HashSet<(VertexIndex, VertexIndex)>,
}

impl PlanGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[PlanVertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[(VertexIndex, VertexIndex)] {
        &self.edges
    }

    /// Insert `vertex`, indexing it by its output dependency id. Rejects
    /// vertices whose output id is the null sentinel.
    pub fn add_vertex(&mut self, vertex: PlanVertex) -> Result<VertexIndex, PlanningError> {
        if vertex.output_dep_id == NULL_DEPENDENCY_ID {
            return Err(PlanningError::NullOutputDependency);
        }
        let idx = self.vertices.len();
        self.producers_by_output
            .entry(vertex.output_dep_id)
            .or_default()
            .push(idx);
        self.vertices.push(vertex);
        Ok(idx)
    }

    /// For every vertex whose `input_dep_id` is non-null, link it to every
    /// vertex producing that dependency id. Idempotent: calling this more
    /// than once never duplicates an edge.
    pub fn build_edges(&mut self) {
        let mut new_edges = Vec::new();
        for (consumer_idx, consumer) in self.vertices.iter().enumerate() {
            let Some(dep) = consumer.input_dep_id else {
                continue;
            };
            let Some(producers) = self.producers_by_output.get(&dep) else {
                continue;
            };
            for &producer_idx in producers {
                let edge = (consumer_idx, producer_idx);
                if self.edge_set.insert(edge) {
                    new_edges.push(edge);
                }
            }
        }
        self.edges.extend(new_edges);
    }

    /// Vertices with no outgoing edges: the fragments with no input
    /// dependency, i.e. the leaves of their statement's fragment chain.
    /// These seed round 0 of the longest-path traversal.
    pub fn roots(&self) -> Vec<VertexIndex> {
        let has_outgoing: std::collections::HashSet<VertexIndex> =
            self.edges.iter().map(|&(c, _)| c).collect();
        (0..self.vertices.len())
            .filter(|i| !has_outgoing.contains(i))
            .collect()
    }

    /// The longest-path depth of every vertex: 0 for a root, otherwise one
    /// more than the deepest vertex it (transitively) depends on. This is
    /// the "round" used to group fragment-task messages; a producer must
    /// finish before every round that depends on it, so the longest path to
    /// any of its consumers is the correct bound, not the shortest.
    fn depths(&self) -> Vec<usize> {
        let mut producers_of: HashMap<VertexIndex, Vec<VertexIndex>> = HashMap::new();
        for &(consumer, producer) in &self.edges {
            producers_of.entry(consumer).or_default().push(producer);
        }

        let mut depth = vec![None; self.vertices.len()];
        for start in 0..self.vertices.len() {
            if depth[start].is_some() {
                continue;
            }
            // Iterative post-order so depth graphs deeper than the default
            // stack size don't blow the call stack.
            let mut stack = vec![(start, false)];
            while let Some((idx, expanded)) = stack.pop() {
                if depth[idx].is_some() {
                    continue;
                }
                match producers_of.get(&idx) {
                    None => depth[idx] = Some(0),
                    Some(producers) if producers.is_empty() => depth[idx] = Some(0),
                    Some(producers) => {
                        if expanded {
                            let max = producers
                                .iter()
                                .map(|p| depth[*p].expect("producer depth computed before consumer"))
                                .max()
                                .unwrap();
                            depth[idx] = Some(max + 1);
                        } else {
                            stack.push((idx, true));
                            for &p in producers {
                                if depth[p].is_none() {
                                    stack.push((p, false));
                                }
                            }
                        }
                    }
                }
            }
        }
        depth.into_iter().map(|d| d.unwrap_or(0)).collect()
    }

    /// Visit every vertex in order of longest-path depth; vertices at the
    /// same depth are visited in insertion order.
    pub fn traverse_longest_path(&self, mut visit: impl FnMut(VertexIndex, usize)) {
        let depths = self.depths();
        let mut order: Vec<VertexIndex> = (0..self.vertices.len()).collect();
        order.sort_by_key(|&idx| depths[idx]);
        for idx in order {
            visit(idx, depths[idx]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardstore_common::catalog::FragmentRole;

    fn vertex(
        frag_id: i64,
        partition: PartitionId,
        stmt_index: usize,
        input: Option<DependencyId>,
        output: DependencyId,
    ) -> PlanVertex {
        PlanVertex::new(
            PlanFragment::new(frag_id, 0, FragmentRole::Output),
            partition,
            stmt_index,
            input,
            output,
            Arc::new(ParameterSet::default()),
            true,
        )
    }

    #[test]
    fn rejects_null_output_dependency() {
        let mut pgb = PlanGraphBuilder::new();
        let v = vertex(1, 0, 0, None, NULL_DEPENDENCY_ID);
        assert!(matches!(
            pgb.add_vertex(v),
            Err(PlanningError::NullOutputDependency)
        ));
    }

    #[test]
    fn build_edges_is_idempotent() {
        let mut pgb = PlanGraphBuilder::new();
        pgb.add_vertex(vertex(1, 0, 0, None, 1000)).unwrap();
        pgb.add_vertex(vertex(2, 0, 0, Some(1000), 1001)).unwrap();

        pgb.build_edges();
        let edges_after_first = pgb.edges().to_vec();
        pgb.build_edges();
        assert_eq!(pgb.edges(), edges_after_first.as_slice());
        assert_eq!(pgb.edges().len(), 1);
    }

    #[test]
    fn roots_are_vertices_with_no_outgoing_edge() {
        let mut pgb = PlanGraphBuilder::new();
        let leaf = pgb.add_vertex(vertex(1, 0, 0, None, 1000)).unwrap();
        let consumer = pgb.add_vertex(vertex(2, 0, 0, Some(1000), 1001)).unwrap();
        pgb.build_edges();

        let roots = pgb.roots();
        assert_eq!(roots, vec![leaf]);
        assert_ne!(roots, vec![consumer]);
    }

    #[test]
    fn multi_round_depth_matches_longest_path() {
        // Two leaves feeding one aggregator: leaves at depth 0, aggregator
        // at depth 1, matching the rationale that a producer must be done
        // before every consumer round, not just the nearest one.
        let mut pgb = PlanGraphBuilder::new();
        pgb.add_vertex(vertex(1, 0, 0, None, 1000)).unwrap();
        pgb.add_vertex(vertex(1, 1, 0, None, 1000)).unwrap();
        pgb.add_vertex(vertex(2, 0, 1, Some(1000), 1001)).unwrap();
        pgb.build_edges();

        let mut visited = Vec::new();
        pgb.traverse_longest_path(|idx, depth| visited.push((idx, depth)));

        assert_eq!(visited[0].1, 0);
        assert_eq!(visited[1].1, 0);
        assert_eq!(visited[2].1, 1);
    }
}
