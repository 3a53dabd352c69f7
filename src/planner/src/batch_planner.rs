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

//! The Batch Planner: per-procedure immutable metadata, driving the
//! partition estimator and the graph builder to produce a `BatchPlan`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use shardstore_common::catalog::{FragmentId, PlanFragment, Statement};
use shardstore_common::dependency::next_dependency_id;
use shardstore_common::param::ParameterSet;
use shardstore_common::pool::FragmentListPool;
use shardstore_common::PartitionId;

use crate::batch_plan::BatchPlan;
use crate::error::{PlanningError, PlanningResult};
use crate::estimator::PartitionEstimator;
use crate::fragment_task::ProcedureKind;
use crate::graph::{PlanGraphBuilder, PlanVertex};

/// The transaction id oracle, modeled as a trait so `BatchPlanner` doesn't
/// need to know how ids are minted. Also supplies
/// the id a `Mispredict` error carries; the host reuses the same id when it
/// later calls `BatchPlan::fragment_task_messages`.
pub trait TxnIdSource: Send + Sync {
    fn next_txn_id(&self) -> i64;
}

/// A simple monotonic id source, useful for tests and small hosts that
/// don't have a real transaction id oracle wired up yet.
#[derive(Default)]
pub struct AtomicTxnIdSource {
    next: AtomicI64,
}

impl TxnIdSource for AtomicTxnIdSource {
    fn next_txn_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Per stored procedure: immutable batch metadata plus the collaborators
/// needed to plan one invocation.
pub struct BatchPlanner<E> {
    statements: Vec<Arc<Statement>>,
    batch_size: usize,
    procedure: ProcedureKind,
    partition_estimator: E,
    initiator_id: i32,
    txn_id_source: Arc<dyn TxnIdSource>,
    fragment_pool: FragmentListPool,
}

impl<E: PartitionEstimator> BatchPlanner<E> {
    pub fn new(
        statements: Vec<Arc<Statement>>,
        procedure: ProcedureKind,
        partition_estimator: E,
        initiator_id: i32,
        txn_id_source: Arc<dyn TxnIdSource>,
    ) -> Self {
        let batch_size = statements.len();
        Self {
            statements,
            batch_size,
            procedure,
            partition_estimator,
            initiator_id,
            txn_id_source,
            fragment_pool: FragmentListPool::new(),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Plan one invocation of this batch. `args` has exactly `batch_size`
    /// entries, one `ParameterSet` per statement.
    #[tracing::instrument(skip_all, fields(base_partition, predict_single_partition))]
    pub fn plan(
        &self,
        args: Vec<ParameterSet>,
        base_partition: PartitionId,
        predict_single_partition: bool,
    ) -> PlanningResult<BatchPlan> {
        assert_eq!(
            args.len(),
            self.batch_size,
            "plan() called with {} parameter sets for a batch of size {}",
            args.len(),
            self.batch_size
        );

        let mut graph = PlanGraphBuilder::new();
        let mut stmt_partition_ids = Vec::with_capacity(self.batch_size);
        let mut readonly = true;
        let mut all_local = true;
        let mut all_single_sited = true;

        let mut frag_partitions: HashMap<FragmentId, HashSet<PartitionId>> = HashMap::new();
        let mut all_partitions: HashSet<PartitionId> = HashSet::new();
        let mut prev_output_dep_id = None;

        for (stmt_index, (statement, params)) in
            self.statements.iter().zip(args.into_iter()).enumerate()
        {
            frag_partitions.clear();
            all_partitions.clear();

            let mut is_single = statement.has_single_partition_plan;
            loop {
                let fragments = statement.fragments_for(is_single);
                self.partition_estimator
                    .get_all_fragment_partitions(
                        &mut frag_partitions,
                        &mut all_partitions,
                        fragments,
                        &params,
                        base_partition,
                    )
                    .map_err(|source| PlanningError::Estimator {
                        statement_index: stmt_index,
                        procedure: format!("{:?}", self.procedure),
                        source,
                    })?;

                if is_single && all_partitions.len() > 1 {
                    if predict_single_partition {
                        let txn_id = self.txn_id_source.next_txn_id();
                        tracing::warn!(
                            txn_id,
                            stmt_index,
                            "statement predicted single-partition touched {} partitions",
                            all_partitions.len()
                        );
                        return Err(PlanningError::Mispredict { txn_id });
                    }
                    is_single = false;
                    continue;
                }
                break;
            }

            readonly &= statement.readonly;
            all_local &= all_partitions.len() == 1 && all_partitions.contains(&base_partition);
            all_single_sited &= is_single;

            let mut sorted_partitions: Vec<PartitionId> = all_partitions.iter().copied().collect();
            sorted_partitions.sort_unstable();
            stmt_partition_ids.push(sorted_partitions);

            let mut ordered_fragments = self.fragment_pool.acquire();
            ordered_fragments.extend_from_slice(statement.fragments_for(is_single));
            ordered_fragments.sort_by_key(fragment_sort_key);

            prev_output_dep_id = None;
            for fragment in ordered_fragments.iter() {
                let output_dep_id = next_dependency_id();
                let input_dep_id = prev_output_dep_id;
                prev_output_dep_id = Some(output_dep_id);

                let touched = frag_partitions.get(&fragment.id).cloned().unwrap_or_default();
                let is_local_fragment =
                    touched.len() == 1 && touched.contains(&base_partition);
                let params = Arc::new(params.clone());

                let mut partitions: Vec<PartitionId> = touched.into_iter().collect();
                partitions.sort_unstable();
                for partition in partitions {
                    let vertex = PlanVertex::new(
                        *fragment,
                        partition,
                        stmt_index,
                        input_dep_id,
                        output_dep_id,
                        Arc::clone(&params),
                        is_local_fragment,
                    );
                    graph.add_vertex(vertex)?;
                }
            }
        }

        BatchPlan::finalize(
            base_partition,
            self.initiator_id,
            self.procedure,
            graph,
            stmt_partition_ids,
            readonly,
            all_local,
            all_single_sited,
        )
    }
}

/// Producer-before-consumer order within one statement's fragment chain,
/// ties broken by fragment id. Output-role fragments (the ones that don't
/// consume another fragment's result) sort first.
fn fragment_sort_key(fragment: &PlanFragment) -> (u8, FragmentId) {
    use shardstore_common::catalog::FragmentRole;
    let role_rank = match fragment.role {
        FragmentRole::Output => 0,
        FragmentRole::Input => 1,
    };
    (role_rank, fragment.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use shardstore_common::catalog::FragmentRole;
    use shardstore_common::param::Value;
    use std::sync::Mutex;

    /// A scripted partition estimator: returns partitions for each
    /// `(fragment id, param value)` pair set up by the test.
    struct ScriptedEstimator {
        script: Mutex<HashMap<(FragmentId, i64), HashSet<PartitionId>>>,
    }

    impl ScriptedEstimator {
        fn new(entries: Vec<((FragmentId, i64), Vec<PartitionId>)>) -> Self {
            let mut script = HashMap::new();
            for (key, partitions) in entries {
                script.insert(key, partitions.into_iter().collect());
            }
            Self {
                script: Mutex::new(script),
            }
        }
    }

    impl PartitionEstimator for ScriptedEstimator {
        fn get_all_fragment_partitions(
            &self,
            frag_partitions: &mut HashMap<FragmentId, HashSet<PartitionId>>,
            all_partitions: &mut HashSet<PartitionId>,
            fragments: &[PlanFragment],
            params: &ParameterSet,
            _base_partition: PartitionId,
        ) -> anyhow::Result<()> {
            frag_partitions.clear();
            all_partitions.clear();
            let key_param = match params.values().first() {
                Some(Value::Int(v)) => *v,
                _ => 0,
            };
            let script = self.script.lock().unwrap();
            for fragment in fragments {
                let partitions = script
                    .get(&(fragment.id, key_param))
                    .cloned()
                    .unwrap_or_default();
                all_partitions.extend(partitions.iter().copied());
                frag_partitions.insert(fragment.id, partitions);
            }
            Ok(())
        }
    }

    fn single_stmt(id: i32, fragment_id: FragmentId) -> Statement {
        Statement::new(
            id,
            true,
            true,
            vec![PlanFragment::new(fragment_id, id, FragmentRole::Output)],
            vec![PlanFragment::new(fragment_id, id, FragmentRole::Output)],
        )
    }

    #[test]
    fn single_partition_single_statement_plan() {
        // S1: one read hashing to partition 2, base=2, predict_sp=true.
        let stmt = Arc::new(single_stmt(0, 10));
        let estimator = ScriptedEstimator::new(vec![((10, 7), vec![2])]);
        let planner = BatchPlanner::new(
            vec![stmt],
            ProcedureKind::UserProc,
            estimator,
            1,
            Arc::new(AtomicTxnIdSource::default()),
        );

        let plan = planner
            .plan(vec![ParameterSet::new(vec![Value::Int(7)])], 2, true)
            .unwrap();

        assert!(plan.is_local());
        assert!(plan.is_single_sited());
        assert!(plan.is_read_only());

        let messages = plan.fragment_task_messages(999, 1).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].target_partition, 2);
        assert!(messages[0].final_task);
    }

    #[test]
    fn mispredicted_single_partition_statement_fails() {
        // S2: same statement, key hashes to partition 5, base=2, predict_sp=true.
        let stmt = Arc::new(single_stmt(0, 10));
        let estimator = ScriptedEstimator::new(vec![((10, 7), vec![2, 5])]);
        let planner = BatchPlanner::new(
            vec![stmt],
            ProcedureKind::UserProc,
            estimator,
            1,
            Arc::new(AtomicTxnIdSource::default()),
        );

        let result = planner.plan(vec![ParameterSet::new(vec![Value::Int(7)])], 2, true);
        assert!(matches!(result, Err(PlanningError::Mispredict { .. })));
    }

    #[test]
    fn mispredict_is_avoided_when_not_predicted_single_partition() {
        let stmt = Arc::new(single_stmt(0, 10));
        let estimator = ScriptedEstimator::new(vec![((10, 7), vec![2, 5])]);
        let planner = BatchPlanner::new(
            vec![stmt],
            ProcedureKind::UserProc,
            estimator,
            1,
            Arc::new(AtomicTxnIdSource::default()),
        );

        let plan = planner
            .plan(vec![ParameterSet::new(vec![Value::Int(7)])], 2, false)
            .unwrap();
        assert!(!plan.is_local());
        assert!(!plan.is_single_sited());
    }

    #[test]
    fn multi_round_dependency_plan() {
        // S3: two statements, the second consuming the first's output.
        // base=0, leaf fragments spread across {0,1,2}, aggregator at {0}.
        let leaf = Arc::new(Statement::new(
            0,
            true,
            false,
            vec![],
            vec![PlanFragment::new(100, 0, FragmentRole::Output)],
        ));
        let aggregator = Arc::new(Statement::new(
            1,
            true,
            false,
            vec![],
            vec![PlanFragment::new(200, 1, FragmentRole::Input)],
        ));

        let estimator = ScriptedEstimator::new(vec![
            ((100, 0), vec![0, 1, 2]),
            ((200, 0), vec![0]),
        ]);
        let planner = BatchPlanner::new(
            vec![leaf, aggregator],
            ProcedureKind::UserProc,
            estimator,
            1,
            Arc::new(AtomicTxnIdSource::default()),
        );

        let plan = planner
            .plan(
                vec![
                    ParameterSet::new(vec![Value::Int(0)]),
                    ParameterSet::new(vec![Value::Int(0)]),
                ],
                0,
                false,
            )
            .unwrap();

        assert!(!plan.is_local());
        assert!(!plan.is_single_sited());

        let messages = plan.fragment_task_messages(1, 1).unwrap();
        // round 0: leaf fragment on partitions {0,1,2} -> 3 messages
        // round 1: aggregator on partition {0} -> 1 message
        assert_eq!(messages.len(), 4);

        let round0: Vec<_> = messages.iter().filter(|m| !m.final_task).collect();
        let round1: Vec<_> = messages.iter().filter(|m| m.final_task).collect();
        assert_eq!(round0.len(), 3);
        assert_eq!(round1.len(), 1);
        assert_eq!(
            round0.iter().map(|m| m.target_partition).sorted().collect_vec(),
            vec![0, 1, 2]
        );

        let leaf_output_id = round0[0].output_dep_ids[0];
        assert!(round0
            .iter()
            .all(|m| m.output_dep_ids[0] == leaf_output_id));
        assert_eq!(round1[0].input_dep_ids[0], leaf_output_id);
    }
}
