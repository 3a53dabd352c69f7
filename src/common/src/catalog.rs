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

//! Immutable, catalog-owned entities. These are produced by the out-of-scope
//! SQL compiler/optimizer and handed to the planner as shared read-only
//! handles; nothing in this workspace mutates them.

use crate::StatementId;

/// A compiled piece of a statement's execution plan, runnable on a single
/// partition.
pub type FragmentId = i64;

/// Whether a fragment produces the final rows of a statement or feeds an
/// intermediate result to another fragment in the same statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentRole {
    /// Consumes the output of a prior fragment in the same statement.
    Input,
    /// Produces a result that is either the statement's final output or an
    /// input to a later fragment.
    Output,
}

/// A single compiled fragment of a statement's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanFragment {
    pub id: FragmentId,
    pub statement_id: StatementId,
    pub role: FragmentRole,
}

impl PlanFragment {
    pub fn new(id: FragmentId, statement_id: StatementId, role: FragmentRole) -> Self {
        Self {
            id,
            statement_id,
            role,
        }
    }
}

/// A prepared SQL statement as stored in the catalog. Immutable for the
/// lifetime of the process; shared across every batch that invokes it.
#[derive(Debug, Clone)]
pub struct Statement {
    pub id: StatementId,
    pub readonly: bool,
    pub has_single_partition_plan: bool,
    pub single_partition_fragments: Vec<PlanFragment>,
    pub multi_partition_fragments: Vec<PlanFragment>,
}

impl Statement {
    pub fn new(
        id: StatementId,
        readonly: bool,
        has_single_partition_plan: bool,
        single_partition_fragments: Vec<PlanFragment>,
        multi_partition_fragments: Vec<PlanFragment>,
    ) -> Self {
        Self {
            id,
            readonly,
            has_single_partition_plan,
            single_partition_fragments,
            multi_partition_fragments,
        }
    }

    /// The fragment set to plan with, given the current single/multi-sited
    /// hypothesis for this statement.
    pub fn fragments_for(&self, is_single: bool) -> &[PlanFragment] {
        if is_single {
            &self.single_partition_fragments
        } else {
            &self.multi_partition_fragments
        }
    }
}
