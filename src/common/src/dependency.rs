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

//! The process-wide dependency id counter.
//!
//! Dependency ids link a fragment producing an intermediate result to the
//! fragment(s) consuming it. They must be globally unique across the
//! process, so the counter is a single atomic shared by every
//! [`crate::catalog`] consumer, not per-planner state.

use std::sync::atomic::{AtomicI32, Ordering};

/// A synthetic identifier linking a producer fragment's output to a
/// consumer fragment's input.
pub type DependencyId = i32;

/// Sentinel carried on the wire for "no input dependency" (leaf fragments).
pub const NULL_DEPENDENCY_ID: DependencyId = -1;

/// Ids below this floor are reserved; real dependency ids start here.
const DEPENDENCY_ID_FLOOR: DependencyId = 1000;

static NEXT_DEPENDENCY_ID: AtomicI32 = AtomicI32::new(DEPENDENCY_ID_FLOOR);

/// Allocate the next globally unique dependency id. Monotonically
/// increasing for the lifetime of the process; never reused.
pub fn next_dependency_id() -> DependencyId {
    NEXT_DEPENDENCY_ID.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_above_floor() {
        let a = next_dependency_id();
        let b = next_dependency_id();
        let c = next_dependency_id();
        assert!(a >= DEPENDENCY_ID_FLOOR);
        assert!(b > a);
        assert!(c > b);
    }
}
