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

//! A free-list pool for the scratch `Vec<PlanFragment>` the planner borrows
//! while resolving one statement. Borrow/return uses internal
//! synchronization so the pool can be shared across planner
//! instances/worker threads, favoring explicit reuse over per-call
//! allocation on hot paths.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::catalog::PlanFragment;

#[derive(Default)]
struct Inner {
    free: Mutex<Vec<Vec<PlanFragment>>>,
}

/// Shared pool of scratch fragment lists.
#[derive(Clone, Default)]
pub struct FragmentListPool {
    inner: Arc<Inner>,
}

impl FragmentListPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a scratch list, clearing any leftover contents from a prior
    /// use. Returned to the pool when the guard is dropped, on every exit
    /// path including unwinding.
    pub fn acquire(&self) -> PooledFragmentList {
        let mut list = self.inner.free.lock().pop().unwrap_or_else(|| {
            tracing::debug!("fragment list pool exhausted, allocating a new scratch list");
            Vec::new()
        });
        list.clear();
        PooledFragmentList {
            inner: Arc::clone(&self.inner),
            list: Some(list),
        }
    }

    /// Number of scratch lists currently idle in the pool. Test/diagnostic
    /// use only.
    pub fn idle_count(&self) -> usize {
        self.inner.free.lock().len()
    }
}

/// An RAII handle to a borrowed scratch list; releases it back to the pool
/// on drop.
pub struct PooledFragmentList {
    inner: Arc<Inner>,
    list: Option<Vec<PlanFragment>>,
}

impl Deref for PooledFragmentList {
    type Target = Vec<PlanFragment>;

    fn deref(&self) -> &Self::Target {
        self.list.as_ref().expect("list taken before drop")
    }
}

impl DerefMut for PooledFragmentList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.list.as_mut().expect("list taken before drop")
    }
}

impl Drop for PooledFragmentList {
    fn drop(&mut self) {
        if let Some(list) = self.list.take() {
            self.inner.free.lock().push(list);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FragmentRole;

    #[test]
    fn borrowed_list_is_returned_on_drop() {
        let pool = FragmentListPool::new();
        assert_eq!(pool.idle_count(), 0);
        {
            let mut list = pool.acquire();
            list.push(PlanFragment::new(1, 1, FragmentRole::Output));
            assert_eq!(pool.idle_count(), 0);
        }
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn reused_list_comes_back_cleared() {
        let pool = FragmentListPool::new();
        {
            let mut list = pool.acquire();
            list.push(PlanFragment::new(1, 1, FragmentRole::Output));
        }
        let list = pool.acquire();
        assert!(list.is_empty());
    }
}
