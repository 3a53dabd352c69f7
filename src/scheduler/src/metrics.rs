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

//! Scheduler profiling counters: updated whenever `SchedulerConfig::profiling`
//! is set, regardless of whether a scan found a candidate.

use prometheus::core::{AtomicU64, GenericCounter};
use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Histogram, IntGauge, Registry,
};

pub struct SchedulerMetrics {
    pub registry: Registry,
    /// Number of `can_execute` calls made across all scans.
    pub comparisons: GenericCounter<AtomicU64>,
    /// Number of scans that returned a candidate.
    pub successes: GenericCounter<AtomicU64>,
    /// Current length of the work queue, sampled at the start of each scan.
    pub queue_size: IntGauge,
    /// Wall-clock time spent inside one call to `next`.
    pub scan_time_seconds: Histogram,
}

impl SchedulerMetrics {
    pub fn new(registry: Registry) -> Self {
        let comparisons = register_int_counter_with_registry!(
            "spec_exec_comparisons_total",
            "number of conflict-checker comparisons made while scanning for a speculative candidate",
            &registry
        )
        .unwrap();

        let successes = register_int_counter_with_registry!(
            "spec_exec_successes_total",
            "number of scheduler scans that returned a speculative candidate",
            &registry
        )
        .unwrap();

        let queue_size = register_int_gauge_with_registry!(
            "spec_exec_queue_size",
            "length of the work queue at the start of the most recent scan",
            &registry
        )
        .unwrap();

        let scan_time_seconds = register_histogram_with_registry!(
            "spec_exec_scan_time_seconds",
            "wall-clock time spent inside one scheduler scan",
            &registry,
        )
        .unwrap();

        Self {
            registry,
            comparisons,
            successes,
            queue_size,
            scan_time_seconds,
        }
    }

    /// Create a `SchedulerMetrics` instance backed by a private registry,
    /// for tests or standalone use.
    pub fn for_test() -> Self {
        Self::new(Registry::new())
    }
}
