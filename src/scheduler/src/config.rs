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

//! The scheduler's tunables: which policy orders the scan, how far
//! SHORTEST/LONGEST look before giving up, and the `ignore_all_local`
//! short-circuit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which candidate a scan prefers once it has passed the conflict check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingPolicy {
    /// Take the first non-conflicting candidate; no ordering among them.
    First,
    /// Among up to `window_size` non-conflicting candidates, prefer the one
    /// with the smallest estimated remaining execution time.
    Shortest,
    /// Same window, but prefer the largest estimated remaining time.
    Longest,
}

impl fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchedulingPolicy::First => "first",
            SchedulingPolicy::Shortest => "shortest",
            SchedulingPolicy::Longest => "longest",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
#[error("unknown scheduling policy {0:?}; expected one of first, shortest, longest")]
pub struct ParsePolicyError(String);

impl FromStr for SchedulingPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(SchedulingPolicy::First),
            "shortest" => Ok(SchedulingPolicy::Shortest),
            "longest" => Ok(SchedulingPolicy::Longest),
            _ => Err(ParsePolicyError(s.to_owned())),
        }
    }
}

#[derive(Debug, Error)]
#[error("window_size must be at least 1, got {0}")]
pub struct InvalidWindowSize(usize);

/// Scheduler configuration. Deserializable from the engine's usual config
/// file so a partition's policy can be tuned without a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub policy: SchedulingPolicy,
    /// For SHORTEST/LONGEST, the maximum number of non-conflicting
    /// candidates examined before the scan gives up and returns the best
    /// one seen so far. Ignored by FIRST.
    window_size: usize,
    /// Short-circuit `next` to `None` whenever the stalled transaction is
    /// itself local and predicted to touch only the local partition: such a
    /// transaction finishes quickly enough that speculating underneath it
    /// rarely pays off.
    pub ignore_all_local: bool,
    /// Whether `SchedulerMetrics` counters are updated. Disabling this
    /// avoids the small bookkeeping cost on partitions that don't export
    /// metrics.
    pub profiling: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            policy: SchedulingPolicy::First,
            window_size: 10,
            ignore_all_local: false,
            profiling: true,
        }
    }
}

impl SchedulerConfig {
    pub fn new(
        policy: SchedulingPolicy,
        window_size: usize,
        ignore_all_local: bool,
        profiling: bool,
    ) -> Result<Self, InvalidWindowSize> {
        if window_size == 0 {
            return Err(InvalidWindowSize(window_size));
        }
        Ok(Self {
            policy,
            window_size,
            ignore_all_local,
            profiling,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!(
            "Shortest".parse::<SchedulingPolicy>().unwrap(),
            SchedulingPolicy::Shortest
        );
        assert!("bogus".parse::<SchedulingPolicy>().is_err());
    }

    #[test]
    fn rejects_zero_window_size() {
        assert!(SchedulerConfig::new(SchedulingPolicy::Shortest, 0, false, true).is_err());
    }

    #[test]
    fn default_policy_is_first() {
        assert_eq!(SchedulerConfig::default().policy, SchedulingPolicy::First);
    }
}
