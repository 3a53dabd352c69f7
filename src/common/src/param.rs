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

//! Bound parameter values for one statement invocation.
//!
//! A [`ParameterSet`] is created once per invocation and serialized at most
//! once per [`crate::catalog::FragmentId`]/partition pair when a fragment-task
//! message is assembled.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single bound value. Intentionally small: the planner and scheduler
/// never interpret parameter contents, only serialize/compare them, so this
/// only needs variants with well-defined equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
}

/// The ordered bound values for one statement invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct ParameterSet(Vec<Value>);

#[derive(Error, Debug)]
#[error("failed to {action} parameter set: {source}")]
pub struct SerializationError {
    action: &'static str,
    #[source]
    source: bincode::Error,
}

impl ParameterSet {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Serialize to the length-prefix-free wire payload carried inside a
    /// `FragmentTaskMessage`; the caller is responsible for length-prefixing
    /// it on the wire.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializationError> {
        bincode::serialize(self).map_err(|source| SerializationError {
            action: "serialize",
            source,
        })
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, SerializationError> {
        bincode::deserialize(bytes).map_err(|source| SerializationError {
            action: "deserialize",
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_serialize_deserialize() {
        let p = ParameterSet::new(vec![
            Value::Int(42),
            Value::Text("alice".to_owned()),
            Value::Null,
            Value::Bytes(vec![1, 2, 3]),
            Value::Bool(true),
        ]);
        let bytes = p.serialize().unwrap();
        let back = ParameterSet::deserialize(&bytes).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn empty_parameter_set_round_trips() {
        let p = ParameterSet::default();
        let bytes = p.serialize().unwrap();
        assert_eq!(ParameterSet::deserialize(&bytes).unwrap(), p);
    }

    #[test]
    fn deserialize_rejects_garbage() {
        assert!(ParameterSet::deserialize(&[0xff, 0x00, 0x01]).is_err());
    }
}
