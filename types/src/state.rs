//! Key/value carrier for moving a failure across a serialization boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Generic serialized state of an error: a flat JSON object.
///
/// Writers put at least [`MESSAGE_KEY`](Self::MESSAGE_KEY) in it. Readers look up
/// the keys they know and ignore the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureState(Map<String, Value>);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("missing field `{field}`")]
    MissingField { field: &'static str },
    #[error("field `{field}` must be a {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("expected kind `assertion_failure`, found `{found}`")]
    KindMismatch { found: String },
}

impl FailureState {
    pub const KIND_KEY: &'static str = "kind";
    pub const MESSAGE_KEY: &'static str = "message";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, returning the previous value if there was one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub(crate) fn require_str(&self, field: &'static str) -> Result<&str, StateError> {
        self.optional_str(field)?.ok_or(StateError::MissingField { field })
    }

    pub(crate) fn optional_str(&self, field: &'static str) -> Result<Option<&str>, StateError> {
        match self.0.get(field) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(StateError::InvalidField {
                field,
                expected: "string",
            }),
        }
    }
}

impl From<Map<String, Value>> for FailureState {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
