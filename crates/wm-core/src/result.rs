//! Results observed flowing back up the pipeline

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An error reported by the server alongside (or instead of) data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub message: String,
}

impl ResponseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One result for an executed operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ResponseError>,
}

impl ExecutionResult {
    /// A successful result carrying `data`
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// A failed result with a single error message and no data
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: vec![ResponseError::new(message)],
        }
    }

    /// A result is successful when no errors were reported
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_success() {
        assert!(ExecutionResult::data(json!({ "todos": [] })).is_successful());
        assert!(!ExecutionResult::error("Everything went wrong").is_successful());
    }

    #[test]
    fn test_result_from_wire() {
        let result: ExecutionResult = serde_json::from_value(json!({
            "data": null,
            "errors": [{ "message": "Oops forgot to implement" }]
        }))
        .unwrap();
        assert!(result.data.is_none());
        assert_eq!(result.errors[0].message, "Oops forgot to implement");

        let ok: ExecutionResult = serde_json::from_value(json!({ "data": { "saveTodo": { "id": "1" } } })).unwrap();
        assert!(ok.is_successful());
    }
}
