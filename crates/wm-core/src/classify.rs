//! Helpers for classifying operations and their results

use crate::operation::{Document, OperationContext, OperationKind};
use crate::result::ExecutionResult;

pub fn is_query(kind: OperationKind) -> bool {
    kind == OperationKind::Query
}

pub fn is_mutation(kind: OperationKind) -> bool {
    kind == OperationKind::Mutation
}

pub fn is_successful(result: &ExecutionResult) -> bool {
    result.is_successful()
}

pub fn is_successful_query(kind: OperationKind, result: &ExecutionResult) -> bool {
    is_query(kind) && is_successful(result)
}

pub fn is_successful_mutation(kind: OperationKind, result: &ExecutionResult) -> bool {
    is_mutation(kind) && is_successful(result)
}

pub fn is_failed_mutation(kind: OperationKind, result: &ExecutionResult) -> bool {
    is_mutation(kind) && !is_successful(result)
}

pub fn is_optimistic(context: &OperationContext) -> bool {
    context.is_optimistic()
}

/// Declared name of the document's operation, `""` when anonymous
pub fn operation_name(document: &Document) -> &str {
    document.name()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_and_mutation_classification() {
        let ok = ExecutionResult::data(json!({}));
        let failed = ExecutionResult::error("boom");

        assert!(is_successful_query(OperationKind::Query, &ok));
        assert!(!is_successful_query(OperationKind::Query, &failed));
        assert!(!is_successful_query(OperationKind::Mutation, &ok));

        assert!(is_successful_mutation(OperationKind::Mutation, &ok));
        assert!(is_failed_mutation(OperationKind::Mutation, &failed));
        assert!(!is_failed_mutation(OperationKind::Subscription, &failed));
    }

    #[test]
    fn test_optimistic_context() {
        let mut context = OperationContext::default();
        assert!(!is_optimistic(&context));
        context.optimistic_response = Some(json!({ "addTodo": { "id": 3 } }));
        assert!(is_optimistic(&context));
    }

    #[test]
    fn test_null_prediction_is_not_optimistic() {
        let context = OperationContext {
            optimistic_response: Some(serde_json::Value::Null),
            ..Default::default()
        };
        assert!(!is_optimistic(&context));
    }
}
