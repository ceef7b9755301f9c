//! Update functions keeping filtered todo lists consistent

use anyhow::anyhow;
use serde_json::Value;
use wm_core::{MutationQueryMap, UpdateContext, Variables};

pub const SHOW_ALL: &str = "SHOW_ALL";
pub const SHOW_COMPLETED: &str = "SHOW_COMPLETED";
pub const SHOW_ACTIVE: &str = "SHOW_ACTIVE";

/// Whether `todo` belongs in a list fetched with `filter`
pub fn should_include(todo: &Value, filter: Option<&str>) -> bool {
    let completed = todo.get("completed").and_then(Value::as_bool).unwrap_or(false);
    match filter {
        Some(SHOW_COMPLETED) => completed,
        Some(SHOW_ACTIVE) => !completed,
        _ => true,
    }
}

/// New contents for a cached list after `updated` changed, or `None` when
/// the list is already right
pub fn apply_filtering(updated: &Value, todos: &[Value], variables: &Variables) -> Option<Vec<Value>> {
    let id = updated.get("id");
    let listed = todos.iter().any(|todo| todo.get("id") == id);
    let filter = variables.get("filter").and_then(Value::as_str);
    let belongs = should_include(updated, filter);

    match (listed, belongs) {
        (true, false) => Some(
            todos
                .iter()
                .filter(|todo| todo.get("id") != id)
                .cloned()
                .collect(),
        ),
        (false, true) => {
            let mut merged = Vec::with_capacity(todos.len() + 1);
            merged.push(updated.clone());
            merged.extend(todos.iter().cloned());
            Some(merged)
        }
        // still listed: replace the stale copy unless it already matches
        (true, true) if !todos.contains(updated) => Some(
            todos
                .iter()
                .map(|todo| if todo.get("id") == id { updated.clone() } else { todo.clone() })
                .collect(),
        ),
        _ => None,
    }
}

/// Update function merging the todo found under `field` of the mutation
/// result into a cached `GetTodos` result
fn merge_todo(
    field: &'static str,
) -> impl Fn(&UpdateContext<'_>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static {
    move |ctx: &UpdateContext<'_>| {
        let updated = ctx
            .mutation
            .result
            .data
            .as_ref()
            .and_then(|data| data.get(field))
            .ok_or_else(|| anyhow!("mutation result carries no '{}'", field))?;
        let todos = ctx
            .query
            .result
            .get("todos")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("cached {} result carries no todo list", ctx.query.name))?;

        Ok(apply_filtering(updated, todos, ctx.query.variables).map(|todos| {
            let mut result = ctx.query.result.clone();
            result["todos"] = Value::Array(todos);
            result
        }))
    }
}

/// The mutations the todo client watches
pub fn todo_mutations() -> MutationQueryMap {
    MutationQueryMap::new()
        .watch("AddTodo", "GetTodos", merge_todo("addTodo"))
        .watch("ToggleTodo", "GetTodos", merge_todo("toggleTodo"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wm_core::{ExecutionResult, MutationInfo, MutationRegistry, QueryInfo};

    fn filter(name: &str) -> Variables {
        let mut variables = Variables::new();
        variables.insert("filter".into(), json!(name));
        variables
    }

    fn todo(id: u64, completed: bool) -> Value {
        json!({ "id": id, "text": format!("todo {}", id), "completed": completed })
    }

    #[test]
    fn test_should_include() {
        assert!(should_include(&todo(0, true), Some(SHOW_ALL)));
        assert!(should_include(&todo(0, true), None));
        assert!(should_include(&todo(0, true), Some(SHOW_COMPLETED)));
        assert!(!should_include(&todo(0, false), Some(SHOW_COMPLETED)));
        assert!(!should_include(&todo(0, true), Some(SHOW_ACTIVE)));
    }

    #[test]
    fn test_new_visible_todo_is_prepended() {
        let list = vec![todo(0, true), todo(1, false)];
        let merged = apply_filtering(&todo(2, false), &list, &filter(SHOW_ALL)).unwrap();
        assert_eq!(merged, vec![todo(2, false), todo(0, true), todo(1, false)]);
    }

    #[test]
    fn test_toggled_todo_leaves_active_list() {
        let list = vec![todo(0, false), todo(1, false)];
        let merged = apply_filtering(&todo(1, true), &list, &filter(SHOW_ACTIVE)).unwrap();
        assert_eq!(merged, vec![todo(0, false)]);
    }

    #[test]
    fn test_listed_todo_is_replaced_in_place() {
        let list = vec![todo(0, false), todo(1, false)];
        let merged = apply_filtering(&todo(0, true), &list, &filter(SHOW_ALL)).unwrap();
        assert_eq!(merged, vec![todo(0, true), todo(1, false)]);
    }

    #[test]
    fn test_unchanged_list_needs_no_write() {
        let list = vec![todo(0, false)];
        assert_eq!(apply_filtering(&todo(0, false), &list, &filter(SHOW_ALL)), None);
        assert_eq!(apply_filtering(&todo(3, true), &list, &filter(SHOW_ACTIVE)), None);
    }

    #[test]
    fn test_merge_keeps_other_fields() {
        let registry = MutationRegistry::new(todo_mutations()).unwrap();
        let update = registry.update_fn("ToggleTodo", "GetTodos");

        let result = ExecutionResult::data(json!({ "toggleTodo": todo(0, true) }));
        let cached = json!({ "todos": [], "__typename": "Query" });
        let variables = filter(SHOW_COMPLETED);
        let mutation_variables = Variables::new();
        let ctx = UpdateContext {
            mutation: MutationInfo {
                name: "ToggleTodo",
                variables: &mutation_variables,
                result: &result,
            },
            query: QueryInfo {
                name: "GetTodos",
                variables: &variables,
                result: &cached,
            },
        };

        assert_eq!(
            update(&ctx).unwrap(),
            Some(json!({ "todos": [todo(0, true)], "__typename": "Query" }))
        );
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let registry = MutationRegistry::new(todo_mutations()).unwrap();
        let update = registry.update_fn("AddTodo", "GetTodos");

        let result = ExecutionResult::data(json!({ "somethingElse": 1 }));
        let cached = json!({ "todos": [] });
        let variables = Variables::new();
        let ctx = UpdateContext {
            mutation: MutationInfo { name: "AddTodo", variables: &variables, result: &result },
            query: QueryInfo { name: "GetTodos", variables: &variables, result: &cached },
        };

        assert!(update(&ctx).is_err());
    }
}
