//! In-process todo server reached through a [`Transport`]

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use wm_core::{ExecutionResult, Operation};
use wm_link::Transport;

use crate::filtering::should_include;

#[derive(Debug, Clone, Serialize)]
pub struct Todo {
    pub id: u64,
    pub text: String,
    pub completed: bool,
}

/// Holds the todo list and answers `GetTodos`, `AddTodo` and `ToggleTodo`
pub struct TodoServer {
    todos: RwLock<Vec<Todo>>,
    latency: Duration,
    fail_next: AtomicBool,
}

impl TodoServer {
    pub fn new(latency: Duration) -> Self {
        let todos = vec![
            Todo { id: 0, text: "Go to the gym".into(), completed: true },
            Todo { id: 1, text: "Get groceries".into(), completed: false },
        ];
        Self {
            todos: RwLock::new(todos),
            latency,
            fail_next: AtomicBool::new(false),
        }
    }

    /// Make the next mutation come back with an error
    pub fn fail_next_mutation(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn todos(&self, filter: Option<&str>) -> anyhow::Result<Value> {
        let visible: Vec<Value> = self
            .todos
            .read()
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|todo| should_include(todo, filter))
            .collect();
        Ok(json!({ "todos": visible }))
    }

    fn add_todo(&self, text: &str) -> anyhow::Result<Value> {
        let mut todos = self.todos.write();
        let todo = Todo {
            id: todos.len() as u64,
            text: text.to_string(),
            completed: false,
        };
        todos.push(todo.clone());
        Ok(json!({ "addTodo": serde_json::to_value(todo)? }))
    }

    fn toggle_todo(&self, id: u64) -> Option<Value> {
        let mut todos = self.todos.write();
        let todo = todos.iter_mut().find(|todo| todo.id == id)?;
        todo.completed = !todo.completed;
        serde_json::to_value(&*todo)
            .ok()
            .map(|todo| json!({ "toggleTodo": todo }))
    }
}

#[async_trait]
impl Transport for TodoServer {
    async fn send(&self, operation: Operation) -> anyhow::Result<ExecutionResult> {
        tokio::time::sleep(self.latency).await;
        debug!(operation = operation.name(), "Server received operation");

        let variables = &operation.variables;
        let result = match operation.name() {
            "GetTodos" => {
                let filter = variables.get("filter").and_then(Value::as_str);
                ExecutionResult::data(self.todos(filter)?)
            }
            "AddTodo" | "ToggleTodo" if self.fail_next.swap(false, Ordering::SeqCst) => {
                ExecutionResult::error("Internal server error")
            }
            "AddTodo" => match variables.get("text").and_then(Value::as_str) {
                Some(text) => ExecutionResult::data(self.add_todo(text)?),
                None => ExecutionResult::error("Variable \"$text\" of required type \"String!\" was not provided."),
            },
            "ToggleTodo" => match variables.get("id").and_then(Value::as_u64) {
                Some(id) => match self.toggle_todo(id) {
                    Some(data) => ExecutionResult::data(data),
                    None => ExecutionResult::error(format!("No todo with id {}", id)),
                },
                None => ExecutionResult::error("Variable \"$id\" of required type \"Int!\" was not provided."),
            },
            other => ExecutionResult::error(format!("Cannot query field \"{}\"", other)),
        };
        Ok(result)
    }
}
