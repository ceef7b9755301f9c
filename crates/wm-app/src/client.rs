//! Minimal client: runs operations through the link chain and stores
//! successful query results in the cache

use std::sync::Arc;
use anyhow::{anyhow, bail, Result};
use futures::StreamExt;
use serde_json::{json, Value};
use wm_core::{Document, ExecutionResult, Operation};
use wm_data::{CacheStore, MemoryCache};
use wm_link::{execute, Link, LinkChain, TransportLink, WatchedMutationLink};

use crate::server::TodoServer;

#[derive(Clone)]
pub struct TodoClient {
    chain: LinkChain,
    cache: Arc<MemoryCache>,
}

pub fn get_todos(filter: &str) -> Operation {
    Operation::new(Document::query("GetTodos")).with_variables(json!({ "filter": filter }))
}

impl TodoClient {
    pub fn new(watched: WatchedMutationLink, server: Arc<TodoServer>, cache: Arc<MemoryCache>) -> Self {
        let links: Vec<Arc<dyn Link>> = vec![Arc::new(watched), Arc::new(TransportLink::new(server))];
        Self {
            chain: LinkChain::new(links),
            cache,
        }
    }

    /// Run `operation` and return its first result; error-channel items fail the call
    async fn run(&self, operation: Operation) -> Result<ExecutionResult> {
        let name = operation.name().to_string();
        let mut outcomes = execute(&self.chain, operation);
        let mut first = None;
        while let Some(outcome) = outcomes.next().await {
            let result = outcome?;
            first.get_or_insert(result);
        }
        first.ok_or_else(|| anyhow!("{} produced no result", name))
    }

    pub async fn query(&self, operation: Operation) -> Result<Value> {
        let key = operation.cache_key();
        let result = self.run(operation).await?;
        if !result.is_successful() {
            bail!("query failed: {:?}", result.errors);
        }
        let data = result.data.unwrap_or(Value::Null);
        self.cache.write_query(&key, data.clone())?;
        Ok(data)
    }

    pub async fn mutate(&self, operation: Operation) -> Result<ExecutionResult> {
        self.run(operation).await
    }

    /// The cached list for `filter`, empty when nothing is cached
    pub fn cached_todos(&self, filter: &str) -> Result<Vec<Value>> {
        let cached = self.cache.read_query(&get_todos(filter).cache_key())?;
        Ok(cached
            .as_ref()
            .and_then(|data| data.get("todos"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wm_link::SyncOptions;

    use crate::filtering::{todo_mutations, SHOW_ACTIVE, SHOW_ALL, SHOW_COMPLETED};

    fn client() -> TodoClient {
        let cache = Arc::new(MemoryCache::new());
        let watched = WatchedMutationLink::new(
            SyncOptions::new().with_cache(cache.clone()).with_map(todo_mutations()),
        )
        .unwrap();
        TodoClient::new(watched, Arc::new(TodoServer::new(Duration::ZERO)), cache)
    }

    fn ids(todos: &[Value]) -> Vec<u64> {
        todos.iter().filter_map(|todo| todo["id"].as_u64()).collect()
    }

    #[tokio::test]
    async fn test_toggle_keeps_every_list_consistent() {
        let client = client();
        for filter in [SHOW_ALL, SHOW_ACTIVE, SHOW_COMPLETED] {
            client.query(get_todos(filter)).await.unwrap();
        }

        let toggle = Operation::new(Document::mutation("ToggleTodo"))
            .with_variables(json!({ "id": 1 }))
            .with_optimistic_response(json!({
                "toggleTodo": { "id": 1, "text": "Get groceries", "completed": true }
            }));
        assert!(client.mutate(toggle).await.unwrap().is_successful());

        let all = client.cached_todos(SHOW_ALL).unwrap();
        let groceries = all.iter().find(|todo| todo["id"] == 1).unwrap();
        assert_eq!(groceries["completed"], json!(true));
        assert_eq!(ids(&client.cached_todos(SHOW_COMPLETED).unwrap()), vec![1, 0]);
        assert!(client.cached_todos(SHOW_ACTIVE).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_added_todo_appears_in_matching_lists() {
        let client = client();
        for filter in [SHOW_ALL, SHOW_COMPLETED] {
            client.query(get_todos(filter)).await.unwrap();
        }

        let add = Operation::new(Document::mutation("AddTodo")).with_variables(json!({ "text": "Walk" }));
        client.mutate(add).await.unwrap();

        assert_eq!(ids(&client.cached_todos(SHOW_ALL).unwrap()), vec![2, 0, 1]);
        assert_eq!(ids(&client.cached_todos(SHOW_COMPLETED).unwrap()), vec![0]);
    }
}
