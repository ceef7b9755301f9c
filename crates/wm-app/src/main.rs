//! Todo client demonstrating watched mutations against an in-process server
//!
//! Usage: `todo-sync [settings.json]`, where the settings file holds e.g.
//! `{ "debug": true, "readOnly": false }`. Log verbosity follows `RUST_LOG`.

use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wm_core::events::{listener_from_fn, names};
use wm_core::{Document, Operation, SyncEvent};
use wm_data::MemoryCache;
use wm_link::{LinkSettings, SyncOptions, WatchedMutationLink};

mod client;
mod filtering;
mod server;

use client::{get_todos, TodoClient};
use filtering::{todo_mutations, SHOW_ACTIVE, SHOW_ALL, SHOW_COMPLETED};
use server::TodoServer;

const LATENCY: Duration = Duration::from_millis(200);

fn load_settings() -> Result<LinkSettings> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading settings from {}", path))?;
            Ok(LinkSettings::from_json_str(&json)?)
        }
        None => Ok(LinkSettings::default()),
    }
}

fn log_lists(client: &TodoClient, stage: &str) -> Result<()> {
    for filter in [SHOW_ALL, SHOW_ACTIVE, SHOW_COMPLETED] {
        let texts: Vec<String> = client
            .cached_todos(filter)?
            .iter()
            .map(|todo| {
                let done = todo["completed"].as_bool().unwrap_or(false);
                format!("[{}] {}", if done { "x" } else { " " }, todo["text"].as_str().unwrap_or(""))
            })
            .collect();
        info!(stage, filter, todos = ?texts, "Cached list");
    }
    Ok(())
}

fn add_todo(text: &str) -> Operation {
    Operation::new(Document::mutation("AddTodo")).with_variables(json!({ "text": text }))
}

fn toggle_todo(todo: &Value) -> Operation {
    let mut predicted = todo.clone();
    predicted["completed"] = json!(!todo["completed"].as_bool().unwrap_or(false));
    Operation::new(Document::mutation("ToggleTodo"))
        .with_variables(json!({ "id": todo["id"] }))
        .with_optimistic_response(json!({ "toggleTodo": predicted }))
}

/// Start `operation`, log the lists while it is in flight, then once it settles
async fn mutate_watching(client: &TodoClient, operation: Operation, stage: &str) -> Result<()> {
    let in_flight = {
        let client = client.clone();
        tokio::spawn(async move { client.mutate(operation).await })
    };
    tokio::time::sleep(LATENCY / 2).await;
    log_lists(client, &format!("{} (in flight)", stage))?;

    let result = in_flight.await??;
    if !result.is_successful() {
        warn!(stage, errors = ?result.errors, "Mutation failed");
    }
    log_lists(client, stage)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings()?;
    info!(debug = settings.debug, read_only = settings.read_only, "Starting todo-sync");

    let cache = Arc::new(MemoryCache::new());
    let server = Arc::new(TodoServer::new(LATENCY));
    let watched = WatchedMutationLink::new(
        SyncOptions::new()
            .with_cache(cache.clone())
            .with_map(todo_mutations())
            .with_settings(settings),
    )?;

    for event in [names::OPTIMISTIC_CACHE_UPDATE, names::CACHE_UPDATE, names::OPTIMISTIC_CACHE_REVERT] {
        watched.on(
            event,
            listener_from_fn(|sync: &SyncEvent, name: &str| {
                info!(event = name, mutation = %sync.mutation, keys = sync.keys.len(), "Cache synchronized");
            }),
        );
    }

    let client = TodoClient::new(watched, server.clone(), cache);

    for filter in [SHOW_ALL, SHOW_ACTIVE, SHOW_COMPLETED] {
        client.query(get_todos(filter)).await?;
    }
    log_lists(&client, "fetched")?;

    client.mutate(add_todo("Walk the dog")).await?;
    log_lists(&client, "added")?;

    let groceries = client
        .cached_todos(SHOW_ALL)?
        .into_iter()
        .find(|todo| todo["text"] == "Get groceries")
        .context("groceries missing from the cached list")?;
    mutate_watching(&client, toggle_todo(&groceries), "toggled").await?;

    server.fail_next_mutation();
    let doomed = add_todo("Learn to fly")
        .with_optimistic_response(json!({ "addTodo": { "id": 99, "text": "Learn to fly", "completed": false } }));
    mutate_watching(&client, doomed, "reverted").await?;

    Ok(())
}
