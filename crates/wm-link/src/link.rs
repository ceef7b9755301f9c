//! Ordered chain of request handlers

use std::sync::Arc;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use wm_core::{ExecutionResult, Operation};

use crate::LinkError;

/// Results flowing back up the pipeline; `Err` items are the error channel
pub type ResultStream = BoxStream<'static, Result<ExecutionResult, LinkError>>;

/// Continuation forwarding an operation to the rest of the chain
pub type NextLink = Arc<dyn Fn(Operation) -> ResultStream + Send + Sync>;

/// One handler in the request pipeline
pub trait Link: Send + Sync {
    /// Handle `operation`, optionally delegating to `forward`
    ///
    /// Dropping the returned stream must drop any downstream subscription.
    fn request(&self, operation: Operation, forward: NextLink) -> ResultStream;
}

fn end_of_chain(_: Operation) -> ResultStream {
    stream::empty().boxed()
}

/// Continuation given to the last link of a chain
pub fn terminal() -> NextLink {
    Arc::new(end_of_chain)
}

/// A stream yielding exactly one outcome
pub fn once(outcome: Result<ExecutionResult, LinkError>) -> ResultStream {
    stream::once(async move { outcome }).boxed()
}

/// Run `operation` through `link`
pub fn execute(link: &dyn Link, operation: Operation) -> ResultStream {
    link.request(operation, terminal())
}

/// Links composed in order; each link's `forward` is the next link
#[derive(Clone)]
pub struct LinkChain {
    links: Arc<[Arc<dyn Link>]>,
}

impl LinkChain {
    pub fn new(links: Vec<Arc<dyn Link>>) -> Self {
        Self { links: links.into() }
    }

    fn dispatch(
        links: Arc<[Arc<dyn Link>]>,
        index: usize,
        operation: Operation,
        last: NextLink,
    ) -> ResultStream {
        let link = match links.get(index) {
            Some(link) => link.clone(),
            None => return last(operation),
        };
        let next: NextLink = Arc::new(move |operation: Operation| -> ResultStream {
            Self::dispatch(links.clone(), index + 1, operation, last.clone())
        });
        link.request(operation, next)
    }
}

impl From<Vec<Arc<dyn Link>>> for LinkChain {
    fn from(links: Vec<Arc<dyn Link>>) -> Self {
        Self::new(links)
    }
}

impl Link for LinkChain {
    fn request(&self, operation: Operation, forward: NextLink) -> ResultStream {
        Self::dispatch(self.links.clone(), 0, operation, forward)
    }
}

/// Terminating link built from a closure
pub struct FnLink<F> {
    handler: F,
}

impl<F> FnLink<F>
where
    F: Fn(Operation) -> ResultStream + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F> Link for FnLink<F>
where
    F: Fn(Operation) -> ResultStream + Send + Sync,
{
    fn request(&self, operation: Operation, _forward: NextLink) -> ResultStream {
        (self.handler)(operation)
    }
}

/// Sends operations to a server
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, operation: Operation) -> anyhow::Result<ExecutionResult>;
}

/// Terminating link that hands each operation to a [`Transport`]
pub struct TransportLink<T> {
    transport: Arc<T>,
}

impl<T: Transport> TransportLink<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }
}

impl<T: Transport + 'static> Link for TransportLink<T> {
    fn request(&self, operation: Operation, _forward: NextLink) -> ResultStream {
        let transport = self.transport.clone();
        stream::once(async move { transport.send(operation).await.map_err(LinkError::from) }).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use wm_core::Document;

    /// Records the operation name, then forwards unchanged
    struct TagLink {
        tag: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Link for TagLink {
        fn request(&self, operation: Operation, forward: NextLink) -> ResultStream {
            self.seen.lock().push(format!("{}:{}", self.tag, operation.name()));
            forward(operation)
        }
    }

    struct EchoServer;

    #[async_trait]
    impl Transport for EchoServer {
        async fn send(&self, operation: Operation) -> anyhow::Result<ExecutionResult> {
            if operation.name() == "Broken" {
                anyhow::bail!("connection refused");
            }
            Ok(ExecutionResult::data(json!({ "echo": operation.name() })))
        }
    }

    #[tokio::test]
    async fn test_chain_runs_links_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let chain = LinkChain::new(vec![
            Arc::new(TagLink { tag: "first", seen: seen.clone() }),
            Arc::new(TagLink { tag: "second", seen: seen.clone() }),
            Arc::new(FnLink::new(|_| once(Ok(ExecutionResult::data(json!({ "ok": true })))))),
        ]);

        let results: Vec<_> = execute(&chain, Operation::new(Document::query("GetTodos")))
            .collect()
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().data, Some(json!({ "ok": true })));
        assert_eq!(*seen.lock(), vec!["first:GetTodos", "second:GetTodos"]);
    }

    #[tokio::test]
    async fn test_chain_without_terminator_is_empty() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let chain = LinkChain::new(vec![Arc::new(TagLink { tag: "only", seen })]);
        let results: Vec<_> = execute(&chain, Operation::new(Document::query("GetTodos")))
            .collect()
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_transport_link() {
        let link = TransportLink::new(Arc::new(EchoServer));

        let ok: Vec<_> = execute(&link, Operation::new(Document::mutation("AddTodo"))).collect().await;
        assert_eq!(ok[0].as_ref().unwrap().data, Some(json!({ "echo": "AddTodo" })));

        let failed: Vec<_> = execute(&link, Operation::new(Document::mutation("Broken"))).collect().await;
        assert!(matches!(failed[0], Err(LinkError::Transport(_))));
    }
}
