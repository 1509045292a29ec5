use std::pin::Pin;

use futures::future::BoxFuture;
use futures::{future, stream, Stream};

use gantry_core::{AiEvent, ErrorCode};

use crate::request::{GraphRunRequest, GraphRunResult};

/// Caller-facing event sequence of one run.
pub type AiEventStream = Pin<Box<dyn Stream<Item = AiEvent> + Send>>;

/// A provider's live run: the raw event stream plus the asynchronous
/// structured result.
///
/// Both halves exist from the moment `run_graph` returns; all actual work
/// happens while the stream is consumed. The stream carries the terminal
/// events; the outcome resolves independently and is not a precondition
/// for stream termination.
pub struct GraphRun {
    pub stream: AiEventStream,
    pub outcome: BoxFuture<'static, GraphRunResult>,
}

impl GraphRun {
    /// Canned failing run: `error{code}` then `done`, outcome failed.
    pub fn failed(code: ErrorCode) -> GraphRun {
        GraphRun {
            stream: Box::pin(stream::iter([
                AiEvent::Error { error: code },
                AiEvent::Done,
            ])),
            outcome: Box::pin(future::ready(GraphRunResult::failure(code))),
        }
    }
}

/// The contract every execution provider implements.
///
/// `run_graph` must return without awaiting. Providers validate the graph
/// id shape themselves (a malformed id yields `error{invalid_request}` then
/// `done`; a well-formed but unknown graph yields `error{not_found}`), so
/// the contract holds even when a provider is used without the router.
pub trait GraphProvider: Send + Sync {
    fn run_graph(&self, request: GraphRunRequest) -> GraphRun;

    /// Providers backed by external session state require a `state_key`
    /// and must reject its absence rather than create anonymous state.
    fn requires_state(&self) -> bool {
        false
    }

    /// Provider name for logging/debugging.
    fn provider_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_failed_run_yields_error_then_done() {
        let run = GraphRun::failed(ErrorCode::NotFound);
        let events: Vec<AiEvent> = run.stream.collect().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            AiEvent::Error {
                error: ErrorCode::NotFound
            }
        ));
        assert!(events[1].is_done());

        let result = run.outcome.await;
        assert!(!result.ok);
        assert_eq!(result.error, Some(ErrorCode::NotFound));
    }
}
