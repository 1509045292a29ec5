//! Run event relay.
//!
//! Merges a provider's raw event stream and its asynchronous result into a
//! caller-facing stream with exactly one terminal signal. The relay owns
//! termination, not the producer: a provider's generator may keep running
//! after it has yielded `done` (cleanup, flushes), and the relay must close
//! the outward stream the instant `done` is forwarded, without awaiting
//! further iterator progress or the outcome future.

use futures::{stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use gantry_core::{AiEvent, ErrorCode};

use crate::provider::{AiEventStream, GraphRun};
use crate::request::GraphRunResult;

/// Caller-facing half of a relayed run.
pub struct RelayedRun {
    /// Event stream ending immediately after `done`.
    pub events: AiEventStream,
    /// Structured result. Spawned independently: it keeps resolving for
    /// usage/audit consumers even after the caller stops reading events.
    pub outcome: JoinHandle<GraphRunResult>,
}

/// Attach a relay to a provider run.
///
/// `capacity` bounds the outward channel; a slow caller backpressures the
/// pump, never the synchronous sinks inside the provider.
pub fn relay(run: GraphRun, capacity: usize) -> RelayedRun {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let outcome = tokio::spawn(run.outcome);
    tokio::spawn(pump(run.stream, tx));

    RelayedRun {
        events: receiver_stream(rx),
        outcome,
    }
}

/// Forward provider events until the terminal event has been forwarded.
///
/// Invariants encoded here:
/// - `done` closes the outward channel at once; the provider stream is
///   never polled again afterwards.
/// - A caller that drops the receiver stops delivery but not the provider:
///   the pump keeps draining (discarding events) until the terminal event
///   so the provider can finish cleanly.
/// - A provider stream that ends without a terminal event gets one
///   synthesized: callers never observe an unterminated stream.
async fn pump(mut stream: AiEventStream, tx: mpsc::Sender<AiEvent>) {
    let mut caller_gone = false;
    let mut last_was_error = false;

    while let Some(event) = stream.next().await {
        let terminal = event.is_done();
        last_was_error = matches!(event, AiEvent::Error { .. });

        if !caller_gone && tx.send(event).await.is_err() {
            debug!("caller abandoned relay stream, draining provider");
            caller_gone = true;
        }
        if terminal {
            return;
        }
    }

    warn!("provider stream ended without terminal event, synthesizing one");
    if !last_was_error {
        let _ = tx
            .send(AiEvent::Error {
                error: ErrorCode::Execution,
            })
            .await;
    }
    let _ = tx.send(AiEvent::Done).await;
}

fn receiver_stream(rx: mpsc::Receiver<AiEvent>) -> AiEventStream {
    Box::pin(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    }))
}
