//! Relay termination properties: the caller-facing stream must end the
//! instant `done` is observed, regardless of how the provider's generator
//! or its outcome future behave afterwards.

use std::time::Duration;

use futures::{future, stream, StreamExt};
use tokio::time::timeout;

use gantry_core::{AiEvent, ErrorCode, FinishReason, TokenUsage};
use gantry_graph_runtime::{relay, GraphRun, GraphRunResult};

const WAIT: Duration = Duration::from_secs(1);
const PROVIDER_DELAY: Duration = Duration::from_secs(30);

fn ok_result() -> GraphRunResult {
    GraphRunResult::success(TokenUsage::new(1, 1), FinishReason::EndTurn)
}

#[tokio::test]
async fn stream_closes_at_done_without_waiting_for_generator() {
    // The generator yields `done`, then keeps "running" for a long time
    // before producing anything else. The relay must not wait for it.
    let head = vec![
        AiEvent::TextDelta {
            delta: "hello".to_string(),
        },
        AiEvent::AssistantFinal {
            text: "hello".to_string(),
        },
        AiEvent::Done,
    ];
    let tail = stream::once(async {
        tokio::time::sleep(PROVIDER_DELAY).await;
        AiEvent::TextDelta {
            delta: "late".to_string(),
        }
    });
    let run = GraphRun {
        stream: Box::pin(stream::iter(head).chain(tail)),
        outcome: Box::pin(future::ready(ok_result())),
    };

    let relayed = relay(run, 8);
    let events: Vec<AiEvent> = timeout(WAIT, relayed.events.collect())
        .await
        .expect("stream must close at done, not at generator completion");

    assert_eq!(events.len(), 3);
    assert!(events[2].is_done());
}

#[tokio::test]
async fn stream_closes_at_done_without_waiting_for_outcome() {
    let run = GraphRun {
        stream: Box::pin(stream::iter([
            AiEvent::AssistantFinal {
                text: "x".to_string(),
            },
            AiEvent::Done,
        ])),
        outcome: Box::pin(async {
            tokio::time::sleep(PROVIDER_DELAY).await;
            ok_result()
        }),
    };

    let relayed = relay(run, 8);
    let events: Vec<AiEvent> = timeout(WAIT, relayed.events.collect())
        .await
        .expect("stream must close at done, not at outcome resolution");
    assert!(events.last().unwrap().is_done());
}

#[tokio::test]
async fn events_after_done_are_never_forwarded() {
    let run = GraphRun {
        stream: Box::pin(stream::iter([
            AiEvent::Done,
            AiEvent::TextDelta {
                delta: "should not appear".to_string(),
            },
        ])),
        outcome: Box::pin(future::ready(ok_result())),
    };

    let relayed = relay(run, 8);
    let events: Vec<AiEvent> = timeout(WAIT, relayed.events.collect()).await.unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].is_done());
}

#[tokio::test]
async fn truncated_stream_gets_synthesized_terminal() {
    // A provider that stops streaming without any terminal event.
    let run = GraphRun {
        stream: Box::pin(stream::iter([AiEvent::TextDelta {
            delta: "partial".to_string(),
        }])),
        outcome: Box::pin(future::ready(GraphRunResult::failure(ErrorCode::Execution))),
    };

    let relayed = relay(run, 8);
    let events: Vec<AiEvent> = timeout(WAIT, relayed.events.collect()).await.unwrap();

    assert_eq!(events.len(), 3);
    assert!(matches!(
        events[1],
        AiEvent::Error {
            error: ErrorCode::Execution
        }
    ));
    assert!(events[2].is_done());
}

#[tokio::test]
async fn truncation_after_error_synthesizes_only_done() {
    // The terminal pair stays well-formed: no second error event.
    let run = GraphRun {
        stream: Box::pin(stream::iter([AiEvent::Error {
            error: ErrorCode::NotFound,
        }])),
        outcome: Box::pin(future::ready(GraphRunResult::failure(ErrorCode::NotFound))),
    };

    let relayed = relay(run, 8);
    let events: Vec<AiEvent> = timeout(WAIT, relayed.events.collect()).await.unwrap();

    assert_eq!(events.len(), 2);
    assert!(matches!(
        events[0],
        AiEvent::Error {
            error: ErrorCode::NotFound
        }
    ));
    assert!(events[1].is_done());
}

#[tokio::test]
async fn abandoned_caller_does_not_block_provider() {
    // Provider pushes through a tiny bounded channel; if nothing drained
    // it, it would block forever before reaching `done`.
    let (provider_tx, provider_rx) = tokio::sync::mpsc::channel::<AiEvent>(1);
    let (finished_tx, finished_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        for i in 0..16 {
            let event = AiEvent::TextDelta {
                delta: format!("chunk {i}"),
            };
            if provider_tx.send(event).await.is_err() {
                return;
            }
        }
        let _ = provider_tx.send(AiEvent::Done).await;
        let _ = finished_tx.send(());
    });

    let run = GraphRun {
        stream: Box::pin(stream::unfold(provider_rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })),
        outcome: Box::pin(future::ready(ok_result())),
    };

    let relayed = relay(run, 1);

    // Read a single event, then walk away.
    let mut events = relayed.events;
    let first = events.next().await.unwrap();
    assert!(matches!(first, AiEvent::TextDelta { .. }));
    drop(events);

    // The pump drains the rest; the provider reaches its terminal event.
    timeout(WAIT, finished_rx)
        .await
        .expect("provider should finish after caller abandons the stream")
        .unwrap();

    // The outcome stays consumable for billing/audit after abandonment.
    let result = timeout(WAIT, relayed.outcome).await.unwrap().unwrap();
    assert!(result.ok);
}

#[tokio::test]
async fn outcome_resolves_independently_of_stream_consumption() {
    let run = GraphRun {
        stream: Box::pin(stream::iter([
            AiEvent::AssistantFinal {
                text: "x".to_string(),
            },
            AiEvent::Done,
        ])),
        outcome: Box::pin(future::ready(ok_result())),
    };

    let relayed = relay(run, 8);
    // Await the outcome first, without touching the event stream.
    let result = timeout(WAIT, relayed.outcome).await.unwrap().unwrap();
    assert!(result.ok);
    assert_eq!(result.finish_reason, Some(FinishReason::EndTurn));

    let events: Vec<AiEvent> = timeout(WAIT, relayed.events.collect()).await.unwrap();
    assert!(events.last().unwrap().is_done());
}
