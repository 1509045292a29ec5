use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use gantry_core::{FinishReason, TokenUsage};
use gantry_tool_runtime::ToolSpec;

use crate::request::ThreadMessage;

/// Events streamed from one model completion turn.
///
/// Provider-agnostic; concrete backends translate their own wire formats
/// into this shape outside the core.
#[derive(Debug, Clone)]
pub enum ModelEvent {
    /// A chunk of assistant text.
    TextDelta { delta: String },
    /// The model opened a tool call.
    ToolCallStart { id: String, name: String },
    /// Incremental JSON argument data for the open tool call.
    ToolCallDelta { id: String, args_delta: String },
    /// Tool call arguments are complete.
    ToolCallEnd { id: String },
    /// The turn is complete.
    Finish {
        reason: FinishReason,
        usage: TokenUsage,
    },
}

pub type ModelEventStream = Pin<Box<dyn Stream<Item = Result<ModelEvent, ModelError>> + Send>>;

/// One turn's input to the model.
#[derive(Debug, Clone)]
pub struct ModelTurnRequest {
    pub model_id: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<ThreadMessage>,
    /// Tools the model may request, already policy-filtered.
    pub tools: Vec<ToolSpec>,
}

/// Port to a completion backend. Adapters live outside this core.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn stream_turn(&self, request: ModelTurnRequest) -> Result<ModelEventStream, ModelError>;

    /// Client name for logging/debugging (e.g., "mock", "openai").
    fn client_name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("api error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("stream error: {0}")]
    Stream(String),
}

/// Scripted model client for exercising the loop without real API calls.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use futures::stream;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Returns pre-queued turns in FIFO order; an empty queue yields an
    /// immediate end-of-turn.
    pub struct MockModelClient {
        turns: Mutex<VecDeque<Vec<ModelEvent>>>,
    }

    impl MockModelClient {
        pub fn new() -> Self {
            Self {
                turns: Mutex::new(VecDeque::new()),
            }
        }

        /// Queue a raw turn.
        pub fn queue_turn(&self, events: Vec<ModelEvent>) {
            self.turns.lock().unwrap().push_back(events);
        }

        /// Queue a plain text turn.
        pub fn queue_text(&self, text: &str) {
            self.queue_turn(vec![
                ModelEvent::TextDelta {
                    delta: text.to_string(),
                },
                ModelEvent::Finish {
                    reason: FinishReason::EndTurn,
                    usage: TokenUsage::new(10, text.len() as u64 / 4),
                },
            ]);
        }

        /// Queue a turn requesting one tool call, args streamed in two deltas.
        pub fn queue_tool_call(&self, id: &str, name: &str, args: &serde_json::Value) {
            let rendered = args.to_string();
            let mut split = rendered.len() / 2;
            while !rendered.is_char_boundary(split) {
                split -= 1;
            }
            self.queue_turn(vec![
                ModelEvent::ToolCallStart {
                    id: id.to_string(),
                    name: name.to_string(),
                },
                ModelEvent::ToolCallDelta {
                    id: id.to_string(),
                    args_delta: rendered[..split].to_string(),
                },
                ModelEvent::ToolCallDelta {
                    id: id.to_string(),
                    args_delta: rendered[split..].to_string(),
                },
                ModelEvent::ToolCallEnd { id: id.to_string() },
                ModelEvent::Finish {
                    reason: FinishReason::ToolUse,
                    usage: TokenUsage::new(10, 5),
                },
            ]);
        }
    }

    impl Default for MockModelClient {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ModelClient for MockModelClient {
        async fn stream_turn(
            &self,
            _request: ModelTurnRequest,
        ) -> Result<ModelEventStream, ModelError> {
            let events = self.turns.lock().unwrap().pop_front().unwrap_or_else(|| {
                vec![ModelEvent::Finish {
                    reason: FinishReason::EndTurn,
                    usage: TokenUsage::default(),
                }]
            });
            Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
        }

        fn client_name(&self) -> &str {
            "mock"
        }
    }
}
