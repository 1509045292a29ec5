use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorCode;

/// Events emitted during a graph run, as seen by the caller.
///
/// The set is closed on the producing side but open on the consuming side:
/// unknown tags deserialize to [`AiEvent::Unknown`], which consumers treat
/// as a no-op. Exactly one terminal pair is observed per run (`error` then
/// `done`, or `assistant_final` then `done`); `done` is always last.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AiEvent {
    /// A chunk of assistant text.
    TextDelta { delta: String },
    /// A tool invocation passed policy and input validation and is about
    /// to execute.
    ToolCallStart {
        tool_call_id: String,
        tool_name: String,
        args: Value,
    },
    /// Outcome of a tool invocation. `result` is already redacted.
    ToolCallResult {
        tool_call_id: String,
        result: Value,
        #[serde(default)]
        is_error: bool,
    },
    /// The assistant's complete final message.
    AssistantFinal { text: String },
    /// The run failed; immediately followed by `done`.
    Error { error: ErrorCode },
    /// Terminal marker. Always the last event of a run.
    Done,
    /// Forward compatibility: event kinds this build does not know about.
    #[serde(other)]
    Unknown,
}

impl AiEvent {
    /// Whether this event closes the stream.
    pub fn is_done(&self) -> bool {
        matches!(self, AiEvent::Done)
    }
}

/// Synchronous event callback, invoked in event order.
///
/// The owner of the sink forwards events to its own transport; emission
/// must never block, so sinks backed by channels use non-blocking sends.
#[derive(Clone)]
pub struct EventSink(Arc<dyn Fn(AiEvent) + Send + Sync>);

impl EventSink {
    pub fn new(emit: impl Fn(AiEvent) + Send + Sync + 'static) -> Self {
        Self(Arc::new(emit))
    }

    /// Sink that discards every event.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn emit(&self, event: AiEvent) {
        (self.0)(event)
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventSink")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tags_are_snake_case() {
        let json = serde_json::to_string(&AiEvent::TextDelta {
            delta: "hi".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"text_delta","delta":"hi"}"#);

        let json = serde_json::to_string(&AiEvent::Done).unwrap();
        assert_eq!(json, r#"{"type":"done"}"#);
    }

    #[test]
    fn test_tool_call_events_roundtrip() {
        let event = AiEvent::ToolCallResult {
            tool_call_id: "call_1".to_string(),
            result: serde_json::json!({"status": 200}),
            is_error: false,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: AiEvent = serde_json::from_str(&json).unwrap();
        match back {
            AiEvent::ToolCallResult { tool_call_id, .. } => {
                assert_eq!(tool_call_id, "call_1");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind_is_tolerated() {
        let event: AiEvent =
            serde_json::from_str(r#"{"type":"reasoning_delta","delta":"..."}"#).unwrap();
        assert!(matches!(event, AiEvent::Unknown));
    }

    #[test]
    fn test_error_event_carries_code() {
        let event = AiEvent::Error {
            error: ErrorCode::NotFound,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"error","error":"not_found"}"#);
    }

    #[test]
    fn test_sink_invokes_callback_in_order() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            EventSink::new(move |event| seen.lock().unwrap().push(event))
        };
        sink.emit(AiEvent::TextDelta {
            delta: "a".to_string(),
        });
        sink.emit(AiEvent::Done);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].is_done());
    }
}
