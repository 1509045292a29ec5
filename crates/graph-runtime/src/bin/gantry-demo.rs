//! Minimal end-to-end wiring: config → policy → catalog → runner →
//! in-process provider → router → relay. Prints the caller-facing event
//! stream as JSON lines, then the structured run result.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use futures::{stream, StreamExt};
use uuid::Uuid;

use gantry_core::{CallerIdentity, FinishReason, GantryConfig, TokenUsage};
use gantry_graph_runtime::{
    relay, AgentGraph, GraphRouter, GraphRunRequest, InProcessProvider, ModelClient, ModelError,
    ModelEvent, ModelTurnRequest, ThreadMessage,
};
use gantry_graph_runtime::model::ModelEventStream;
use gantry_tool_runtime::{
    ClockNowTool, HttpFetchTool, MemoStoreTool, ToolCapabilities, ToolCatalog, ToolPolicy,
    ToolRegistry, ToolRunner, ToolSource,
};

/// Fixed two-turn script: one tool call, then a closing message. Stands in
/// for a real completion backend.
struct CannedModel {
    turns: Mutex<VecDeque<Vec<ModelEvent>>>,
}

impl CannedModel {
    fn new() -> Self {
        let first_turn = vec![
            ModelEvent::ToolCallStart {
                id: "call_1".to_string(),
                name: "clock_now".to_string(),
            },
            ModelEvent::ToolCallDelta {
                id: "call_1".to_string(),
                args_delta: "{}".to_string(),
            },
            ModelEvent::ToolCallEnd {
                id: "call_1".to_string(),
            },
            ModelEvent::Finish {
                reason: FinishReason::ToolUse,
                usage: TokenUsage::new(24, 8),
            },
        ];
        let second_turn = vec![
            ModelEvent::TextDelta {
                delta: "I checked the clock; ".to_string(),
            },
            ModelEvent::TextDelta {
                delta: "the current time is in the tool result above.".to_string(),
            },
            ModelEvent::Finish {
                reason: FinishReason::EndTurn,
                usage: TokenUsage::new(40, 16),
            },
        ];
        Self {
            turns: Mutex::new(VecDeque::from([first_turn, second_turn])),
        }
    }
}

#[async_trait]
impl ModelClient for CannedModel {
    async fn stream_turn(&self, _request: ModelTurnRequest) -> Result<ModelEventStream, ModelError> {
        let events = self.turns.lock().unwrap().pop_front().unwrap_or_else(|| {
            vec![ModelEvent::Finish {
                reason: FinishReason::EndTurn,
                usage: TokenUsage::default(),
            }]
        });
        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }

    fn client_name(&self) -> &str {
        "canned"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    gantry_core::config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = GantryConfig::from_env();

    // Use the configured allowlist when one is set; otherwise allow the
    // two harmless builtins so the demo has something to show.
    let policy = match config.policy.mode.as_str() {
        "allowlist" => ToolPolicy::from_config(&config.policy),
        _ => ToolPolicy::allowlist(["clock_now", "memo_store"], []),
    };

    let mut registry = ToolRegistry::new();
    registry.register(ClockNowTool::new())?;
    registry.register(MemoStoreTool::new())?;
    registry.register(HttpFetchTool::new(config.http_tool.clone()))?;
    let registry = Arc::new(registry);

    let catalog = ToolCatalog::build(&registry.list_tool_specs(), &policy);
    let runner = Arc::new(ToolRunner::new(
        registry,
        policy,
        ToolCapabilities::new(),
    ));

    let provider = InProcessProvider::new(Arc::new(CannedModel::new()), runner, catalog)
        .with_graph(AgentGraph::new("support").with_system_prompt("You are a helpful assistant."));

    let mut router = GraphRouter::new();
    router.register("inproc", Arc::new(provider))?;

    let request = GraphRunRequest::new(
        Uuid::new_v4().to_string(),
        Uuid::new_v4().to_string(),
        "inproc:support",
        config.model.default_model.clone(),
        CallerIdentity::new("tenant-demo", "user-demo"),
    )
    .with_messages(vec![ThreadMessage::User("What time is it?".to_string())])
    .with_state_key("demo-thread");

    let relayed = relay(router.run(request), config.relay.channel_capacity);

    let mut events = relayed.events;
    while let Some(event) = events.next().await {
        println!("{}", serde_json::to_string(&event)?);
    }

    let result = relayed.outcome.await?;
    println!("result: {}", serde_json::to_string(&result)?);
    Ok(())
}
