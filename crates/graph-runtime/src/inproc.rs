use std::collections::HashMap;
use std::sync::Arc;

use futures::{stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use gantry_core::{AiEvent, ErrorCode, EventSink, FinishReason, TokenUsage};
use gantry_tool_runtime::{InvocationContext, ToolCatalog, ToolRunner};

use crate::model::{ModelClient, ModelEvent, ModelTurnRequest};
use crate::provider::{GraphProvider, GraphRun};
use crate::request::{
    AssistantTurn, GraphId, GraphRunRequest, GraphRunResult, ThreadMessage, ToolCallRecord,
    ToolCallRequest,
};

/// A named agent graph hosted in-process.
#[derive(Debug, Clone)]
pub struct AgentGraph {
    pub name: String,
    pub system_prompt: Option<String>,
    /// Cap on model/tool round trips per run.
    pub max_iterations: usize,
}

impl AgentGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: None,
            max_iterations: 10,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }
}

/// In-process provider: drives agent graphs against a model client,
/// executing requested tools through the tool runner mid-stream.
///
/// Flow per run: model turn → tool calls → execute → results → model turn
/// → ... → final text. Tool events reach the run's stream through the
/// runner's sink, interleaved with the model's text deltas.
pub struct InProcessProvider {
    graphs: HashMap<String, AgentGraph>,
    model: Arc<dyn ModelClient>,
    runner: Arc<ToolRunner>,
    catalog: Arc<ToolCatalog>,
}

impl InProcessProvider {
    pub fn new(
        model: Arc<dyn ModelClient>,
        runner: Arc<ToolRunner>,
        catalog: Arc<ToolCatalog>,
    ) -> Self {
        Self {
            graphs: HashMap::new(),
            model,
            runner,
            catalog,
        }
    }

    pub fn with_graph(mut self, graph: AgentGraph) -> Self {
        self.graphs.insert(graph.name.clone(), graph);
        self
    }
}

impl GraphProvider for InProcessProvider {
    fn run_graph(&self, request: GraphRunRequest) -> GraphRun {
        let graph_id = match GraphId::parse(&request.graph_id) {
            Ok(id) => id,
            Err(e) => {
                warn!(run_id = %request.run_id, error = %e, "rejecting run");
                return GraphRun::failed(ErrorCode::InvalidRequest);
            }
        };
        let Some(graph) = self.graphs.get(&graph_id.name).cloned() else {
            debug!(run_id = %request.run_id, graph = %graph_id.name, "unknown graph");
            return GraphRun::failed(ErrorCode::NotFound);
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = oneshot::channel();
        let model = self.model.clone();
        let runner = self.runner.clone();
        let catalog = self.catalog.clone();

        tokio::spawn(async move {
            let result = drive(graph, model, runner, catalog, request, tx).await;
            let _ = result_tx.send(result);
        });

        GraphRun {
            stream: Box::pin(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|event| (event, rx))
            })),
            outcome: Box::pin(async move {
                result_rx
                    .await
                    .unwrap_or_else(|_| GraphRunResult::failure(ErrorCode::Execution))
            }),
        }
    }

    fn provider_name(&self) -> &str {
        "inproc"
    }
}

/// One run of the model/tool loop. Every exit path emits a terminal pair
/// into `tx` before resolving the result.
async fn drive(
    graph: AgentGraph,
    model: Arc<dyn ModelClient>,
    runner: Arc<ToolRunner>,
    catalog: Arc<ToolCatalog>,
    request: GraphRunRequest,
    tx: mpsc::UnboundedSender<AiEvent>,
) -> GraphRunResult {
    let sink = {
        let tx = tx.clone();
        EventSink::new(move |event| {
            let _ = tx.send(event);
        })
    };

    let mut messages = request.messages.clone();
    let mut usage = TokenUsage::default();
    let tools = catalog.list();

    for iteration in 0..graph.max_iterations {
        debug!(run_id = %request.run_id, iteration, "starting loop iteration");

        let turn = ModelTurnRequest {
            model_id: request.model_id.clone(),
            system_prompt: graph.system_prompt.clone(),
            messages: messages.clone(),
            tools: tools.clone(),
        };
        let mut events = match model.stream_turn(turn).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(run_id = %request.run_id, error = %e, "model turn failed");
                return fail(&tx, ErrorCode::Execution);
            }
        };

        let mut text_parts: Vec<String> = Vec::new();
        let mut tool_calls: Vec<ToolCallRequest> = Vec::new();
        let mut current_id = String::new();
        let mut current_name = String::new();
        let mut current_args = String::new();
        let mut finish = FinishReason::EndTurn;

        while let Some(item) = events.next().await {
            match item {
                Ok(ModelEvent::TextDelta { delta }) => {
                    let _ = tx.send(AiEvent::TextDelta {
                        delta: delta.clone(),
                    });
                    text_parts.push(delta);
                }
                Ok(ModelEvent::ToolCallStart { id, name }) => {
                    current_id = id;
                    current_name = name;
                    current_args.clear();
                }
                Ok(ModelEvent::ToolCallDelta { args_delta, .. }) => {
                    current_args.push_str(&args_delta);
                }
                Ok(ModelEvent::ToolCallEnd { .. }) => {
                    let args: serde_json::Value =
                        serde_json::from_str(&current_args).unwrap_or_default();
                    tool_calls.push(ToolCallRequest {
                        id: current_id.clone(),
                        name: current_name.clone(),
                        args,
                    });
                }
                Ok(ModelEvent::Finish {
                    reason,
                    usage: turn_usage,
                }) => {
                    finish = reason;
                    usage.add(turn_usage);
                }
                Err(e) => {
                    warn!(run_id = %request.run_id, error = %e, "model stream failed");
                    return fail(&tx, ErrorCode::Execution);
                }
            }
        }

        let text = if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join(""))
        };
        messages.push(ThreadMessage::Assistant(AssistantTurn {
            text: text.clone(),
            tool_calls: tool_calls.clone(),
        }));

        // No tool work requested: the run is complete.
        if tool_calls.is_empty() || finish != FinishReason::ToolUse {
            info!(run_id = %request.run_id, iteration, "run complete");
            let _ = tx.send(AiEvent::AssistantFinal {
                text: text.unwrap_or_default(),
            });
            let _ = tx.send(AiEvent::Done);
            return GraphRunResult::success(usage, finish);
        }

        info!(run_id = %request.run_id, count = tool_calls.len(), "executing tool calls");
        for call in &tool_calls {
            let ctx = InvocationContext::new(request.run_id.clone(), request.caller.clone())
                .with_tool_call_id(call.id.clone());
            // The runner emits the start/result events itself; here we only
            // record the outcome for the next model turn.
            let record = match runner.exec(&call.name, call.args.clone(), &ctx, &sink).await {
                Ok(public) => ToolCallRecord {
                    tool_call_id: call.id.clone(),
                    content: public,
                    is_error: false,
                },
                Err(e) => ToolCallRecord {
                    tool_call_id: call.id.clone(),
                    content: serde_json::json!({
                        "error": e.code,
                        "message": e.message,
                    }),
                    is_error: true,
                },
            };
            messages.push(ThreadMessage::ToolResult(record));
        }
    }

    warn!(run_id = %request.run_id, cap = graph.max_iterations, "iteration cap reached");
    let _ = tx.send(AiEvent::AssistantFinal {
        text: String::new(),
    });
    let _ = tx.send(AiEvent::Done);
    GraphRunResult::success(usage, FinishReason::IterationLimit)
}

fn fail(tx: &mpsc::UnboundedSender<AiEvent>, code: ErrorCode) -> GraphRunResult {
    let _ = tx.send(AiEvent::Error { error: code });
    let _ = tx.send(AiEvent::Done);
    GraphRunResult::failure(code)
}
