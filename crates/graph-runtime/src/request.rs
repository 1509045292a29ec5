use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use gantry_core::{CallerIdentity, ErrorCode, FinishReason, TokenUsage};

/// Parsed, namespaced graph address: `"provider:name"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId {
    pub namespace: String,
    pub name: String,
}

impl GraphId {
    /// Parse `"provider:name"`. Both halves must be non-empty; the name may
    /// itself contain colons.
    pub fn parse(raw: &str) -> Result<GraphId, GraphIdError> {
        let (namespace, name) = raw
            .split_once(':')
            .ok_or_else(|| GraphIdError(raw.to_string()))?;
        if namespace.is_empty() || name.is_empty() {
            return Err(GraphIdError(raw.to_string()));
        }
        Ok(GraphId {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for GraphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("malformed graph id '{0}': expected \"provider:name\"")]
pub struct GraphIdError(pub String);

/// The model requested execution of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Model-assigned id, reused on the matching result.
    pub id: String,
    pub name: String,
    pub args: Value,
}

/// Redacted outcome of a tool call, recorded into the thread history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_call_id: String,
    pub content: Value,
    pub is_error: bool,
}

/// An assistant turn: text, tool calls, or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantTurn {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

/// A message in the thread history handed to a graph run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ThreadMessage {
    User(String),
    Assistant(AssistantTurn),
    ToolResult(ToolCallRecord),
}

/// Everything a provider needs to start one run attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRunRequest {
    pub run_id: String,
    /// Id of the ingress request that triggered this run.
    pub ingress_request_id: String,
    /// Raw namespaced graph id; validated by the router and the provider.
    pub graph_id: String,
    pub model_id: String,
    pub messages: Vec<ThreadMessage>,
    pub caller: CallerIdentity,
    /// Caller-chosen conversation key for stateful providers. Never used
    /// as a cross-tenant key directly; see `thread_id`.
    pub state_key: Option<String>,
    /// Tenant-scoped id derived from `state_key` by the router. Opaque to
    /// the provider; reveals neither the tenant id nor the state key.
    pub thread_id: Option<Uuid>,
}

impl GraphRunRequest {
    pub fn new(
        run_id: impl Into<String>,
        ingress_request_id: impl Into<String>,
        graph_id: impl Into<String>,
        model_id: impl Into<String>,
        caller: CallerIdentity,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            ingress_request_id: ingress_request_id.into(),
            graph_id: graph_id.into(),
            model_id: model_id.into(),
            messages: Vec::new(),
            caller,
            state_key: None,
            thread_id: None,
        }
    }

    pub fn with_messages(mut self, messages: Vec<ThreadMessage>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_state_key(mut self, state_key: impl Into<String>) -> Self {
        self.state_key = Some(state_key.into());
        self
    }
}

/// Structured result of one run attempt, resolved independently of the
/// event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRunResult {
    pub ok: bool,
    pub usage: Option<TokenUsage>,
    /// Provider-reported cost passthrough; this core never computes it.
    pub cost_usd: Option<f64>,
    pub finish_reason: Option<FinishReason>,
    pub error: Option<ErrorCode>,
}

impl GraphRunResult {
    pub fn success(usage: TokenUsage, finish_reason: FinishReason) -> Self {
        Self {
            ok: true,
            usage: Some(usage),
            cost_usd: None,
            finish_reason: Some(finish_reason),
            error: None,
        }
    }

    pub fn failure(error: ErrorCode) -> Self {
        Self {
            ok: false,
            usage: None,
            cost_usd: None,
            finish_reason: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_id_parses_namespaced_form() {
        let id = GraphId::parse("inproc:support").unwrap();
        assert_eq!(id.namespace, "inproc");
        assert_eq!(id.name, "support");
        assert_eq!(id.to_string(), "inproc:support");
    }

    #[test]
    fn test_graph_id_rejects_malformed_forms() {
        assert!(GraphId::parse("not-namespaced").is_err());
        assert!(GraphId::parse(":name").is_err());
        assert!(GraphId::parse("provider:").is_err());
        assert!(GraphId::parse("").is_err());
    }

    #[test]
    fn test_graph_id_name_may_contain_colons() {
        let id = GraphId::parse("remote:org:flow").unwrap();
        assert_eq!(id.namespace, "remote");
        assert_eq!(id.name, "org:flow");
    }

    #[test]
    fn test_result_constructors() {
        let ok = GraphRunResult::success(TokenUsage::new(10, 2), FinishReason::EndTurn);
        assert!(ok.ok);
        assert!(ok.error.is_none());

        let failed = GraphRunResult::failure(ErrorCode::NotFound);
        assert!(!failed.ok);
        assert_eq!(failed.error, Some(ErrorCode::NotFound));
    }
}
