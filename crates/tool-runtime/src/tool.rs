use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use gantry_core::CallerIdentity;

/// A tool's declared impact class. Policy keys approval decisions off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolEffect {
    /// Reads state only; repeat calls are harmless.
    ReadOnly,
    /// Mutates state owned by this system.
    StateChange,
    /// Reaches outside the system (network, third-party APIs).
    ExternalSideEffect,
}

impl FromStr for ToolEffect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read_only" => Ok(ToolEffect::ReadOnly),
            "state_change" => Ok(ToolEffect::StateChange),
            "external_side_effect" => Ok(ToolEffect::ExternalSideEffect),
            other => Err(format!("unknown tool effect '{other}'")),
        }
    }
}

/// Redaction rule: an explicit allowlist of output fields the caller may see.
///
/// Everything not named here is dropped before the output leaves the runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionRule {
    pub allow_fields: Vec<String>,
}

impl RedactionRule {
    pub fn allow(fields: &[&str]) -> Self {
        Self {
            allow_fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Project `output` down to the allowlisted fields. Non-object outputs
    /// are rejected: an output that cannot be redacted field-wise must not
    /// reach the caller.
    pub fn apply(&self, output: &Value) -> Result<Value, ToolError> {
        let Some(map) = output.as_object() else {
            return Err(ToolError::Redaction);
        };
        let mut public = serde_json::Map::new();
        for field in &self.allow_fields {
            if let Some(value) = map.get(field) {
                public.insert(field.clone(), value.clone());
            }
        }
        Ok(Value::Object(public))
    }
}

/// Immutable description of a tool: its stable name, the schema the model
/// sees, its effect class, and the redaction rule applied to its output.
/// Created once at catalog-build time; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name (e.g., "http_fetch").
    pub name: String,
    /// Human-readable description for the model.
    pub description: String,
    /// JSON Schema describing the expected input.
    pub input_schema: Value,
    pub effect: ToolEffect,
    pub redaction: RedactionRule,
}

/// Per-run scratch storage shared by state-changing tools within one run.
#[derive(Clone, Default)]
pub struct ScratchStore(Arc<Mutex<HashMap<String, Value>>>);

impl ScratchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: impl Into<String>, value: Value) {
        self.0.lock().unwrap().insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capability handles injected into each `exec` call. Tools never store
/// these; ownership stays with the runner.
#[derive(Clone, Default)]
pub struct ToolCapabilities {
    /// Shared HTTP client for API-backed tools.
    pub http: reqwest::Client,
    /// Per-run scratch store for state-changing tools.
    pub scratch: ScratchStore,
}

impl ToolCapabilities {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-call correlation data. Created fresh for each invocation and
/// discarded after.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub run_id: String,
    /// Caller-supplied tool call id; when absent the runner generates one.
    pub tool_call_id: Option<String>,
    pub caller: CallerIdentity,
    pub started_at: DateTime<Utc>,
}

impl InvocationContext {
    pub fn new(run_id: impl Into<String>, caller: CallerIdentity) -> Self {
        Self {
            run_id: run_id.into(),
            tool_call_id: None,
            caller,
            started_at: Utc::now(),
        }
    }

    pub fn with_tool_call_id(mut self, id: impl Into<String>) -> Self {
        self.tool_call_id = Some(id.into());
        self
    }
}

/// Errors raised by bound-tool operations. The pipeline stage a failure
/// occurs in, not the variant, determines the wire error code.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid output: {0}")]
    InvalidOutput(String),
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    /// Carries no detail: redaction failures are fail-closed.
    #[error("redaction failed")]
    Redaction,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A tool spec paired with its four pipeline operations.
///
/// Constructed once per tool and held read-only by the runner; all methods
/// take `&self` and share nothing mutable.
#[async_trait]
pub trait BoundTool: Send + Sync {
    fn spec(&self) -> &ToolSpec;

    /// Check `raw` against the spec's input schema, returning the
    /// validated (possibly normalized) value.
    fn validate_input(&self, raw: Value) -> Result<Value, ToolError>;

    /// Run the tool. Capabilities are scoped to this call.
    async fn exec(
        &self,
        input: Value,
        ctx: &InvocationContext,
        caps: &ToolCapabilities,
    ) -> Result<Value, ToolError>;

    /// Check the raw output shape before redaction.
    fn validate_output(&self, raw: Value) -> Result<Value, ToolError>;

    /// Project the validated output down to caller-visible fields.
    fn redact(&self, validated: Value) -> Result<Value, ToolError> {
        self.spec().redaction.apply(&validated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction_drops_unlisted_fields() {
        let rule = RedactionRule::allow(&["status", "url"]);
        let output = serde_json::json!({
            "status": 200,
            "url": "https://example.com",
            "api_key": "sk-secret",
        });
        let public = rule.apply(&output).unwrap();
        assert_eq!(public, serde_json::json!({"status": 200, "url": "https://example.com"}));
    }

    #[test]
    fn test_redaction_rejects_non_object_output() {
        let rule = RedactionRule::allow(&["status"]);
        assert!(matches!(
            rule.apply(&serde_json::json!("plain string")),
            Err(ToolError::Redaction)
        ));
    }

    #[test]
    fn test_redaction_tolerates_missing_fields() {
        let rule = RedactionRule::allow(&["status", "absent"]);
        let public = rule.apply(&serde_json::json!({"status": 1})).unwrap();
        assert_eq!(public, serde_json::json!({"status": 1}));
    }

    #[test]
    fn test_effect_parsing() {
        assert_eq!("read_only".parse::<ToolEffect>().unwrap(), ToolEffect::ReadOnly);
        assert_eq!(
            "external_side_effect".parse::<ToolEffect>().unwrap(),
            ToolEffect::ExternalSideEffect
        );
        assert!("write_everything".parse::<ToolEffect>().is_err());
    }

    #[test]
    fn test_scratch_store_roundtrip() {
        let store = ScratchStore::new();
        assert!(store.is_empty());
        store.put("note", serde_json::json!({"v": 1}));
        assert_eq!(store.get("note"), Some(serde_json::json!({"v": 1})));
        assert_eq!(store.len(), 1);
    }
}
