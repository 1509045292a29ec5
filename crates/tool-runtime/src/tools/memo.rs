//! Per-run memo storage tool. State-changing; the stored value never
//! appears in the redacted output.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::tool::{
    BoundTool, InvocationContext, RedactionRule, ToolCapabilities, ToolEffect, ToolError, ToolSpec,
};

/// Store a key/value memo in the run's scratch store.
pub struct MemoStoreTool {
    spec: ToolSpec,
}

impl MemoStoreTool {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec {
                name: "memo_store".to_string(),
                description: "Stores a value under a key for the duration of this run."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "key": {
                            "type": "string",
                            "description": "Name to store the value under"
                        },
                        "value": {
                            "description": "Any JSON value to store"
                        }
                    },
                    "required": ["key", "value"]
                }),
                effect: ToolEffect::StateChange,
                redaction: RedactionRule::allow(&["key", "bytes"]),
            },
        }
    }
}

impl Default for MemoStoreTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BoundTool for MemoStoreTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    fn validate_input(&self, raw: Value) -> Result<Value, ToolError> {
        let key = raw
            .get("key")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidInput("missing 'key' field".to_string()))?;
        if key.is_empty() {
            return Err(ToolError::InvalidInput("'key' must be non-empty".to_string()));
        }
        if raw.get("value").is_none() {
            return Err(ToolError::InvalidInput("missing 'value' field".to_string()));
        }
        Ok(raw)
    }

    async fn exec(
        &self,
        input: Value,
        ctx: &InvocationContext,
        caps: &ToolCapabilities,
    ) -> Result<Value, ToolError> {
        let key = input
            .get("key")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::ExecutionFailed("validated input lost 'key'".to_string()))?
            .to_string();
        let value = input
            .get("value")
            .cloned()
            .ok_or_else(|| ToolError::ExecutionFailed("validated input lost 'value'".to_string()))?;

        let bytes = value.to_string().len();
        caps.scratch.put(key.clone(), value.clone());
        debug!(run_id = %ctx.run_id, key = %key, bytes, "memo stored");

        // The stored value rides along for output validation but is not on
        // the redaction allowlist.
        Ok(json!({
            "key": key,
            "bytes": bytes,
            "value": value,
        }))
    }

    fn validate_output(&self, raw: Value) -> Result<Value, ToolError> {
        let ok = raw.get("key").and_then(|v| v.as_str()).is_some()
            && raw.get("bytes").and_then(|v| v.as_u64()).is_some();
        if !ok {
            return Err(ToolError::InvalidOutput(
                "expected 'key' and 'bytes' fields".to_string(),
            ));
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::CallerIdentity;

    fn ctx() -> InvocationContext {
        InvocationContext::new("run-1", CallerIdentity::new("tenant-a", "user-1"))
    }

    #[tokio::test]
    async fn test_memo_store_writes_scratch_and_hides_value() {
        let tool = MemoStoreTool::new();
        let caps = ToolCapabilities::new();
        let input = tool
            .validate_input(json!({"key": "note", "value": {"pin": "1234"}}))
            .unwrap();
        let raw = tool.exec(input, &ctx(), &caps).await.unwrap();
        let valid = tool.validate_output(raw).unwrap();
        let public = tool.redact(valid).unwrap();

        assert_eq!(public.get("key"), Some(&json!("note")));
        assert!(public.get("bytes").is_some());
        assert!(public.get("value").is_none());
        assert_eq!(caps.scratch.get("note"), Some(json!({"pin": "1234"})));
    }

    #[test]
    fn test_memo_store_requires_key_and_value() {
        let tool = MemoStoreTool::new();
        assert!(tool.validate_input(json!({"value": 1})).is_err());
        assert!(tool.validate_input(json!({"key": "", "value": 1})).is_err());
        assert!(tool.validate_input(json!({"key": "k"})).is_err());
        assert!(tool.validate_input(json!({"key": "k", "value": null})).is_ok());
    }
}
