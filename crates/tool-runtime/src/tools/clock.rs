//! Wall-clock tool. Read-only, no input.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::tool::{
    BoundTool, InvocationContext, RedactionRule, ToolCapabilities, ToolEffect, ToolError, ToolSpec,
};

/// Current UTC time.
pub struct ClockNowTool {
    spec: ToolSpec,
}

impl ClockNowTool {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec {
                name: "clock_now".to_string(),
                description: "Returns the current UTC date and time.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
                effect: ToolEffect::ReadOnly,
                redaction: RedactionRule::allow(&["iso8601", "unix_ms"]),
            },
        }
    }
}

impl Default for ClockNowTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BoundTool for ClockNowTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    fn validate_input(&self, raw: Value) -> Result<Value, ToolError> {
        match raw {
            Value::Null => Ok(json!({})),
            Value::Object(_) => Ok(raw),
            other => Err(ToolError::InvalidInput(format!(
                "expected an object, got {other}"
            ))),
        }
    }

    async fn exec(
        &self,
        _input: Value,
        _ctx: &InvocationContext,
        _caps: &ToolCapabilities,
    ) -> Result<Value, ToolError> {
        let now = Utc::now();
        Ok(json!({
            "iso8601": now.to_rfc3339(),
            "unix_ms": now.timestamp_millis(),
            // Not allowlisted; stays internal.
            "source": "system_clock",
        }))
    }

    fn validate_output(&self, raw: Value) -> Result<Value, ToolError> {
        let ok = raw
            .get("iso8601")
            .and_then(|v| v.as_str())
            .is_some_and(|s| !s.is_empty());
        if !ok {
            return Err(ToolError::InvalidOutput(
                "missing 'iso8601' field".to_string(),
            ));
        }
        Ok(raw)
    }
}
