use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use gantry_core::{AiEvent, ErrorCode, EventSink};

use crate::policy::{PolicyDecision, ToolPolicy};
use crate::source::ToolSource;
use crate::tool::{InvocationContext, ToolCapabilities};

/// Structured failure of one tool invocation: the wire error code plus a
/// caller-safe message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ToolInvocationError {
    pub code: ErrorCode,
    pub message: String,
}

impl ToolInvocationError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Executes one tool invocation end-to-end: policy check, input validation,
/// execution, output validation, redaction. Paired `tool_call_start` /
/// `tool_call_result` events are emitted through the sink passed per call.
///
/// Stages run in strict order and short-circuit on the first failure.
/// Nothing raises past `exec`: every failure becomes a structured error and,
/// once the tool is known to exist and be permitted, exactly one
/// `tool_call_result` event with `is_error: true`.
pub struct ToolRunner {
    source: Arc<dyn ToolSource>,
    policy: ToolPolicy,
    caps: ToolCapabilities,
}

impl ToolRunner {
    /// Policy is an explicit constructor argument: there is no ambient or
    /// process-wide policy to fall back to.
    pub fn new(source: Arc<dyn ToolSource>, policy: ToolPolicy, caps: ToolCapabilities) -> Self {
        Self {
            source,
            policy,
            caps,
        }
    }

    /// Run `tool_id` with `raw_args`. Returns the redacted public output.
    ///
    /// An unresolved tool id emits no events at all. A policy denial emits
    /// only an error result, never a start event: the tool's existence is
    /// not confirmed to the model. From the start event onward, the same
    /// tool call id is reused verbatim in the paired result event.
    pub async fn exec(
        &self,
        tool_id: &str,
        raw_args: Value,
        ctx: &InvocationContext,
        sink: &EventSink,
    ) -> Result<Value, ToolInvocationError> {
        // 1. Resolve through the tool source.
        let Some(tool) = self.source.get_bound_tool(tool_id) else {
            debug!(run_id = %ctx.run_id, tool_id, "tool id not resolved");
            return Err(ToolInvocationError::new(
                ErrorCode::Unavailable,
                format!("tool '{tool_id}' is not available"),
            ));
        };
        let spec = tool.spec().clone();
        let tool_call_id = ctx
            .tool_call_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        // 2. Policy. Approval-required is treated as denied: no approval
        //    workflow exists yet.
        match self.policy.decide(&spec.name, spec.effect) {
            PolicyDecision::Allow => {}
            PolicyDecision::Deny | PolicyDecision::RequireApproval => {
                debug!(run_id = %ctx.run_id, tool = %spec.name, "tool denied by policy");
                let error = ToolInvocationError::new(
                    ErrorCode::PolicyDenied,
                    format!("tool '{}' is denied by policy", spec.name),
                );
                emit_error_result(sink, &tool_call_id, &error);
                return Err(error);
            }
        }

        // 3. Input validation.
        let validated = match tool.validate_input(raw_args) {
            Ok(value) => value,
            Err(e) => {
                let error = ToolInvocationError::new(ErrorCode::Validation, e.to_string());
                emit_error_result(sink, &tool_call_id, &error);
                return Err(error);
            }
        };

        // 4. Start event. The id here is reused verbatim in the result.
        debug!(run_id = %ctx.run_id, tool = %spec.name, tool_call_id = %tool_call_id, "executing tool");
        sink.emit(AiEvent::ToolCallStart {
            tool_call_id: tool_call_id.clone(),
            tool_name: spec.name.clone(),
            args: validated.clone(),
        });

        // 5. Execute.
        let raw_output = match tool.exec(validated, ctx, &self.caps).await {
            Ok(value) => value,
            Err(e) => {
                warn!(run_id = %ctx.run_id, tool = %spec.name, error = %e, "tool execution failed");
                let error = ToolInvocationError::new(ErrorCode::Execution, e.to_string());
                emit_error_result(sink, &tool_call_id, &error);
                return Err(error);
            }
        };

        // 6. Output validation.
        let valid_output = match tool.validate_output(raw_output) {
            Ok(value) => value,
            Err(e) => {
                let error = ToolInvocationError::new(ErrorCode::Validation, e.to_string());
                emit_error_result(sink, &tool_call_id, &error);
                return Err(error);
            }
        };

        // 7. Redaction. Fail-closed: neither the output nor the underlying
        //    error text may leave the runner, in the result or in logs.
        let public = match tool.redact(valid_output) {
            Ok(value) => value,
            Err(_) => {
                warn!(run_id = %ctx.run_id, tool = %spec.name, "redaction failed, output suppressed");
                let error = ToolInvocationError::new(
                    ErrorCode::RedactionFailed,
                    format!("redaction failed for tool '{}'", spec.name),
                );
                emit_error_result(sink, &tool_call_id, &error);
                return Err(error);
            }
        };

        // 8. Result event, paired with the start event by id.
        sink.emit(AiEvent::ToolCallResult {
            tool_call_id,
            result: public.clone(),
            is_error: false,
        });
        Ok(public)
    }
}

fn emit_error_result(sink: &EventSink, tool_call_id: &str, error: &ToolInvocationError) {
    sink.emit(AiEvent::ToolCallResult {
        tool_call_id: tool_call_id.to_string(),
        result: json!({
            "error": error.code,
            "message": error.message,
        }),
        is_error: true,
    });
}
