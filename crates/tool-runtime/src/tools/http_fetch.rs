//! HTTP GET tool. External side effect; scheme-restricted, body-capped.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use gantry_core::HttpToolConfig;

use crate::tool::{
    BoundTool, InvocationContext, RedactionRule, ToolCapabilities, ToolEffect, ToolError, ToolSpec,
};

/// Fetch a URL over HTTP GET using the injected client.
pub struct HttpFetchTool {
    spec: ToolSpec,
    config: HttpToolConfig,
}

impl HttpFetchTool {
    pub fn new(config: HttpToolConfig) -> Self {
        Self {
            spec: ToolSpec {
                name: "http_fetch".to_string(),
                description: "Fetches a URL via HTTP GET and returns status and body."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "url": {
                            "type": "string",
                            "description": "Absolute http(s) URL to fetch"
                        }
                    },
                    "required": ["url"]
                }),
                effect: ToolEffect::ExternalSideEffect,
                redaction: RedactionRule::allow(&["status", "url", "body", "truncated"]),
            },
            config,
        }
    }
}

impl Default for HttpFetchTool {
    fn default() -> Self {
        Self::new(HttpToolConfig::default())
    }
}

/// Cut at a char boundary so truncation never splits a code point.
fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[async_trait]
impl BoundTool for HttpFetchTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    fn validate_input(&self, raw: Value) -> Result<Value, ToolError> {
        let url_str = raw
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidInput("missing 'url' field".to_string()))?;
        let url = reqwest::Url::parse(url_str)
            .map_err(|e| ToolError::InvalidInput(format!("invalid url: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(json!({ "url": url.to_string() })),
            other => Err(ToolError::InvalidInput(format!(
                "scheme '{other}' not allowed, only http/https"
            ))),
        }
    }

    async fn exec(
        &self,
        input: Value,
        ctx: &InvocationContext,
        caps: &ToolCapabilities,
    ) -> Result<Value, ToolError> {
        let url = input
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::ExecutionFailed("validated input lost 'url'".to_string()))?;

        debug!(run_id = %ctx.run_id, url, "fetching url");
        let response = caps
            .http
            .get(url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers_len = response.headers().len();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("body read failed: {e}")))?;

        let max = self.config.max_body_bytes as usize;
        let truncated = body.len() > max;
        let body = truncate_utf8(&body, max).to_string();

        Ok(json!({
            "status": status,
            "url": final_url,
            "body": body,
            "truncated": truncated,
            // Not allowlisted; stays internal.
            "headers_len": headers_len,
        }))
    }

    fn validate_output(&self, raw: Value) -> Result<Value, ToolError> {
        let ok = raw.get("status").and_then(|v| v.as_u64()).is_some()
            && raw.get("body").and_then(|v| v.as_str()).is_some();
        if !ok {
            return Err(ToolError::InvalidOutput(
                "expected 'status' and 'body' fields".to_string(),
            ));
        }
        Ok(raw)
    }
}
