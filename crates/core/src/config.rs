use std::env;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env_opt(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "unparsable env var, using default");
            default
        }),
        None => default,
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    match env_opt(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "unparsable env var, using default");
            default
        }),
        None => default,
    }
}

/// Split a comma-separated env value into trimmed, non-empty items.
fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn env_csv(key: &str) -> Vec<String> {
    env_opt(key).map(|raw| parse_csv(&raw)).unwrap_or_default()
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GantryConfig {
    pub policy: PolicyConfig,
    pub relay: RelayConfig,
    pub http_tool: HttpToolConfig,
    pub model: ModelConfig,
}

impl GantryConfig {
    pub fn from_env() -> Self {
        Self {
            policy: PolicyConfig::from_env(),
            relay: RelayConfig::from_env(),
            http_tool: HttpToolConfig::from_env(),
            model: ModelConfig::from_env(),
        }
    }
}

/// Tool policy settings. An explicit config object is the only way to
/// configure policy; there is no process-wide mutable policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// "deny_all" (default) or "allowlist".
    pub mode: String,
    /// Tool names permitted under allowlist mode (GANTRY_POLICY_ALLOW,
    /// comma-separated).
    pub allow: Vec<String>,
    /// Effect classes that require approval before execution
    /// (GANTRY_POLICY_APPROVAL_EFFECTS, comma-separated).
    pub require_approval: Vec<String>,
}

impl PolicyConfig {
    pub fn from_env() -> Self {
        Self {
            mode: env_or("GANTRY_POLICY_MODE", "deny_all"),
            allow: env_csv("GANTRY_POLICY_ALLOW"),
            require_approval: env_csv("GANTRY_POLICY_APPROVAL_EFFECTS"),
        }
    }

    /// Deny-everything config, the safe default.
    pub fn deny_all() -> Self {
        Self {
            mode: "deny_all".to_string(),
            allow: Vec::new(),
            require_approval: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Capacity of the caller-facing event channel.
    pub channel_capacity: usize,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self {
            channel_capacity: env_usize("GANTRY_RELAY_CAPACITY", 64),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpToolConfig {
    /// Per-request timeout for the http_fetch tool, in seconds.
    pub timeout_secs: u64,
    /// Response bodies are truncated to this many bytes.
    pub max_body_bytes: u64,
}

impl HttpToolConfig {
    pub fn from_env() -> Self {
        Self {
            timeout_secs: env_u64("GANTRY_HTTP_TOOL_TIMEOUT_SECS", 10),
            max_body_bytes: env_u64("GANTRY_HTTP_TOOL_MAX_BODY_BYTES", 256 * 1024),
        }
    }
}

impl Default for HttpToolConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_body_bytes: 256 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model id used when a run request does not name one.
    pub default_model: String,
}

impl ModelConfig {
    pub fn from_env() -> Self {
        Self {
            default_model: env_or("GANTRY_MODEL_ID", "mock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_trims_and_drops_empty() {
        assert_eq!(
            parse_csv("clock_now, http_fetch ,,memo_store"),
            vec!["clock_now", "http_fetch", "memo_store"]
        );
        assert!(parse_csv("").is_empty());
        assert!(parse_csv(" , ").is_empty());
    }

    #[test]
    fn test_policy_config_deny_all_default() {
        let cfg = PolicyConfig::deny_all();
        assert_eq!(cfg.mode, "deny_all");
        assert!(cfg.allow.is_empty());
        assert!(cfg.require_approval.is_empty());
    }
}
