use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use gantry_core::PolicyConfig;

use crate::tool::ToolEffect;

/// Outcome of a policy check for one `(tool name, effect)` pair.
///
/// `RequireApproval` is treated the same as `Deny` by the runner and the
/// catalog: no approval workflow exists yet. The variant stays distinct so
/// a future approval protocol is a policy change, not a type change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecision {
    Allow,
    Deny,
    RequireApproval,
}

/// Pure decision function over tool name and effect. No side effects, no
/// I/O. The default denies everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ToolPolicy {
    /// Denies every tool.
    DenyAll,
    /// Allows exactly the named tools; effects in the approval set degrade
    /// the decision to `RequireApproval`.
    Allowlist {
        allow: BTreeSet<String>,
        require_approval: BTreeSet<ToolEffect>,
    },
}

impl Default for ToolPolicy {
    fn default() -> Self {
        ToolPolicy::DenyAll
    }
}

impl ToolPolicy {
    pub fn allowlist<I, S>(names: I, require_approval: impl IntoIterator<Item = ToolEffect>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ToolPolicy::Allowlist {
            allow: names.into_iter().map(Into::into).collect(),
            require_approval: require_approval.into_iter().collect(),
        }
    }

    /// Build a policy from configuration. Unknown modes fall back to
    /// deny-all; unknown effect names are skipped with a warning.
    pub fn from_config(cfg: &PolicyConfig) -> Self {
        match cfg.mode.as_str() {
            "allowlist" => {
                let mut require_approval = BTreeSet::new();
                for raw in &cfg.require_approval {
                    match raw.parse::<ToolEffect>() {
                        Ok(effect) => {
                            require_approval.insert(effect);
                        }
                        Err(_) => warn!(effect = %raw, "unknown effect in policy config, skipping"),
                    }
                }
                ToolPolicy::Allowlist {
                    allow: cfg.allow.iter().cloned().collect(),
                    require_approval,
                }
            }
            "deny_all" => ToolPolicy::DenyAll,
            other => {
                warn!(mode = %other, "unknown policy mode, falling back to deny_all");
                ToolPolicy::DenyAll
            }
        }
    }

    pub fn decide(&self, tool_name: &str, effect: ToolEffect) -> PolicyDecision {
        match self {
            ToolPolicy::DenyAll => PolicyDecision::Deny,
            ToolPolicy::Allowlist {
                allow,
                require_approval,
            } => {
                if !allow.contains(tool_name) {
                    PolicyDecision::Deny
                } else if require_approval.contains(&effect) {
                    PolicyDecision::RequireApproval
                } else {
                    PolicyDecision::Allow
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_denies_everything() {
        let policy = ToolPolicy::default();
        assert_eq!(
            policy.decide("anything", ToolEffect::ReadOnly),
            PolicyDecision::Deny
        );
    }

    #[test]
    fn test_allowlist_allows_named_tool() {
        let policy = ToolPolicy::allowlist(["clock_now"], []);
        assert_eq!(
            policy.decide("clock_now", ToolEffect::ReadOnly),
            PolicyDecision::Allow
        );
        assert_eq!(
            policy.decide("other", ToolEffect::ReadOnly),
            PolicyDecision::Deny
        );
    }

    #[test]
    fn test_approval_effects_degrade_decision() {
        let policy = ToolPolicy::allowlist(
            ["http_fetch", "clock_now"],
            [ToolEffect::ExternalSideEffect],
        );
        assert_eq!(
            policy.decide("http_fetch", ToolEffect::ExternalSideEffect),
            PolicyDecision::RequireApproval
        );
        assert_eq!(
            policy.decide("clock_now", ToolEffect::ReadOnly),
            PolicyDecision::Allow
        );
    }

    #[test]
    fn test_absent_name_wins_over_effect() {
        // Not on the allowlist means deny, even for an approval-class effect.
        let policy = ToolPolicy::allowlist(["clock_now"], [ToolEffect::ExternalSideEffect]);
        assert_eq!(
            policy.decide("http_fetch", ToolEffect::ExternalSideEffect),
            PolicyDecision::Deny
        );
    }

    #[test]
    fn test_from_config_parses_allowlist() {
        let cfg = PolicyConfig {
            mode: "allowlist".to_string(),
            allow: vec!["clock_now".to_string()],
            require_approval: vec!["external_side_effect".to_string(), "bogus".to_string()],
        };
        let policy = ToolPolicy::from_config(&cfg);
        assert_eq!(
            policy.decide("clock_now", ToolEffect::ReadOnly),
            PolicyDecision::Allow
        );
        match policy {
            ToolPolicy::Allowlist {
                require_approval, ..
            } => {
                assert_eq!(require_approval.len(), 1);
            }
            ToolPolicy::DenyAll => panic!("expected allowlist"),
        }
    }

    #[test]
    fn test_from_config_unknown_mode_denies() {
        let cfg = PolicyConfig {
            mode: "yolo".to_string(),
            allow: vec!["clock_now".to_string()],
            require_approval: Vec::new(),
        };
        let policy = ToolPolicy::from_config(&cfg);
        assert_eq!(
            policy.decide("clock_now", ToolEffect::ReadOnly),
            PolicyDecision::Deny
        );
    }
}
