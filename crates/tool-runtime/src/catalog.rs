use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use tracing::debug;

use crate::policy::{PolicyDecision, ToolPolicy};
use crate::tool::ToolSpec;

/// Policy-filtered, immutable view of the tool specs offered to a model.
///
/// Visibility and execution permission are decided by the same function:
/// a tool the policy would not execute is never listed, so the model cannot
/// be offered a tool it cannot use.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    specs: IndexMap<String, ToolSpec>,
}

static EMPTY: OnceLock<Arc<ToolCatalog>> = OnceLock::new();

impl ToolCatalog {
    /// Keep exactly the specs the policy currently allows, in input order.
    /// Returns the shared empty catalog when nothing survives.
    pub fn build(specs: &[ToolSpec], policy: &ToolPolicy) -> Arc<ToolCatalog> {
        let mut kept = IndexMap::new();
        for spec in specs {
            match policy.decide(&spec.name, spec.effect) {
                PolicyDecision::Allow => {
                    kept.insert(spec.name.clone(), spec.clone());
                }
                decision => {
                    debug!(tool = %spec.name, ?decision, "tool excluded from catalog");
                }
            }
        }
        if kept.is_empty() {
            return Self::empty();
        }
        Arc::new(ToolCatalog { specs: kept })
    }

    /// The shared empty catalog.
    pub fn empty() -> Arc<ToolCatalog> {
        EMPTY
            .get_or_init(|| {
                Arc::new(ToolCatalog {
                    specs: IndexMap::new(),
                })
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.specs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// All listed specs, in deterministic order (for sending to the model).
    pub fn list(&self) -> Vec<ToolSpec> {
        self.specs.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
