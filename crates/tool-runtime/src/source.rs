use std::collections::HashMap;
use std::sync::Arc;

use crate::tool::{BoundTool, ToolSpec};

/// Port through which the runner resolves tool ids to runtimes.
///
/// The runner never executes a runtime it did not obtain here.
pub trait ToolSource: Send + Sync {
    fn get_bound_tool(&self, tool_id: &str) -> Option<Arc<dyn BoundTool>>;

    fn list_tool_specs(&self) -> Vec<ToolSpec>;

    fn has_tool_id(&self, tool_id: &str) -> bool {
        self.get_bound_tool(tool_id).is_some()
    }
}

/// In-memory tool source. Thread-safe via Arc wrapping of individual tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn BoundTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Returns error if the name is already registered.
    pub fn register(&mut self, tool: impl BoundTool + 'static) -> Result<(), RegistryError> {
        let name = tool.spec().name.clone();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.tools.insert(name, Arc::new(tool));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolSource for ToolRegistry {
    fn get_bound_tool(&self, tool_id: &str) -> Option<Arc<dyn BoundTool>> {
        self.tools.get(tool_id).cloned()
    }

    fn list_tool_specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.spec().clone()).collect()
    }

    fn has_tool_id(&self, tool_id: &str) -> bool {
        self.tools.contains_key(tool_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool with name '{0}' is already registered")]
    DuplicateName(String),
}
