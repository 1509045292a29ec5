pub mod catalog;
pub mod policy;
pub mod runner;
pub mod source;
pub mod tool;
pub mod tools;

pub use catalog::ToolCatalog;
pub use policy::{PolicyDecision, ToolPolicy};
pub use runner::{ToolInvocationError, ToolRunner};
pub use source::{RegistryError, ToolRegistry, ToolSource};
pub use tool::{
    BoundTool, InvocationContext, RedactionRule, ScratchStore, ToolCapabilities, ToolEffect,
    ToolError, ToolSpec,
};
pub use tools::{ClockNowTool, HttpFetchTool, MemoStoreTool};
