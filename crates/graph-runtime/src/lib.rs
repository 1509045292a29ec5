pub mod inproc;
pub mod model;
pub mod provider;
pub mod relay;
pub mod request;
pub mod router;

pub use inproc::{AgentGraph, InProcessProvider};
pub use model::{ModelClient, ModelError, ModelEvent, ModelTurnRequest};
pub use provider::{AiEventStream, GraphProvider, GraphRun};
pub use relay::{relay, RelayedRun};
pub use request::{
    AssistantTurn, GraphId, GraphIdError, GraphRunRequest, GraphRunResult, ThreadMessage,
    ToolCallRecord, ToolCallRequest,
};
pub use router::{GraphRouter, RouterError};
