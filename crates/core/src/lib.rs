pub mod config;
pub mod error;
pub mod event;
pub mod identity;
pub mod tenant;
pub mod usage;

pub use config::{GantryConfig, HttpToolConfig, ModelConfig, PolicyConfig, RelayConfig};
pub use error::ErrorCode;
pub use event::{AiEvent, EventSink};
pub use identity::CallerIdentity;
pub use tenant::derive_thread_id;
pub use usage::{FinishReason, TokenUsage};
