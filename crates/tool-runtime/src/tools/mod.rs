//! Builtin tools, one per effect class. Each carries an explicit redaction
//! allowlist; raw outputs deliberately contain more than the caller sees.

pub mod clock;
pub mod http_fetch;
pub mod memo;

pub use clock::ClockNowTool;
pub use http_fetch::HttpFetchTool;
pub use memo::MemoStoreTool;
