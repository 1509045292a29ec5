use std::fmt;

use serde::{Deserialize, Serialize};

/// Error taxonomy shared by the tool pipeline and the graph contract.
///
/// Every failure surfaced to a caller carries one of these codes, both in
/// structured results and in `error` events on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed input from the caller (bad graph id shape, missing state key).
    InvalidRequest,
    /// Well-formed but unknown target (unknown graph, unknown tool).
    NotFound,
    /// The target exists but the active policy forbids it.
    PolicyDenied,
    /// Input or output failed schema/shape validation.
    Validation,
    /// The tool's or provider's business logic failed.
    Execution,
    /// The redaction step itself failed. Fail-closed: the unredacted value
    /// must never appear in the propagated error or event.
    RedactionFailed,
    /// The tool id could not be resolved through the tool source.
    Unavailable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::NotFound => "not_found",
            ErrorCode::PolicyDenied => "policy_denied",
            ErrorCode::Validation => "validation",
            ErrorCode::Execution => "execution",
            ErrorCode::RedactionFailed => "redaction_failed",
            ErrorCode::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_is_snake_case() {
        let json = serde_json::to_string(&ErrorCode::PolicyDenied).unwrap();
        assert_eq!(json, "\"policy_denied\"");
        let code: ErrorCode = serde_json::from_str("\"redaction_failed\"").unwrap();
        assert_eq!(code, ErrorCode::RedactionFailed);
    }

    #[test]
    fn test_display_matches_wire_format() {
        assert_eq!(ErrorCode::InvalidRequest.to_string(), "invalid_request");
        assert_eq!(ErrorCode::Unavailable.to_string(), "unavailable");
    }
}
