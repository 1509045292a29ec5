use serde::{Deserialize, Serialize};

/// Token accounting reported by a model backend, accumulated per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Why a turn or run stopped producing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Normal end of response.
    EndTurn,
    /// The model requested tool execution.
    ToolUse,
    /// Hit the max token limit.
    MaxTokens,
    /// Stopped by a stop sequence.
    StopSequence,
    /// The run hit its model/tool iteration cap.
    IterationLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_accumulates() {
        let mut usage = TokenUsage::new(10, 5);
        usage.add(TokenUsage::new(2, 3));
        assert_eq!(usage.input_tokens, 12);
        assert_eq!(usage.output_tokens, 8);
        assert_eq!(usage.total(), 20);
    }

    #[test]
    fn test_finish_reason_wire_format() {
        let json = serde_json::to_string(&FinishReason::ToolUse).unwrap();
        assert_eq!(json, "\"tool_use\"");
    }
}
