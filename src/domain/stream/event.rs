//! Typed events of an assistant response stream.

use serde::{Deserialize, Serialize};

/// Token counters reported by the provider for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// One event of an assistant run, in provider emission order.
///
/// `End` and `Error` are terminal: nothing follows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The assistant started a new text part.
    TextCreated,

    /// A fragment of assistant text.
    TextDelta { value: String },

    /// The assistant started a tool call.
    ToolCallCreated { id: String, kind: String },

    /// Incremental payload of a tool call (arguments, code input, logs).
    ToolCallDelta {
        id: Option<String>,
        index: u32,
        delta: serde_json::Value,
    },

    /// The run completed.
    End {
        model: String,
        usage: Option<TokenUsage>,
    },

    /// The run failed; no settlement follows.
    Error { code: String, message: String },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::End { .. } | StreamEvent::Error { .. })
    }

    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::TextCreated => "text_created",
            StreamEvent::TextDelta { .. } => "text_delta",
            StreamEvent::ToolCallCreated { .. } => "tool_call_created",
            StreamEvent::ToolCallDelta { .. } => "tool_call_delta",
            StreamEvent::End { .. } => "end",
            StreamEvent::Error { .. } => "error",
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        StreamEvent::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}
