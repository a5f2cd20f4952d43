//! Event types from the Claude Code bridge stream.
//!
//! This module defines all event types the bridge relays from Claude Code
//! running in non-interactive mode with `--output-format stream-json`.

use serde::{Deserialize, Serialize};

/// Session initialization data carried by `system`/`init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInit {
    /// Session identifier.
    pub session_id: String,
    /// Working directory the CLI was launched in.
    #[serde(default)]
    pub cwd: Option<String>,
    /// Model serving the session.
    #[serde(default)]
    pub model: Option<String>,
    /// Available tools for this session.
    #[serde(default)]
    pub tools: Vec<String>,
}

/// System events, discriminated by `subtype`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum SystemEvent {
    /// Session initialization.
    Init(SessionInit),
    /// Catch-all for unknown system subtypes.
    #[serde(other)]
    Unknown,
}

/// Message metadata from `message_start`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMeta {
    /// Message identifier, when the wire provides one.
    #[serde(default)]
    pub id: Option<String>,
}

/// Content block metadata from `content_block_start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text block.
    Text {
        /// Initial text, usually empty at block start.
        #[serde(default)]
        text: String,
    },
    /// Tool invocation block.
    ToolUse {
        /// Unique identifier for this tool use.
        id: String,
        /// Name of the tool being invoked.
        name: String,
        /// Tool input parameters.
        #[serde(default)]
        input: serde_json::Value,
    },
    /// Extended thinking block.
    Thinking {
        /// Initial thinking text.
        #[serde(default)]
        thinking: String,
    },
    /// Catch-all for unknown block types.
    #[serde(other)]
    Unknown,
}

/// The kind a content block opened with, tracked per index by the
/// dispatcher so deltas route without re-inspecting the start event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Plain text block.
    Text,
    /// Tool invocation block.
    ToolUse,
    /// Extended thinking block.
    Thinking,
    /// Unrecognized block type.
    Unknown,
}

impl BlockKind {
    /// Wire-format name of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::ToolUse => "tool_use",
            Self::Thinking => "thinking",
            Self::Unknown => "unknown",
        }
    }
}

impl ContentBlock {
    /// The kind this block opens as.
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Text { .. } => BlockKind::Text,
            Self::ToolUse { .. } => BlockKind::ToolUse,
            Self::Thinking { .. } => BlockKind::Thinking,
            Self::Unknown => BlockKind::Unknown,
        }
    }
}

/// Content delta types for streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    /// Text content delta.
    TextDelta {
        /// The text fragment.
        text: String,
    },
    /// Thinking content delta.
    ThinkingDelta {
        /// The thinking fragment.
        thinking: String,
    },
    /// JSON input delta (for tool inputs).
    InputJsonDelta {
        /// Partial JSON string.
        partial_json: String,
    },
    /// Catch-all for unknown delta types.
    #[serde(other)]
    Unknown,
}

/// Standalone tool use request data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseEvent {
    /// Unique identifier for this tool use.
    #[serde(alias = "tool_use_id")]
    pub id: String,
    /// Name of the tool being invoked.
    pub name: String,
    /// Tool input parameters.
    #[serde(default)]
    pub input: serde_json::Value,
}

/// Tool execution result data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultEvent {
    /// Identifier matching the original tool use.
    pub tool_use_id: String,
    /// Result content, either a plain string or structured blocks.
    #[serde(default)]
    pub content: serde_json::Value,
    /// Whether the tool reported failure.
    #[serde(default)]
    pub is_error: bool,
}

/// Summary data carried by a successful `result` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    /// Cost of the final turn in USD.
    #[serde(default)]
    pub cost_usd: Option<f64>,
    /// Total session cost in USD.
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
    /// Total duration in milliseconds.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Session identifier.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Failure data carried by an error `result` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultFailure {
    /// Error message; some CLI versions put it under `result` instead.
    #[serde(default, alias = "result")]
    pub error: Option<String>,
    /// Session identifier.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Final result events, discriminated by `subtype`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum ResultEvent {
    /// Session completed normally.
    Success(ResultSummary),
    /// Session ended with an error.
    #[serde(alias = "error_max_turns", alias = "error_during_execution")]
    Error(ResultFailure),
    /// Catch-all for unknown result subtypes.
    #[serde(other)]
    Unknown,
}

/// Events relayed by the bridge in stream-json format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// System event (initialization and friends).
    System(SystemEvent),
    /// Message start marker.
    MessageStart {
        /// Message metadata.
        #[serde(default)]
        message: MessageMeta,
    },
    /// Content block start marker.
    ContentBlockStart {
        /// Block index.
        index: usize,
        /// Block metadata.
        content_block: ContentBlock,
    },
    /// Streaming content delta.
    ContentBlockDelta {
        /// Block index.
        index: usize,
        /// Delta content.
        delta: ContentDelta,
    },
    /// Content block end marker.
    ContentBlockStop {
        /// Block index.
        index: usize,
    },
    /// Message end marker.
    MessageStop,
    /// Standalone tool use request.
    ToolUse(ToolUseEvent),
    /// Tool execution result.
    ToolResult(ToolResultEvent),
    /// Final result event.
    Result(ResultEvent),
    /// Echo of a user message (pass-through only).
    User {
        /// Message content (flexible structure).
        message: serde_json::Value,
    },
    /// Catch-all for unknown event types.
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Returns true if this is a terminal event (Result).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result(_))
    }

    /// Returns the tool name if this event carries a tool invocation.
    #[must_use]
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::ToolUse(tool_use) => Some(&tool_use.name),
            Self::ContentBlockStart {
                content_block: ContentBlock::ToolUse { name, .. },
                ..
            } => Some(name),
            _ => None,
        }
    }

    /// Returns the session ID if available.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::System(SystemEvent::Init(init)) => Some(&init.session_id),
            Self::Result(ResultEvent::Success(summary)) => summary.session_id.as_deref(),
            Self::Result(ResultEvent::Error(failure)) => failure.session_id.as_deref(),
            _ => None,
        }
    }
}
