//! Stateful event dispatch to caller-supplied handlers.
//!
//! The dispatcher owns the per-stream block state so handlers stay
//! stateless: it remembers what kind each content block opened with,
//! routes deltas accordingly, and classifies failures before they reach
//! the structured error hook.

use std::collections::HashMap;

use serde_json::Value;

use crate::classify::{ClassifiedError, ErrorClassifier};
use crate::protocol::{
    BlockKind, ContentBlock, ContentDelta, ParsedUnit, ResultEvent, ResultSummary, StreamEvent,
    SystemEvent,
};

/// Receiver of dispatched stream events.
///
/// Every method has a no-op default, so implementations override only the
/// hooks they care about. Hooks fire in stream order; `on_event` fires
/// first for every decoded event, before the typed hook for that event.
#[allow(unused_variables)]
pub trait StreamHandler {
    /// Raw pass-through of every decoded event.
    fn on_event(&mut self, event: &StreamEvent) {}

    /// Session initialization.
    fn on_session_init(&mut self, session_id: &str, model: Option<&str>) {}

    /// Assistant message started; `message_id` is empty when the wire
    /// carried none.
    fn on_message_start(&mut self, message_id: &str) {}

    /// A content block opened at `index`.
    fn on_content_block_start(&mut self, index: usize, kind: BlockKind, block: &ContentBlock) {}

    /// Text fragment for the block at `index`.
    fn on_text_delta(&mut self, text: &str, index: usize) {}

    /// Thinking fragment for the block at `index`.
    fn on_thinking_delta(&mut self, thinking: &str, index: usize) {}

    /// The content block at `index` closed.
    fn on_content_block_stop(&mut self, index: usize) {}

    /// A tool invocation, either from a `tool_use` block start or a
    /// standalone `tool_use` event.
    fn on_tool_use(&mut self, id: &str, name: &str, input: &Value) {}

    /// A tool finished; `content` is a plain string or structured blocks.
    fn on_tool_result(&mut self, tool_use_id: &str, content: &Value, is_error: bool) {}

    /// Assistant message finished.
    fn on_message_stop(&mut self) {}

    /// Session completed normally.
    fn on_result_success(&mut self, summary: &ResultSummary) {}

    /// Session ended with an error (legacy hook; `on_error` carries the
    /// classified form).
    fn on_result_error(&mut self, message: &str) {}

    /// The bridge failed to launch the CLI (legacy hook).
    fn on_spawn_error(&mut self, message: &str) {}

    /// Classified form of every failure path: parse failures, transport
    /// failures, error results, spawn errors.
    fn on_error(&mut self, error: &ClassifiedError) {}

    /// The bridge reported the CLI process exited.
    fn on_stream_complete(&mut self, exit_code: i32) {}
}

/// Dispatches parsed units to a handler, tracking block state per stream.
pub struct EventDispatcher<H> {
    handler: H,
    classifier: ErrorClassifier,
    /// Kind each currently open content block started with, by index.
    open_blocks: HashMap<usize, BlockKind>,
    /// Accumulated `input_json_delta` fragments, by block index. Kept
    /// internal and dropped when the block closes; no hook surfaces it.
    partial_inputs: HashMap<usize, String>,
    session_id: Option<String>,
}

impl<H: StreamHandler> EventDispatcher<H> {
    /// Create a dispatcher with the default classification rules.
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self::with_classifier(handler, ErrorClassifier::with_default_rules())
    }

    /// Create a dispatcher with a caller-supplied classifier.
    #[must_use]
    pub fn with_classifier(handler: H, classifier: ErrorClassifier) -> Self {
        Self {
            handler,
            classifier,
            open_blocks: HashMap::new(),
            partial_inputs: HashMap::new(),
            session_id: None,
        }
    }

    /// Dispatch one parsed unit.
    ///
    /// Ignorable units vanish; failed units are logged, classified, and
    /// reported through `on_error` without stopping the stream.
    pub fn dispatch_unit(&mut self, unit: ParsedUnit) {
        match unit {
            ParsedUnit::Event(event) => self.dispatch(&event),
            ParsedUnit::Ignorable => {}
            ParsedUnit::Failed { reason, raw } => {
                let preview: String = raw.chars().take(120).collect();
                tracing::warn!(%reason, payload = %preview, "Skipping malformed stream payload");
                // Classify the payload itself, not the parse diagnostic: a
                // non-JSON line is often an error message leaked into the
                // stream, and those classify usefully.
                let error = self.classifier.classify(&raw, None);
                self.handler.on_error(&error);
            }
        }
    }

    /// Dispatch one decoded event to the handler.
    pub fn dispatch(&mut self, event: &StreamEvent) {
        if let Some(id) = event.session_id() {
            self.session_id = Some(id.to_string());
        }

        self.handler.on_event(event);

        match event {
            StreamEvent::System(SystemEvent::Init(init)) => {
                tracing::info!(
                    session_id = %init.session_id,
                    model = init.model.as_deref().unwrap_or("unknown"),
                    "Session initialized"
                );
                self.handler
                    .on_session_init(&init.session_id, init.model.as_deref());
            }
            StreamEvent::MessageStart { message } => {
                self.handler
                    .on_message_start(message.id.as_deref().unwrap_or(""));
            }
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => self.open_block(*index, content_block),
            StreamEvent::ContentBlockDelta { index, delta } => self.route_delta(*index, delta),
            StreamEvent::ContentBlockStop { index } => self.close_block(*index),
            StreamEvent::MessageStop => self.handler.on_message_stop(),
            StreamEvent::ToolUse(tool_use) => {
                tracing::debug!(id = %tool_use.id, tool = %tool_use.name, "Tool use");
                self.handler
                    .on_tool_use(&tool_use.id, &tool_use.name, &tool_use.input);
            }
            StreamEvent::ToolResult(result) => {
                tracing::debug!(
                    tool_use_id = %result.tool_use_id,
                    is_error = result.is_error,
                    "Tool result"
                );
                self.handler
                    .on_tool_result(&result.tool_use_id, &result.content, result.is_error);
            }
            StreamEvent::Result(ResultEvent::Success(summary)) => {
                tracing::info!(
                    session_id = summary.session_id.as_deref().unwrap_or("unknown"),
                    cost_usd = ?summary.cost_usd,
                    "Session completed"
                );
                self.handler.on_result_success(summary);
            }
            StreamEvent::Result(ResultEvent::Error(failure)) => {
                let message = failure.error.as_deref().unwrap_or("Unknown error");
                self.handler.on_result_error(message);
                let error = self.classifier.classify(message, None);
                self.handler.on_error(&error);
            }
            StreamEvent::Result(ResultEvent::Unknown) => {
                tracing::debug!("Result event with unrecognized subtype");
            }
            // Echoes and unrecognized types reach only the raw hook.
            StreamEvent::System(SystemEvent::Unknown)
            | StreamEvent::User { .. }
            | StreamEvent::Unknown => {}
        }
    }

    /// The bridge reported the CLI process exited.
    pub fn dispatch_stream_complete(&mut self, exit_code: i32) {
        tracing::info!(exit_code, "Stream complete");
        self.handler.on_stream_complete(exit_code);
    }

    /// The bridge failed to launch the CLI.
    pub fn dispatch_spawn_error(&mut self, message: &str, code: Option<&str>) {
        self.handler.on_spawn_error(message);
        let error = self.classifier.classify(message, code);
        self.handler.on_error(&error);
    }

    /// A transport-level failure; fires the legacy result hook and the
    /// classified hook, in that order.
    pub fn dispatch_transport_error(&mut self, message: &str) {
        self.handler.on_result_error(message);
        let error = self.classifier.classify(message, None);
        self.handler.on_error(&error);
    }

    fn open_block(&mut self, index: usize, block: &ContentBlock) {
        let kind = block.kind();
        if self.open_blocks.insert(index, kind).is_some() {
            tracing::warn!(index, "Content block reopened without a stop");
            self.partial_inputs.remove(&index);
        }
        tracing::trace!(index, kind = kind.as_str(), "Content block started");
        // Tool identity is complete at block start, so the tool hook does
        // not wait for the block to finish.
        if let ContentBlock::ToolUse { id, name, input } = block {
            tracing::debug!(%id, tool = %name, "Tool use");
            self.handler.on_tool_use(id, name, input);
        }
        self.handler.on_content_block_start(index, kind, block);
    }

    fn route_delta(&mut self, index: usize, delta: &ContentDelta) {
        if !self.open_blocks.contains_key(&index) {
            tracing::warn!(index, "Delta for a block that never started");
        }
        match delta {
            ContentDelta::TextDelta { text } => self.handler.on_text_delta(text, index),
            ContentDelta::ThinkingDelta { thinking } => {
                self.handler.on_thinking_delta(thinking, index);
            }
            ContentDelta::InputJsonDelta { partial_json } => {
                let buffer = self.partial_inputs.entry(index).or_default();
                buffer.push_str(partial_json);
                tracing::trace!(index, total = buffer.len(), "Accumulated tool input fragment");
            }
            ContentDelta::Unknown => {
                tracing::debug!(index, "Unrecognized delta type");
            }
        }
    }

    fn close_block(&mut self, index: usize) {
        if self.open_blocks.remove(&index).is_none() {
            tracing::warn!(index, "Stop for a block that never started");
        }
        if let Some(input) = self.partial_inputs.remove(&index) {
            tracing::trace!(index, bytes = input.len(), "Discarding accumulated tool input");
        }
        self.handler.on_content_block_stop(index);
    }

    /// Number of content blocks currently open.
    #[must_use]
    pub fn open_block_count(&self) -> usize {
        self.open_blocks.len()
    }

    /// The session ID, once an event has carried one.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Consume the dispatcher, returning the handler.
    pub fn into_handler(self) -> H {
        self.handler
    }
}
