//! Streaming session client.
//!
//! `StreamClient::connect` opens a bridge session and spawns one driver
//! task that pumps transport chunks through the reassembler, peels off
//! bridge control signals, and dispatches protocol events to the handler.
//! The returned `StreamConnection` is the caller's handle: cancel it, or
//! await its completion.

use std::sync::Arc;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::protocol::{parse_unit, EventDispatcher, FrameReassembler, Framing, StreamHandler};
use crate::transport::StreamTransport;

/// Request to open a streaming session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequest {
    /// Prompt to send to the CLI.
    pub message: String,
    /// Session to resume, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Project directory the CLI should run in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
}

impl StreamRequest {
    /// Create a request carrying just a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
            project_path: None,
        }
    }

    /// Resume an existing session.
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Run in a specific project directory.
    #[must_use]
    pub fn with_project_path(mut self, path: impl Into<String>) -> Self {
        self.project_path = Some(path.into());
        self
    }
}

/// Bridge control signals, carried in-band and decoded before any
/// protocol parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportSignal {
    /// The CLI process exited; the stream is over.
    StreamComplete {
        /// Process exit code.
        #[serde(rename = "exitCode", default)]
        exit_code: i32,
    },
    /// The bridge could not launch the CLI; the stream is over.
    SpawnError {
        /// Human-readable failure description.
        message: String,
        /// Machine code (e.g. `ENOENT`), when the bridge knows one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
}

impl TransportSignal {
    /// Try to decode a payload as a control signal.
    #[must_use]
    pub fn from_payload(payload: &str) -> Option<Self> {
        serde_json::from_str(payload).ok()
    }
}

/// Handle to a live streaming session.
///
/// Dropping the handle does not stop the driver; call [`cancel`] for
/// that, or [`completion`] to wait it out.
///
/// [`cancel`]: StreamConnection::cancel
/// [`completion`]: StreamConnection::completion
#[derive(Debug)]
pub struct StreamConnection {
    id: Uuid,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl StreamConnection {
    /// Connection identifier, as it appears in log lines.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get a clone of the cancellation token, for cancelling from
    /// somewhere that does not hold the connection.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the stream. Idempotent. After the driver observes this,
    /// no handler hook fires again.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the driver task to finish. Resolves on every terminal
    /// path: stream complete, end of body, transport failure, or
    /// cancellation.
    pub async fn completion(self) {
        if let Err(e) = self.task.await {
            if e.is_panic() {
                tracing::error!(connection_id = %self.id, "Stream driver panicked");
            }
        }
    }
}

/// Client that opens bridge sessions and drives them in the background.
#[derive(Debug)]
pub struct StreamClient<T> {
    transport: Arc<T>,
    framing: Framing,
}

impl<T: StreamTransport + 'static> StreamClient<T> {
    /// Create a client over a transport, speaking bare-line framing.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            framing: Framing::Lines,
        }
    }

    /// Select the wire framing.
    #[must_use]
    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Open a session and spawn its driver task.
    ///
    /// Returns immediately; every outcome, including a refused request,
    /// reaches the caller through the handler's hooks.
    pub fn connect<H>(&self, request: StreamRequest, handler: H) -> StreamConnection
    where
        H: StreamHandler + Send + 'static,
    {
        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();

        let driver = StreamDriver {
            id,
            transport: Arc::clone(&self.transport),
            framing: self.framing,
            cancel: cancel.clone(),
            dispatcher: EventDispatcher::new(handler),
        };
        let task = tokio::spawn(driver.run(request));

        StreamConnection { id, cancel, task }
    }
}

/// What to do after handling one payload.
enum PayloadAction {
    /// Keep reading.
    Continue,
    /// The stream is over; stop reading.
    Complete,
}

/// Per-connection pump: transport chunks in, handler hooks out.
struct StreamDriver<T, H> {
    id: Uuid,
    transport: Arc<T>,
    framing: Framing,
    cancel: CancellationToken,
    dispatcher: EventDispatcher<H>,
}

impl<T: StreamTransport, H: StreamHandler> StreamDriver<T, H> {
    async fn run(mut self, request: StreamRequest) {
        tracing::debug!(connection_id = %self.id, "Opening stream");

        let opened = tokio::select! {
            biased;

            () = self.cancel.cancelled() => {
                tracing::info!(connection_id = %self.id, "Stream cancelled before open");
                return;
            }
            result = self.transport.open(&request) => result,
        };

        let mut chunks = match opened {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(connection_id = %self.id, error = %e, "Failed to open stream");
                self.dispatcher.dispatch_transport_error(&e.to_string());
                return;
            }
        };

        let mut reassembler = FrameReassembler::new(self.framing);
        loop {
            let next = tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    tracing::info!(connection_id = %self.id, "Stream cancelled");
                    return;
                }
                chunk = chunks.next() => chunk,
            };

            match next {
                Some(Ok(chunk)) => {
                    for payload in reassembler.push(&chunk) {
                        // One chunk can complete several payloads; honor a
                        // cancel that lands between them.
                        if self.cancel.is_cancelled() {
                            tracing::info!(connection_id = %self.id, "Stream cancelled");
                            return;
                        }
                        if matches!(self.handle_payload(&payload), PayloadAction::Complete) {
                            return;
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(connection_id = %self.id, error = %e, "Stream read failed");
                    self.dispatcher.dispatch_transport_error(&e.to_string());
                    return;
                }
                None => break,
            }
        }

        if let Some(payload) = reassembler.finish() {
            if self.cancel.is_cancelled() {
                return;
            }
            let _ = self.handle_payload(&payload);
        }
        tracing::debug!(
            connection_id = %self.id,
            session_id = self.dispatcher.session_id().unwrap_or("unknown"),
            "Stream ended"
        );
    }

    fn handle_payload(&mut self, payload: &str) -> PayloadAction {
        if let Some(signal) = TransportSignal::from_payload(payload) {
            match signal {
                TransportSignal::StreamComplete { exit_code } => {
                    self.dispatcher.dispatch_stream_complete(exit_code);
                    return PayloadAction::Complete;
                }
                TransportSignal::SpawnError { message, code } => {
                    tracing::warn!(connection_id = %self.id, %message, "Bridge failed to spawn CLI");
                    self.dispatcher.dispatch_spawn_error(&message, code.as_deref());
                    return PayloadAction::Complete;
                }
            }
        }
        self.dispatcher.dispatch_unit(parse_unit(payload));
        PayloadAction::Continue
    }
}
