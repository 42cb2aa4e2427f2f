//! Inbound message dispatch for one established session.
//!
//! Routes each decoded frame by its message type:
//!
//! - `listCommands` answers with `commandsSpecification` followed by
//!   `readyForCommand`.
//! - `executeCommand` decodes the invocation, hands it to the configured
//!   [`CommandHandler`] on a blocking worker, and follows up with
//!   `readyForCommand`. Handler output is interleaved through the shared
//!   [`ResponseSink`].
//! - Unknown message types are logged and ignored, never fatal.
//!
//! Invocation decode failures are fatal to the message, not the session:
//! the user gets a console line and the session keeps going.

use std::sync::Arc;

use tracing::{debug, warn};

use approach_core::catalog::CommandsSpecification;
use approach_core::info::HostInfo;
use approach_core::invocation::Invocation;
use approach_core::wire::{Message, MessageType, TransportError};

use crate::handler::{CommandHandler, HandlerError, ResponseSink};

/// Immutable service-wide state shared by every session.
pub struct ServiceState {
    /// Host info sent unsolicited on connect.
    pub info: HostInfo,
    /// The advertised command catalog.
    pub specification: CommandsSpecification,
    /// Handler receiving every decoded invocation.
    pub handler: Arc<dyn CommandHandler>,
}

/// Per-session dispatcher over the shared service state.
pub struct SessionDispatcher {
    state: Arc<ServiceState>,
}

impl SessionDispatcher {
    /// Creates a dispatcher for one session.
    #[must_use]
    pub fn new(state: Arc<ServiceState>) -> Self {
        Self { state }
    }

    /// Sends the unsolicited `generalInfo` a service opens with.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the document cannot be encoded or the
    /// connection writer is gone.
    pub fn send_general_info(&self, sink: &ResponseSink) -> Result<(), TransportError> {
        sink.send(Message::general_info(&self.state.info)?)
            .map_err(|_| TransportError::NoConnection)
    }

    /// Routes one inbound message.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NoConnection`] when a response could not be
    /// queued; the session should tear down.
    pub async fn dispatch(
        &self,
        message: Message,
        sink: &ResponseSink,
    ) -> Result<(), TransportError> {
        match message.message_type() {
            MessageType::ListCommands => self.handle_list_commands(sink),
            MessageType::ExecuteCommand => self.handle_execute_command(&message, sink).await,
            other => {
                debug!(message_type = %other, "ignoring unexpected message");
                Ok(())
            },
        }
    }

    fn handle_list_commands(&self, sink: &ResponseSink) -> Result<(), TransportError> {
        debug!("sending commands specification");
        let specification = Message::commands_specification(&self.state.specification)?;
        sink.send(specification)
            .map_err(|_| TransportError::NoConnection)?;
        sink.send(Message::ready_for_command())
            .map_err(|_| TransportError::NoConnection)
    }

    async fn handle_execute_command(
        &self,
        message: &Message,
        sink: &ResponseSink,
    ) -> Result<(), TransportError> {
        match Invocation::decode(&message.payload) {
            Ok(invocation) => {
                debug!(commands = ?invocation.commands, "executing command");
                self.run_handler(invocation, sink).await;
            },
            Err(e) => {
                // Fatal to the message only; the session continues.
                warn!("rejecting execute request: {e}");
                let _ = sink.console_output(format!("error: {e}"));
            },
        }
        sink.send(Message::ready_for_command())
            .map_err(|_| TransportError::NoConnection)
    }

    async fn run_handler(&self, invocation: Invocation, sink: &ResponseSink) {
        let handler = Arc::clone(&self.state.handler);
        let handler_sink = sink.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            handler.execute(&invocation, &handler_sink)
        })
        .await;

        match outcome {
            Ok(Ok(())) => {},
            Ok(Err(HandlerError::ConnectionClosed)) => {
                debug!("handler output dropped: connection closed");
            },
            Ok(Err(HandlerError::Failed(reason))) => {
                let _ = sink.console_output(format!("error: {reason}"));
            },
            Err(e) => {
                warn!("handler task failed: {e}");
                let _ = sink.console_output("error: command handler failed");
            },
        }
    }
}
