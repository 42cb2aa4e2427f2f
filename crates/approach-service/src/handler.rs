//! Command handler contract.
//!
//! The protocol core ends at "deliver parsed invocation to handler". A
//! [`CommandHandler`] receives the decoded invocation together with a
//! [`ResponseSink`] it can emit intermediate responses through; the
//! dispatcher sends the trailing `readyForCommand` itself once the handler
//! returns.

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

use approach_core::wire::{FilePayload, Message};
use approach_core::invocation::Invocation;

/// Errors a command handler can surface.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HandlerError {
    /// The connection the handler was responding to has gone away.
    #[error("connection closed")]
    ConnectionClosed,

    /// The command ran but failed; the message is shown to the user.
    #[error("{0}")]
    Failed(String),
}

/// Executes invocations delivered by the session dispatcher.
///
/// Handlers run on a blocking worker, so they may perform synchronous work.
/// Output flows through the sink in the order it is emitted and is
/// serialized with the dispatcher's own messages on the connection.
pub trait CommandHandler: Send + Sync {
    /// Executes one invocation.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Failed`] to report a command failure to the
    /// user, or [`HandlerError::ConnectionClosed`] when output could not be
    /// delivered.
    fn execute(&self, invocation: &Invocation, sink: &ResponseSink) -> Result<(), HandlerError>;
}

/// Handle for emitting responses on one connection.
///
/// Cloneable; all clones feed the same per-connection writer, which frames
/// and sends messages in FIFO order.
#[derive(Debug, Clone)]
pub struct ResponseSink {
    tx: mpsc::UnboundedSender<Message>,
}

impl ResponseSink {
    /// Wraps the outbound channel of one connection.
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { tx }
    }

    /// Emits a chunk of console text.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::ConnectionClosed`] when the connection's
    /// writer is gone.
    pub fn console_output(&self, text: impl Into<String>) -> Result<(), HandlerError> {
        self.send(Message::console_output(text))
    }

    /// Emits raw image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::ConnectionClosed`] when the connection's
    /// writer is gone.
    pub fn screenshot(&self, image: impl Into<Bytes>) -> Result<(), HandlerError> {
        self.send(Message::screenshot(image))
    }

    /// Emits a named file.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::ConnectionClosed`] when the connection's
    /// writer is gone, or [`HandlerError::Failed`] when the payload fails to
    /// encode.
    pub fn file(&self, payload: &FilePayload) -> Result<(), HandlerError> {
        let message = Message::file(payload)
            .map_err(|e| HandlerError::Failed(format!("could not encode file payload: {e}")))?;
        self.send(message)
    }

    /// Emits an already-built message.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::ConnectionClosed`] when the connection's
    /// writer is gone.
    pub fn send(&self, message: Message) -> Result<(), HandlerError> {
        self.tx
            .send(message)
            .map_err(|_| HandlerError::ConnectionClosed)
    }
}
