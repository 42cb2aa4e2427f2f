//! Per-connection session driver.
//!
//! Each accepted TCP stream gets one [`Connection`], identified for its
//! whole life by a [`ConnectionId`]. The connection performs the service
//! side of the version handshake, then splits the framed stream: inbound
//! frames are decoded and dispatched on the connection task, outbound
//! messages flow through an unbounded channel drained by a single writer
//! task, so writes on one connection are serialized and framed atomically
//! in FIFO order.

use futures::stream::StreamExt;
use futures::SinkExt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, warn};
use uuid::Uuid;

use approach_core::wire::{
    ConnectionState, Frame, FrameCodec, Message, TransportError, handshake_as_service,
};

use crate::dispatch::{ServiceState, SessionDispatcher};
use crate::handler::ResponseSink;

/// Stable identity of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generates a fresh identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// One service-side connection, single-use.
pub struct Connection {
    id: ConnectionId,
    state: ConnectionState,
}

impl Connection {
    /// Creates a connection in its initial lifecycle state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ConnectionId::generate(),
            state: ConnectionState::Setup,
        }
    }

    /// The connection's stable identity.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// The connection's current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Drives the connection to completion: handshake, `generalInfo`, then
    /// the receive loop. Ends with the connection cancelled.
    ///
    /// # Errors
    ///
    /// Returns the [`TransportError`] that ended the session, if any; a
    /// clean peer disconnect is not an error.
    pub async fn drive(
        mut self,
        stream: TcpStream,
        service: Arc<ServiceState>,
    ) -> Result<(), TransportError> {
        let result = self.run(stream, service).await;

        if let Err(e) = &result {
            warn!(connection = %self.id, "session ended with error: {e}");
            self.state = self
                .state
                .fail()
                .unwrap_or(ConnectionState::Failed);
        }
        self.state = self.state.cancel().unwrap_or(ConnectionState::Cancelled);
        debug!(connection = %self.id, "connection cancelled");

        result
    }

    async fn run(
        &mut self,
        mut stream: TcpStream,
        service: Arc<ServiceState>,
    ) -> Result<(), TransportError> {
        self.state = self
            .state
            .advance_to_preparing()
            .map_err(|_| TransportError::Unknown)?;
        self.state = self
            .state
            .advance_to_ready()
            .map_err(|_| TransportError::Unknown)?;

        self.state = self
            .state
            .advance_to_handshaking()
            .map_err(|_| TransportError::Unknown)?;
        handshake_as_service(&mut stream).await?;
        self.state = self
            .state
            .advance_to_established()
            .map_err(|_| TransportError::Unknown)?;
        debug!(connection = %self.id, "handshake complete");

        let framed = Framed::new(stream, FrameCodec::new());
        let (frame_sink, mut frames) = framed.split();

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_loop(frame_sink, rx));
        let sink = ResponseSink::new(tx);

        let dispatcher = SessionDispatcher::new(service);
        let result = async {
            dispatcher.send_general_info(&sink)?;

            while let Some(inbound) = frames.next().await {
                let frame = inbound?;
                let message = Message::from_frame(&frame)?;
                dispatcher.dispatch(message, &sink).await?;
            }
            Ok(())
        }
        .await;

        // Dropping the sink lets the writer drain queued messages and exit.
        drop(sink);
        match writer.await {
            Ok(Ok(())) => result,
            Ok(Err(write_error)) => result.and(Err(write_error)),
            Err(_) => result.and(Err(TransportError::Unknown)),
        }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

/// Drains the outbound queue onto the wire, one frame at a time.
async fn write_loop<S>(
    mut sink: S,
    mut rx: mpsc::UnboundedReceiver<Message>,
) -> Result<(), TransportError>
where
    S: futures::Sink<Frame, Error = TransportError> + Unpin,
{
    while let Some(message) = rx.recv().await {
        let frame = message.to_frame()?;
        sink.send(frame).await?;
    }
    Ok(())
}
