//! Frame transport and message envelope.
//!
//! The transport stack, bottom-up:
//!
//! ```text
//! +------------------------------------------+
//! |  Application documents                    |  catalog / invocation / info
//! +------------------------------------------+
//! |  Message envelope                         |  (metadata: messageType, payload)
//! +------------------------------------------+
//! |  Handshake                                |  APPSERVICEV0001 / APPCLIENTV0001
//! +------------------------------------------+
//! |  Framing                                  |  i16 metadata len + i32 payload len, LE
//! +------------------------------------------+
//! |  TCP stream                               |  service-discovered
//! +------------------------------------------+
//! ```
//!
//! - [`framing`]: length-framed codec ([`FrameCodec`], [`Frame`])
//! - [`handshake`]: two-phase version exchange
//! - [`state`]: connection lifecycle ([`ConnectionState`])
//! - [`error`]: transport errors ([`TransportError`])
//!
//! The envelope metadata carries exactly one field of interest: the message
//! type discriminant. Unknown message types decode to
//! [`MessageType::Unknown`] and are ignored by dispatch rather than
//! treated as fatal.

pub mod error;
pub mod framing;
pub mod handshake;
pub mod state;

pub use error::{MAX_PAYLOAD_LENGTH, TransportError};
pub use framing::{Frame, FrameCodec};
pub use handshake::{CLIENT_HANDSHAKE, SERVICE_HANDSHAKE, handshake_as_client, handshake_as_service};
pub use state::{ConnectionState, ConnectionStateError};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::catalog::CommandsSpecification;
use crate::info::HostInfo;
use crate::invocation::Invocation;
use crate::value::base64_bytes;

/// Message type discriminants carried in frame metadata.
///
/// Serialized as the protocol's string names; a name this version does not
/// recognize deserializes to [`MessageType::Unknown`] so receivers can skip
/// it instead of failing the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Client asks for the command catalog. Empty payload.
    ListCommands,
    /// Client dispatches a parsed invocation.
    ExecuteCommand,
    /// Service introduces itself after the handshake.
    GeneralInfo,
    /// Service delivers the command catalog.
    CommandsSpecification,
    /// Service streams a chunk of console text.
    ConsoleOutput,
    /// Service delivers raw image bytes.
    Screenshot,
    /// Service signals it can accept the next command.
    ReadyForCommand,
    /// Service delivers a named file.
    File,
    /// Any discriminant this version does not know. Ignored by dispatch.
    Unknown,
}

impl MessageType {
    /// The protocol's string name for this discriminant.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ListCommands => "listCommands",
            Self::ExecuteCommand => "executeCommand",
            Self::GeneralInfo => "generalInfo",
            Self::CommandsSpecification => "commandsSpecification",
            Self::ConsoleOutput => "consoleOutput",
            Self::Screenshot => "screenshot",
            Self::ReadyForCommand => "readyForCommand",
            Self::File => "file",
            Self::Unknown => "unknown",
        }
    }

    fn from_name(name: &str) -> Self {
        match name {
            "listCommands" => Self::ListCommands,
            "executeCommand" => Self::ExecuteCommand,
            "generalInfo" => Self::GeneralInfo,
            "commandsSpecification" => Self::CommandsSpecification,
            "consoleOutput" => Self::ConsoleOutput,
            "screenshot" => Self::Screenshot,
            "readyForCommand" => Self::ReadyForCommand,
            "file" => Self::File,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for MessageType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// Frame metadata: the message-type envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Discriminant typing the payload.
    pub message_type: MessageType,
}

/// Payload of a `file` message: a filename paired with its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePayload {
    /// Suggested filename for the receiver.
    pub filename: String,
    /// File contents, base64 on the wire.
    #[serde(with = "base64_bytes")]
    pub filedata: Vec<u8>,
}

impl FilePayload {
    /// Encodes the payload for transport.
    ///
    /// # Errors
    ///
    /// Returns the underlying serialization error.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes a `file` message payload.
    ///
    /// # Errors
    ///
    /// Returns the underlying deserialization error.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// One typed wire message: metadata plus payload.
///
/// The constructors produce the exact payload shape each message type
/// carries: empty, raw bytes, a UTF-8 string, or an encoded structured
/// document.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Envelope metadata.
    pub metadata: Metadata,
    /// Typed payload; may be empty.
    pub payload: Bytes,
}

impl Message {
    fn new(message_type: MessageType, payload: Bytes) -> Self {
        Self {
            metadata: Metadata { message_type },
            payload,
        }
    }

    /// The message's type discriminant.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.metadata.message_type
    }

    /// A `listCommands` request. Empty payload.
    #[must_use]
    pub fn list_commands() -> Self {
        Self::new(MessageType::ListCommands, Bytes::new())
    }

    /// A `readyForCommand` signal. Empty payload.
    #[must_use]
    pub fn ready_for_command() -> Self {
        Self::new(MessageType::ReadyForCommand, Bytes::new())
    }

    /// An `executeCommand` message carrying an encoded invocation.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unknown`] when the invocation fails to
    /// encode.
    pub fn execute_command(invocation: &Invocation) -> Result<Self, TransportError> {
        let payload = invocation
            .encode()
            .map_err(|_| TransportError::Unknown)?;
        Ok(Self::new(MessageType::ExecuteCommand, payload.into()))
    }

    /// A `generalInfo` message carrying the host info document.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unknown`] when the document fails to
    /// encode.
    pub fn general_info(info: &HostInfo) -> Result<Self, TransportError> {
        let payload = info.encode().map_err(|_| TransportError::Unknown)?;
        Ok(Self::new(MessageType::GeneralInfo, payload.into()))
    }

    /// A `commandsSpecification` message carrying the encoded catalog.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unknown`] when the catalog fails to encode.
    pub fn commands_specification(
        specification: &CommandsSpecification,
    ) -> Result<Self, TransportError> {
        let payload = specification
            .encode()
            .map_err(|_| TransportError::Unknown)?;
        Ok(Self::new(MessageType::CommandsSpecification, payload.into()))
    }

    /// A `consoleOutput` message carrying UTF-8 text.
    #[must_use]
    pub fn console_output(text: impl Into<String>) -> Self {
        Self::new(MessageType::ConsoleOutput, text.into().into_bytes().into())
    }

    /// A `screenshot` message carrying raw image bytes.
    #[must_use]
    pub fn screenshot(image: impl Into<Bytes>) -> Self {
        Self::new(MessageType::Screenshot, image.into())
    }

    /// A `file` message carrying an encoded filename/contents document.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unknown`] when the payload fails to encode.
    pub fn file(payload: &FilePayload) -> Result<Self, TransportError> {
        let bytes = payload.encode().map_err(|_| TransportError::Unknown)?;
        Ok(Self::new(MessageType::File, bytes.into()))
    }

    /// Frames the message for transport.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::CorruptMessage`] when the metadata fails to
    /// encode.
    pub fn to_frame(&self) -> Result<Frame, TransportError> {
        let metadata =
            serde_json::to_vec(&self.metadata).map_err(|_| TransportError::CorruptMessage)?;
        Ok(Frame::new(metadata, self.payload.clone()))
    }

    /// Interprets a received frame as a typed message.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::CorruptMessage`] when the metadata is not a
    /// valid envelope. An envelope with an unrecognized discriminant decodes
    /// successfully as [`MessageType::Unknown`].
    pub fn from_frame(frame: &Frame) -> Result<Self, TransportError> {
        let metadata: Metadata = serde_json::from_slice(&frame.metadata)
            .map_err(|_| TransportError::CorruptMessage)?;
        Ok(Self {
            metadata,
            payload: frame.payload.clone(),
        })
    }

    /// The payload as UTF-8 text (for `consoleOutput`).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::CorruptMessage`] when the payload is not
    /// valid UTF-8.
    pub fn payload_utf8(&self) -> Result<&str, TransportError> {
        std::str::from_utf8(&self.payload).map_err(|_| TransportError::CorruptMessage)
    }
}
