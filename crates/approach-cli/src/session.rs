//! Client session driver.
//!
//! One session is the lifetime of one established, handshaked connection:
//! connect, handshake, wait for `generalInfo`, fetch the catalog, then
//! alternate between reading command lines and rendering the typed
//! responses the service streams back.
//!
//! Parser errors never end the session; they are printed and the user types
//! another line. Transport errors end the session and the caller decides
//! whether to reconnect.

use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use futures::stream::StreamExt;
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use approach_core::catalog::CommandsSpecification;
use approach_core::info::HostInfo;
use approach_core::parser::{ParseError, evaluate};
use approach_core::usage::render_usage;
use approach_core::wire::{
    FilePayload, FrameCodec, Message, MessageType, TransportError, handshake_as_client,
};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The service closed the connection; reconnecting is reasonable.
    Disconnected,
    /// The user closed the input; the client should exit.
    InputClosed,
}

/// One client session against a resolved service address.
pub struct ClientSession {
    instance_name: String,
    addr: SocketAddr,
    output_dir: PathBuf,
}

impl ClientSession {
    /// Creates a session description; nothing connects until [`run`].
    ///
    /// [`run`]: ClientSession::run
    #[must_use]
    pub fn new(instance_name: impl Into<String>, addr: SocketAddr, output_dir: PathBuf) -> Self {
        Self {
            instance_name: instance_name.into(),
            addr,
            output_dir,
        }
    }

    /// Connects, handshakes, and drives the session to its end.
    ///
    /// # Errors
    ///
    /// Returns the [`TransportError`] that tore the session down; a clean
    /// disconnect or closed input is a [`SessionEnd`], not an error.
    pub async fn run(
        &self,
        lines: &mut mpsc::Receiver<String>,
    ) -> Result<SessionEnd, TransportError> {
        let mut stream = TcpStream::connect(self.addr).await?;
        handshake_as_client(&mut stream).await?;
        debug!(addr = %self.addr, "handshake complete");

        let mut framed = Framed::new(stream, FrameCodec::new());

        // The service speaks first.
        let info = self.wait_for_general_info(&mut framed).await?;
        println!(
            "Connected to {} ({}, version {})",
            info.instance_name, info.system, info.version
        );

        framed.send(Message::list_commands().to_frame()?).await?;
        let specification = self.wait_for_specification(&mut framed).await?;
        debug!(
            commands = specification.commands.len(),
            "received command catalog"
        );

        loop {
            let Some(frame) = framed.next().await else {
                return Ok(SessionEnd::Disconnected);
            };
            let message = Message::from_frame(&frame?)?;

            match message.message_type() {
                MessageType::ReadyForCommand => {
                    match self.read_invocation(&specification, lines).await {
                        Some(invocation_message) => {
                            framed.send(invocation_message.to_frame()?).await?;
                        },
                        None => return Ok(SessionEnd::InputClosed),
                    }
                },
                MessageType::ConsoleOutput => {
                    println!("{}", message.payload_utf8()?);
                },
                MessageType::Screenshot => {
                    self.save_screenshot(&message);
                },
                MessageType::File => {
                    self.save_file(&message);
                },
                other => {
                    debug!(message_type = %other, "ignoring message");
                },
            }
        }
    }

    /// Blocks on the line channel until a line parses into an invocation.
    ///
    /// Returns `None` when the input channel closed.
    async fn read_invocation(
        &self,
        specification: &CommandsSpecification,
        lines: &mut mpsc::Receiver<String>,
    ) -> Option<Message> {
        loop {
            print!("{}> ", self.instance_name);
            let _ = std::io::stdout().flush();

            let line = lines.recv().await?;
            if line.trim().is_empty() {
                continue;
            }

            match evaluate(&line, &specification.commands) {
                Ok(invocation) => match Message::execute_command(&invocation) {
                    Ok(message) => return Some(message),
                    Err(e) => {
                        warn!("could not encode invocation: {e}");
                    },
                },
                Err(ParseError::UsageRequested { root, target }) => {
                    print!("{}", render_usage(&root, target.as_deref()));
                },
                Err(e) => {
                    println!("error: {e}");
                },
            }
        }
    }

    async fn wait_for_general_info(
        &self,
        framed: &mut Framed<TcpStream, FrameCodec>,
    ) -> Result<HostInfo, TransportError> {
        loop {
            let Some(frame) = framed.next().await else {
                return Err(TransportError::NoConnection);
            };
            let message = Message::from_frame(&frame?)?;
            match message.message_type() {
                MessageType::GeneralInfo => {
                    return HostInfo::decode(&message.payload)
                        .map_err(|_| TransportError::CorruptMessage);
                },
                other => {
                    debug!(message_type = %other, "ignoring message before generalInfo");
                },
            }
        }
    }

    async fn wait_for_specification(
        &self,
        framed: &mut Framed<TcpStream, FrameCodec>,
    ) -> Result<CommandsSpecification, TransportError> {
        loop {
            let Some(frame) = framed.next().await else {
                return Err(TransportError::NoConnection);
            };
            let message = Message::from_frame(&frame?)?;
            match message.message_type() {
                MessageType::CommandsSpecification => {
                    return CommandsSpecification::decode(&message.payload).map_err(|e| {
                        warn!("rejecting command catalog: {e}");
                        TransportError::CorruptMessage
                    });
                },
                other => {
                    debug!(message_type = %other, "ignoring message before catalog");
                },
            }
        }
    }

    fn save_screenshot(&self, message: &Message) {
        let path = self
            .output_dir
            .join(format!("screenshot-{}.png", unique_stamp()));
        match std::fs::write(&path, &message.payload) {
            Ok(()) => println!("saved screenshot to {}", path.display()),
            Err(e) => println!("error: could not save screenshot: {e}"),
        }
    }

    fn save_file(&self, message: &Message) {
        let payload = match FilePayload::decode(&message.payload) {
            Ok(payload) => payload,
            Err(e) => {
                println!("error: malformed file payload: {e}");
                return;
            },
        };
        let path = self.output_dir.join(sanitize_filename(&payload.filename));
        match std::fs::write(&path, &payload.filedata) {
            Ok(()) => println!("saved {} to {}", payload.filename, path.display()),
            Err(e) => println!("error: could not save file: {e}"),
        }
    }
}

/// Strips any path components a peer-supplied filename may carry.
fn sanitize_filename(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .unwrap_or_else(|| "download.bin".to_string())
}

/// A filesystem-friendly unique stamp for generated filenames.
fn unique_stamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}-{:03}", now.as_secs(), now.subsec_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("/etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("../../escape.txt"), "escape.txt");
    }

    #[test]
    fn sanitize_rejects_empty_names() {
        assert_eq!(sanitize_filename(""), "download.bin");
        assert_eq!(sanitize_filename("/"), "download.bin");
        assert_eq!(sanitize_filename(".."), "download.bin");
    }
}
