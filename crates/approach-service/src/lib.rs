//! # approach-service
//!
//! Host service for the approach remote-control console. The service
//! listens on a TCP socket, advertises itself through a discovery
//! collaborator, performs the protocol handshake on every accepted
//! connection, and dispatches inbound commands to a registered
//! [`handler::CommandHandler`].
//!
//! # Modules
//!
//! - [`server`]: TCP listener and connection registry
//! - [`connection`]: per-connection session driver
//! - [`dispatch`]: message-type routing for established sessions
//! - [`handler`]: the command handler contract and response sink
//! - [`demo`]: the bundled demo catalog and handler

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod connection;
pub mod demo;
pub mod dispatch;
pub mod handler;
pub mod server;

pub use connection::{Connection, ConnectionId};
pub use dispatch::{ServiceState, SessionDispatcher};
pub use handler::{CommandHandler, HandlerError, ResponseSink};
pub use server::{Server, ServerConfig};
