//! # approach-core
//!
//! Core library for the approach remote-control console: a two-party
//! protocol for driving an in-app command runtime from an interactive
//! terminal client.
//!
//! The crate provides the three layers both binaries are built from:
//!
//! - **Frame transport** ([`wire`]): a length-framed message codec over a
//!   TCP stream, with a two-phase version handshake and a per-connection
//!   lifecycle state machine.
//! - **Catalog schema** ([`catalog`]): the recursive, self-describing
//!   command document a service advertises, with the structural queries the
//!   parser needs.
//! - **Command-line parser** ([`parser`]): a state-machine-driven tokenizer
//!   and parser that evaluates a typed line against a catalog, producing a
//!   typed [`invocation::Invocation`] or a precise diagnostic.
//!
//! ## Example
//!
//! ```
//! use approach_core::catalog::{Command, Flag};
//! use approach_core::parser::evaluate;
//!
//! let commands = vec![Command::with_arguments(
//!     "lights",
//!     "Control the lights.",
//!     vec![Flag::new("off", 'o', "Turn them off instead.")],
//!     vec![],
//!     vec![],
//!     false,
//! )
//! .unwrap()];
//!
//! let invocation = evaluate("lights --off", &commands).unwrap();
//! assert_eq!(invocation.commands, vec!["lights"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod discovery;
pub mod info;
pub mod invocation;
pub mod parser;
pub mod usage;
pub mod value;
pub mod wire;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::catalog::{Command, CommandsSpecification, Flag, Input, Opt};
    pub use crate::invocation::Invocation;
    pub use crate::parser::{ParseError, evaluate};
    pub use crate::value::{ArgumentDataType, ArgumentValue};
    pub use crate::wire::{Frame, FrameCodec, Message, MessageType, TransportError};
}

pub use wire::{Message, MessageType};
