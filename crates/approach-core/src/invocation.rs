//! Parsed command invocations.
//!
//! An invocation is the structured result of evaluating one command line
//! against a catalog: the resolved command name chain plus a map of argument
//! names to typed values. It travels from client to service as the payload
//! of an `executeCommand` message.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::ArgumentValue;

/// Version of the invocation document.
pub const INVOCATION_VERSION: u32 = 1;

/// Errors surfaced by the invocation document codec.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvocationError {
    /// The decoded document advertises an unsupported version.
    #[error("incorrect invocation version {found} (expected {INVOCATION_VERSION})")]
    IncorrectVersion {
        /// The version found in the document.
        found: u32,
    },

    /// The document failed to serialize.
    #[error("failed to encode invocation: {0}")]
    Encode(#[source] serde_json::Error),

    /// The document failed to deserialize.
    #[error("failed to decode invocation: {0}")]
    Decode(#[source] serde_json::Error),
}

/// The structured result of parsing one command line.
///
/// `commands` lists every name the parser descended through, root first
/// (for example `["stuff", "process"]`). `arguments` maps each consumed
/// argument's name to its parsed value; when an option marked
/// `isMultipleAllowed` occurs more than once, the last occurrence wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    version: u32,
    /// Resolved command name chain, root first.
    pub commands: Vec<String>,
    /// Consumed arguments, keyed by name.
    pub arguments: BTreeMap<String, ArgumentValue>,
}

impl Invocation {
    /// Wraps a resolved chain and argument map at the current version.
    #[must_use]
    pub fn new(commands: Vec<String>, arguments: BTreeMap<String, ArgumentValue>) -> Self {
        Self {
            version: INVOCATION_VERSION,
            commands,
            arguments,
        }
    }

    /// The document version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Looks up a consumed argument by name.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments.get(name)
    }

    /// Encodes the invocation for transport.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::Encode`] on serialization failure.
    pub fn encode(&self) -> Result<Vec<u8>, InvocationError> {
        serde_json::to_vec(self).map_err(InvocationError::Encode)
    }

    /// Decodes an invocation received over the wire, validating its version.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::Decode`] on malformed input and
    /// [`InvocationError::IncorrectVersion`] on a version mismatch.
    pub fn decode(bytes: &[u8]) -> Result<Self, InvocationError> {
        let invocation: Self = serde_json::from_slice(bytes).map_err(InvocationError::Decode)?;
        if invocation.version != INVOCATION_VERSION {
            return Err(InvocationError::IncorrectVersion {
                found: invocation.version,
            });
        }
        Ok(invocation)
    }
}
