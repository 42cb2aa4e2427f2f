//! Host info document.
//!
//! The first framed message a service sends on an established connection is
//! `generalInfo`: a small self-description the client shows when it
//! connects.

use serde::{Deserialize, Serialize};

/// The document carried by a `generalInfo` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    /// The instance name the service advertises under.
    pub instance_name: String,
    /// Operating system of the host.
    pub system: String,
    /// Version of the hosting application.
    pub version: String,
}

impl HostInfo {
    /// Describes the current host under the given instance name.
    #[must_use]
    pub fn new(instance_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            system: std::env::consts::OS.to_string(),
            version: version.into(),
        }
    }

    /// Encodes the document for transport.
    ///
    /// # Errors
    ///
    /// Returns the underlying serialization error.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes a `generalInfo` payload.
    ///
    /// # Errors
    ///
    /// Returns the underlying deserialization error.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let info = HostInfo::new("kitchen-ipad", "2.1.0");
        let decoded = HostInfo::decode(&info.encode().unwrap()).unwrap();
        assert_eq!(decoded, info);
        assert!(!decoded.system.is_empty());
    }
}
