//! Service discovery contract.
//!
//! Discovery is an external collaborator: something advertises the service
//! under an instance name on the local network and something resolves that
//! name to a socket address. The core only depends on the thin traits here;
//! the bundled implementations cover direct-address deployments and tests,
//! where the address is known without a network browse.

use std::collections::HashMap;
use std::net::SocketAddr;

use thiserror::Error;
use tracing::debug;

/// DNS-SD service type the service advertises under, local domain.
pub const SERVICE_TYPE: &str = "_apparata-approach-v0001._tcp";

/// Errors surfaced by discovery collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// No service is known under the given instance name.
    #[error("unknown service instance {0:?}")]
    UnknownInstance(String),

    /// The discovery facility itself is unavailable.
    #[error("discovery unavailable: {0}")]
    Unavailable(String),
}

/// Advertises a service instance on the local network.
pub trait Advertiser: Send + Sync {
    /// Starts advertising `instance_name` on `port`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Unavailable`] when advertising cannot
    /// start.
    fn advertise(&self, instance_name: &str, port: u16) -> Result<(), DiscoveryError>;

    /// Stops advertising `instance_name`.
    fn withdraw(&self, instance_name: &str);
}

/// Resolves a service instance name to a socket address.
pub trait Resolver: Send + Sync {
    /// Resolves `instance_name`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::UnknownInstance`] when the name is not
    /// known.
    fn resolve(&self, instance_name: &str) -> Result<SocketAddr, DiscoveryError>;
}

/// An advertiser that records the request in the log and nothing else.
///
/// Used when no network advertising facility is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAdvertiser;

impl Advertiser for NullAdvertiser {
    fn advertise(&self, instance_name: &str, port: u16) -> Result<(), DiscoveryError> {
        debug!(instance_name, port, service_type = SERVICE_TYPE, "not advertising");
        Ok(())
    }

    fn withdraw(&self, _instance_name: &str) {}
}

/// A resolver backed by a fixed instance-name table.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, SocketAddr>,
}

impl StaticResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver knowing a single instance.
    #[must_use]
    pub fn single(instance_name: impl Into<String>, addr: SocketAddr) -> Self {
        let mut resolver = Self::new();
        resolver.insert(instance_name, addr);
        resolver
    }

    /// Registers or replaces an instance address.
    pub fn insert(&mut self, instance_name: impl Into<String>, addr: SocketAddr) {
        self.entries.insert(instance_name.into(), addr);
    }
}

impl Resolver for StaticResolver {
    fn resolve(&self, instance_name: &str) -> Result<SocketAddr, DiscoveryError> {
        self.entries
            .get(instance_name)
            .copied()
            .ok_or_else(|| DiscoveryError::UnknownInstance(instance_name.to_string()))
    }
}
