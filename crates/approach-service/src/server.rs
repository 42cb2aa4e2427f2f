//! TCP listener and connection registry.
//!
//! The server owns the listening socket, advertises the instance through
//! the configured discovery collaborator, and spawns one task per accepted
//! connection. Each connection is tracked under its [`ConnectionId`] until
//! it reaches its cancelled state, then forgotten.
//!
//! Mobile hosts tear the listener down on "resign active"; [`Server::rebuild`]
//! re-binds it on "become active" without touching live connections.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use approach_core::catalog::CommandsSpecification;
use approach_core::discovery::{Advertiser, NullAdvertiser};
use approach_core::info::HostInfo;
use approach_core::wire::TransportError;

use crate::connection::{Connection, ConnectionId};
use crate::dispatch::ServiceState;
use crate::handler::CommandHandler;

/// Server configuration.
pub struct ServerConfig {
    /// Address to listen on. Use port 0 to let the host pick one.
    pub bind_addr: SocketAddr,
    /// Instance name advertised through discovery.
    pub instance_name: String,
    /// Version string reported in `generalInfo`.
    pub version: String,
    /// Discovery collaborator advertising the instance.
    pub advertiser: Arc<dyn Advertiser>,
}

impl ServerConfig {
    /// Configuration with the default (null) advertiser.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, instance_name: impl Into<String>) -> Self {
        Self {
            bind_addr,
            instance_name: instance_name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            advertiser: Arc::new(NullAdvertiser),
        }
    }

    /// Replaces the discovery advertiser.
    #[must_use]
    pub fn with_advertiser(mut self, advertiser: Arc<dyn Advertiser>) -> Self {
        self.advertiser = advertiser;
        self
    }
}

/// The approach host service.
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    state: Arc<ServiceState>,
    connections: Arc<Mutex<HashMap<ConnectionId, JoinHandle<()>>>>,
}

impl Server {
    /// Binds the listener and starts advertising the instance.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when the address cannot be bound.
    pub async fn bind(
        config: ServerConfig,
        commands: CommandsSpecification,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!(
            instance = %config.instance_name,
            addr = %local_addr,
            "service listening"
        );

        if let Err(e) = config
            .advertiser
            .advertise(&config.instance_name, local_addr.port())
        {
            error!("could not advertise service instance: {e}");
        }

        let state = Arc::new(ServiceState {
            info: HostInfo::new(&config.instance_name, &config.version),
            specification: commands,
            handler,
        });

        Ok(Self {
            listener,
            config,
            state,
            connections: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// The address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when the socket has gone away.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    /// The number of connections not yet cancelled.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections
            .lock()
            .map(|table| table.len())
            .unwrap_or(0)
    }

    /// Tears the listener down and binds a fresh one on the same address.
    ///
    /// Live connections are untouched; this backs the host application's
    /// background/foreground cycle.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when re-binding fails.
    pub async fn rebuild(&mut self) -> Result<(), TransportError> {
        let addr = self.listener.local_addr()?;
        self.listener = TcpListener::bind(addr).await?;
        info!(addr = %addr, "listener rebuilt");
        Ok(())
    }

    /// Accepts connections until the future is dropped.
    pub async fn run(&mut self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let connection = Connection::new();
                    let id = connection.id();
                    debug!(connection = %id, peer = %peer, "accepted connection");

                    let state = Arc::clone(&self.state);
                    let connections = Arc::clone(&self.connections);
                    let task = tokio::spawn(async move {
                        let _ = connection.drive(stream, state).await;
                        // Cancelled connections are forgotten.
                        if let Ok(mut table) = connections.lock() {
                            table.remove(&id);
                        }
                    });

                    if let Ok(mut table) = self.connections.lock() {
                        table.insert(id, task);
                        // Reap entries whose task already finished.
                        table.retain(|_, task| !task.is_finished());
                    }
                },
                Err(e) => {
                    error!("failed to accept connection: {e}");
                },
            }
        }
    }

    /// The instance name this server advertises.
    #[must_use]
    pub fn instance_name(&self) -> &str {
        &self.config.instance_name
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.config.advertiser.withdraw(&self.config.instance_name);
        if let Ok(mut table) = self.connections.lock() {
            for (_, task) in table.drain() {
                task.abort();
            }
        }
    }
}
