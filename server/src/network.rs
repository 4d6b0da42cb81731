//! Server network layer: TCP listener and per-connection task spawning

use crate::error::ServerError;
use crate::registry::{Connection, ConnectionId, Registry};
use crate::session::Session;
use log::{debug, error, info, warn};
use shared::{DEFAULT_HOST, DEFAULT_PORT};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};

/// Where the server listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port` string suitable for binding
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

/// Accepts chat clients and runs one session task per connection
pub struct ChatServer {
    listener: TcpListener,
    registry: Arc<Registry>,
    next_connection_id: ConnectionId,
}

impl ChatServer {
    /// Binds the listening socket; the only failure that stops the server
    pub async fn bind(addr: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!("Chat server listening on {}", listener.local_addr()?);

        Ok(ChatServer {
            listener,
            registry: Arc::new(Registry::new()),
            next_connection_id: 1,
        })
    }

    pub async fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        Self::bind(&config.address()).await
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared handle to the registry of connected users
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Accept loop; runs until the task is dropped
    pub async fn run(mut self) -> Result<(), ServerError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => self.spawn_session(stream, peer),
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    fn spawn_session(&mut self, stream: TcpStream, peer: SocketAddr) {
        let id = self.next_connection_id;
        self.next_connection_id += 1;

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", peer, e);
        }

        debug!("Connection {} accepted from {}", id, peer);

        let (read_half, write_half) = stream.into_split();
        let connection = Connection::new(id, peer, write_half);
        let session = Session::new(BufReader::new(read_half), connection, self.registry());

        // A panicking session only takes down its own task
        tokio::spawn(session.run());
    }
}
