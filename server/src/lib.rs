//! # Chat Server Library
//!
//! This library implements a multi-client TCP chat server speaking a
//! newline-delimited text protocol. Clients pick a nickname, exchange chat
//! lines with everyone else who is connected, and issue a handful of inline
//! commands (`/TIME`, `/ECHO`, `/ADD`, `/WHO`, `/EXIT`).
//!
//! ## Architecture
//!
//! ### Task-per-connection
//! The listener runs a single accept loop and spawns one tokio task per
//! accepted socket. Each task owns the read half of its socket and drives a
//! [`session::Session`] state machine. A failing session ends only its own
//! task; it can neither unwind into the accept loop nor disturb other
//! sessions.
//!
//! ### Shared state
//! The only state shared between sessions is the [`registry::Registry`], a
//! map from connection id to nickname plus a write handle. Its lock guards
//! map mutations and copies only, never socket I/O, so access latency does
//! not grow with the number of clients.
//!
//! ### Delivery
//! Broadcasts are best effort. A recipient whose socket fails is skipped and
//! left for its own session to clean up. Lines written to one connection
//! arrive in the order they were issued; there is no global order across
//! broadcasts from different senders.
//!
//! ### Limitations
//! Reads have no timeout, so an idle client keeps its session alive
//! indefinitely. Stopping the listener does not terminate running sessions.
//!
//! ## Module Organization
//!
//! - `registry`: connection handles and the registry of active users
//! - `broadcast`: fan-out of a line to all registered connections but one
//! - `command`: parsing and execution of inline commands
//! - `session`: per-connection handshake, read loop and cleanup
//! - `network`: listener, bind configuration and session spawning
//! - `error`: server-level error type
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = ChatServer::from_config(&ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod command;
pub mod error;
pub mod network;
pub mod registry;
pub mod session;
