//! Per-connection session state machine
//!
//! Every accepted connection is driven through three states:
//!
//! ```text
//! Handshake --> Active --> Closing
//!     |                       ^
//!     +-----------------------+
//! ```
//!
//! - `Handshake` prompts for a nickname, registers the connection, sends the
//!   welcome banner and announces the join to everyone else.
//! - `Active` reads one line at a time: commands are answered directly, chat
//!   lines are broadcast, blank lines are ignored.
//! - `Closing` unregisters the connection, announces the departure and closes
//!   the socket. It runs exactly once, whatever ended the session.
//!
//! End of stream, read errors, lines longer than [`MAX_LINE_BYTES`] and
//! failed direct writes all lead to `Closing`.
//! Nothing inside a session is ever propagated back to the listener.

use crate::broadcast::broadcast;
use crate::command::CommandProcessor;
use crate::registry::{Connection, Registry};
use log::{debug, info};
use shared::{
    chat_line, default_nickname, join_notice, leave_notice, strip_command, MAX_LINE_BYTES,
    NICKNAME_PROMPT, WELCOME_BANNER,
};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Handshake,
    Active,
    Closing,
}

pub struct Session<R> {
    reader: R,
    connection: Connection,
    registry: Arc<Registry>,
    nickname: String,
    state: SessionState,
    line_buffer: Vec<u8>,
}

impl<R> Session<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R, connection: Connection, registry: Arc<Registry>) -> Self {
        Self {
            reader,
            connection,
            registry,
            nickname: String::new(),
            state: SessionState::Handshake,
            line_buffer: Vec::with_capacity(MAX_LINE_BYTES + 1),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drives the session until the connection is closed
    pub async fn run(mut self) {
        loop {
            self.state = match self.state {
                SessionState::Handshake => self.handshake().await,
                SessionState::Active => self.step().await,
                SessionState::Closing => break,
            };
        }

        self.close().await;
    }

    /// Reads the next line, trimmed and lossily decoded; None on end of stream
    ///
    /// At most `MAX_LINE_BYTES` plus the terminator are buffered. A longer
    /// line is rejected with `InvalidData` so the session closes.
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        self.line_buffer.clear();
        let limit = MAX_LINE_BYTES as u64 + 1;
        let read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.line_buffer)
            .await?;
        if read == 0 {
            return Ok(None);
        }

        if !self.line_buffer.ends_with(b"\n") && self.line_buffer.len() > MAX_LINE_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line longer than {} bytes", MAX_LINE_BYTES),
            ));
        }

        Ok(Some(
            String::from_utf8_lossy(&self.line_buffer).trim().to_string(),
        ))
    }

    async fn handshake(&mut self) -> SessionState {
        let peer = self.connection.peer();

        if let Err(e) = self.connection.send(NICKNAME_PROMPT).await {
            debug!("Failed to prompt {} for a nickname: {}", peer, e);
            return SessionState::Closing;
        }

        let nickname = match self.read_line().await {
            Ok(Some(line)) if !line.is_empty() => line,
            Ok(Some(_)) => default_nickname(peer.port()),
            Ok(None) => {
                debug!("{} disconnected before choosing a nickname", peer);
                return SessionState::Closing;
            }
            Err(e) => {
                debug!("Handshake read from {} failed: {}", peer, e);
                return SessionState::Closing;
            }
        };

        self.registry.add(self.connection.clone(), nickname.as_str());
        info!("[+] {} joined from {}", nickname, peer);
        self.nickname = nickname;

        let banner = self.connection.send(WELCOME_BANNER).await;
        // Announced regardless of the banner so the departure notice has a matching join
        broadcast(
            &self.registry,
            &join_notice(&self.nickname),
            Some(self.connection.id()),
        )
        .await;

        match banner {
            Ok(()) => SessionState::Active,
            Err(e) => {
                debug!("Failed to send banner to {}: {}", self.nickname, e);
                SessionState::Closing
            }
        }
    }

    async fn step(&mut self) -> SessionState {
        match self.read_line().await {
            Ok(Some(line)) => self.dispatch(&line).await,
            Ok(None) => {
                debug!("{} closed the connection", self.nickname);
                SessionState::Closing
            }
            Err(e) => {
                debug!("Read from {} failed: {}", self.nickname, e);
                SessionState::Closing
            }
        }
    }

    async fn dispatch(&mut self, line: &str) -> SessionState {
        if line.is_empty() {
            return SessionState::Active;
        }

        if let Some(body) = strip_command(line) {
            let reply = CommandProcessor::new(&self.registry).process(body);
            if let Err(e) = self.connection.send(&reply.text).await {
                debug!("Failed to reply to {}: {}", self.nickname, e);
                return SessionState::Closing;
            }

            return if reply.disconnect {
                SessionState::Closing
            } else {
                SessionState::Active
            };
        }

        debug!("[{}] {}", self.nickname, line);
        broadcast(
            &self.registry,
            &chat_line(&self.nickname, line),
            Some(self.connection.id()),
        )
        .await;

        SessionState::Active
    }

    async fn close(&mut self) {
        let id = self.connection.id();

        // Use the nickname captured by the removal itself, never a later lookup
        if let Some(nickname) = self.registry.remove(id) {
            broadcast(&self.registry, &leave_notice(&nickname), Some(id)).await;
            info!("[-] {} disconnected", nickname);
        }

        if let Err(e) = self.connection.shutdown().await {
            debug!("Shutdown of {} failed: {}", self.connection.peer(), e);
        }
    }
}
