use std::io;
use thiserror::Error;

/// Errors that abort the server as a whole
///
/// Per-connection failures never surface here; sessions absorb them.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}
