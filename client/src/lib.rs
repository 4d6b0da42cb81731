//! # Chat Client Library
//!
//! A minimal line-oriented terminal client for the chat server. Bytes from
//! the server are copied to the output unchanged (the nickname prompt has no
//! trailing newline), and every input line is forwarded to the server.
//!
//! The client is generic over its input and output so it can be driven by
//! stdin/stdout or by in-memory buffers.
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect("127.0.0.1:5000").await?;
//!     let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//!     client.run(stdin, &mut tokio::io::stdout()).await?;
//!     Ok(())
//! }
//! ```

pub mod network;
