use log::{debug, info};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

pub struct Client {
    stream: TcpStream,
}

impl Client {
    pub async fn connect(server_addr: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(server_addr).await?;
        info!("Connected to {}", stream.peer_addr()?);
        Ok(Client { stream })
    }

    /// Relays between the server and the given input/output until the server closes
    ///
    /// When the input runs out the write side is shut down, which the server
    /// treats as a disconnect; the remaining server output is still copied.
    pub async fn run<I, O>(self, input: I, output: &mut O) -> io::Result<()>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let (mut server_rx, mut server_tx) = self.stream.into_split();

        {
            let inbound = tokio::io::copy(&mut server_rx, output);
            let outbound = async {
                let mut lines = input.lines();
                while let Some(line) = lines.next_line().await? {
                    server_tx.write_all(line.as_bytes()).await?;
                    server_tx.write_all(b"\n").await?;
                }
                debug!("Input closed, shutting down write side");
                server_tx.shutdown().await
            };

            tokio::pin!(inbound);
            tokio::pin!(outbound);

            tokio::select! {
                copied = &mut inbound => {
                    debug!("Server closed the connection after {} bytes", copied?);
                }
                sent = &mut outbound => {
                    sent?;
                    let copied = inbound.await?;
                    debug!("Server closed the connection after {} bytes", copied);
                }
            }
        }

        output.flush().await?;
        info!("Disconnected");
        Ok(())
    }
}
