use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::http::parser::{parse_http_request, ParseError};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::server::handler::handle_request;

/// How long to keep draining the peer after our FIN so the kernel does
/// not answer leftover request bytes with a reset.
const LINGER: Duration = Duration::from_millis(200);

pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    state: ConnectionState,
    config: Arc<ServerConfig>,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

/// Result of waiting for a request head.
enum ReadOutcome {
    Request(Request),
    /// Malformed or stalled: answer 400 and close.
    Rejected(String),
    /// Peer went away without sending anything.
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, config: Arc<ServerConfig>) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(4096),
            state: ConnectionState::Reading,
            config,
        }
    }

    /// Drives the single request/response exchange this connection carries.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => match self.read_request().await? {
                    ReadOutcome::Request(req) => {
                        self.state = ConnectionState::Processing(req);
                    }
                    ReadOutcome::Rejected(reason) => {
                        warn!(peer = %self.peer, reason = %reason, "rejecting malformed request");
                        let writer = ResponseWriter::new(&Response::bad_request());
                        self.state = ConnectionState::Writing(writer);
                    }
                    ReadOutcome::Closed => {
                        self.state = ConnectionState::Closed;
                    }
                },

                ConnectionState::Processing(req) => {
                    let served = handle_request(req, &self.config.doc_root).await;

                    info!(
                        peer = %self.peer,
                        method = %req.method,
                        path = %served
                            .file
                            .as_deref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| req.target.clone()),
                        status = served.response.status.as_u16(),
                        encoding = served.coding.name(),
                        "request served"
                    );

                    let writer = ResponseWriter::new(&served.response);
                    self.state = ConnectionState::Writing(writer);
                }

                ConnectionState::Writing(writer) => {
                    let write = writer.write_to_stream(&mut self.stream);
                    match timeout(self.config.write_timeout, write).await {
                        Ok(result) => result?,
                        Err(_) => {
                            anyhow::bail!(
                                "write timed out with {} bytes unsent",
                                writer.remaining()
                            );
                        }
                    }

                    self.linger_close().await;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Waits for a complete request head. The whole head must arrive within
    /// one `read_timeout`, however the peer spreads its bytes.
    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        let deadline = Instant::now() + self.config.read_timeout;

        loop {
            match parse_http_request(&self.buffer) {
                Ok((request, _consumed)) => {
                    return Ok(ReadOutcome::Request(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => {
                    return Ok(ReadOutcome::Rejected(e.to_string()));
                }
            }

            self.buffer.reserve(1024);
            let read = timeout_at(deadline, self.stream.read_buf(&mut self.buffer)).await;

            let n = match read {
                Ok(n) => n?,
                Err(_) if self.buffer.is_empty() => {
                    debug!(peer = %self.peer, "idle connection timed out");
                    return Ok(ReadOutcome::Closed);
                }
                Err(_) => {
                    return Ok(ReadOutcome::Rejected("timed out waiting for request head".into()));
                }
            };

            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(ReadOutcome::Closed);
                }
                return Ok(ReadOutcome::Rejected("connection closed mid-request".into()));
            }
        }
    }

    /// Half-closes the socket, then discards whatever the peer still sends
    /// until it closes too or `LINGER` runs out.
    async fn linger_close(&mut self) {
        if self.stream.shutdown().await.is_err() {
            return;
        }

        let deadline = Instant::now() + LINGER;
        let mut scratch = [0u8; 1024];
        while let Ok(Ok(n)) = timeout_at(deadline, self.stream.read(&mut scratch)).await {
            if n == 0 {
                break;
            }
        }
    }
}
