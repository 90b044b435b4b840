//! One request/response exchange over a fresh TCP connection.
//!
//! ```text
//! Unstarted -> Connected -> RequestSent -> StatusLineRead -> HeadersRead
//!                                                              |
//!                                          Closed <- BodyStreamed
//! ```
//!
//! Any failure moves the exchange to `Error`; nothing is retried.

use std::io::{self, Write};
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::client::target::Target;
use crate::error::ClientError;
use crate::http::encoding::{BodyDecoder, ContentCoding};
use crate::http::headers::Headers;
use crate::http::parser::{parse_header_line, parse_status_line, take_line, ParseError, MAX_HEADERS};
use crate::http::request::Request;
use crate::http::response::{ResponseHead, StatusLine};
use crate::http::writer::serialize_request;

/// Largest response head the client will buffer.
pub const MAX_RESPONSE_HEAD: usize = 64 * 1024;

const BUFFER_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Unstarted,
    Connected,
    RequestSent,
    StatusLineRead,
    HeadersRead,
    BodyStreamed,
    Closed,
    Error,
}

pub struct Exchange {
    connect_timeout: Duration,
    read_timeout: Duration,
    stream: Option<TcpStream>,
    buffer: BytesMut,
    head_bytes: usize,
    state: ExchangeState,
}

impl Exchange {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
            stream: None,
            buffer: BytesMut::with_capacity(BUFFER_SIZE),
            head_bytes: 0,
            state: ExchangeState::Unstarted,
        }
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub async fn connect(&mut self, target: &Target) -> Result<(), ClientError> {
        let addr = (target.host.as_str(), target.port);
        let context = format!("failed to connect to {}:{}", target.host, target.port);

        let stream = match timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(self.fail(ClientError::transport(context, e))),
            Err(_) => return Err(self.fail(ClientError::timed_out(context))),
        };

        trace!(host = %target.host, port = target.port, "connected");
        self.stream = Some(stream);
        self.state = ExchangeState::Connected;
        Ok(())
    }

    pub async fn send_request(&mut self, request: &Request) -> Result<(), ClientError> {
        self.expect_state(ExchangeState::Connected)?;
        let bytes = serialize_request(request);

        let Some(stream) = self.stream.as_mut() else {
            return Err(self.fail(ClientError::protocol("no connection")));
        };
        let write = async {
            stream.write_all(&bytes).await?;
            stream.flush().await
        };
        match timeout(self.read_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(self.fail(ClientError::transport("failed to send request", e))),
            Err(_) => return Err(self.fail(ClientError::timed_out("sending request"))),
        }

        debug!(method = %request.method, target = %request.target, "request sent");
        self.state = ExchangeState::RequestSent;
        Ok(())
    }

    /// Reads the status line and header block.
    pub async fn read_head(&mut self) -> Result<ResponseHead, ClientError> {
        match self.read_head_inner().await {
            Ok(head) => Ok(head),
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn read_head_inner(&mut self) -> Result<ResponseHead, ClientError> {
        let mut status: Option<StatusLine> = None;
        let mut headers = Headers::new();
        let mut header_lines = 0;

        loop {
            match self.state {
                ExchangeState::RequestSent => {
                    let line = self.next_line().await?;
                    status = Some(parse_status_line(&line)?);
                    self.state = ExchangeState::StatusLineRead;
                }

                ExchangeState::StatusLineRead => {
                    let line = self.next_line().await?;
                    if line.is_empty() {
                        self.state = ExchangeState::HeadersRead;
                        continue;
                    }

                    header_lines += 1;
                    if header_lines > MAX_HEADERS {
                        return Err(ParseError::TooManyHeaders.into());
                    }
                    let (name, value) = parse_header_line(&line)?;
                    headers.insert(name, value);
                }

                ExchangeState::HeadersRead => {
                    let status = status
                        .take()
                        .ok_or_else(|| ClientError::protocol("response head without status line"))?;
                    debug!(code = status.code, reason = %status.reason, "response head read");
                    return Ok(ResponseHead { status, headers });
                }

                other => {
                    return Err(ClientError::protocol(format!(
                        "cannot read a response head in state {:?}",
                        other
                    )));
                }
            }
        }
    }

    /// Next CRLF-terminated line of the response head.
    async fn next_line(&mut self) -> Result<String, ClientError> {
        loop {
            if let Some((line, consumed)) = take_line(&self.buffer)? {
                let line = line.to_string();
                self.buffer.advance(consumed);
                self.head_bytes += consumed;
                if self.head_bytes > MAX_RESPONSE_HEAD {
                    return Err(ParseError::HeadTooLarge { max: MAX_RESPONSE_HEAD }.into());
                }
                return Ok(line);
            }

            if self.head_bytes + self.buffer.len() > MAX_RESPONSE_HEAD {
                return Err(ParseError::HeadTooLarge { max: MAX_RESPONSE_HEAD }.into());
            }

            if self.fill_buffer().await? == 0 {
                return Err(ClientError::protocol(
                    "connection closed before the response head was complete",
                ));
            }
        }
    }

    async fn fill_buffer(&mut self) -> Result<usize, ClientError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(ClientError::protocol("no connection"));
        };

        self.buffer.reserve(BUFFER_SIZE);
        match timeout(self.read_timeout, stream.read_buf(&mut self.buffer)).await {
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => Err(ClientError::transport("failed to read response", e)),
            Err(_) => Err(ClientError::timed_out("reading response")),
        }
    }

    /// Streams the body through `decoder` and returns the number of body
    /// bytes received on the wire together with the decoder's inner writer.
    ///
    /// With a `content_length` exactly that many bytes are read and a short
    /// body is a protocol error; without one the body runs to EOF.
    pub async fn stream_body<W: Write>(
        &mut self,
        mut decoder: BodyDecoder<W>,
        content_length: Option<u64>,
    ) -> Result<(u64, W), ClientError> {
        self.expect_state(ExchangeState::HeadersRead)?;
        let coding = decoder.coding();
        let mut received: u64 = 0;

        loop {
            if !self.buffer.is_empty() {
                let take = match content_length {
                    Some(len) => (len - received).min(self.buffer.len() as u64) as usize,
                    None => self.buffer.len(),
                };
                if let Err(e) = decoder.write_all(&self.buffer[..take]) {
                    return Err(self.fail(body_error(coding, e)));
                }
                received += take as u64;
                self.buffer.clear();
            }

            if content_length.is_some_and(|len| received >= len) {
                break;
            }

            match self.fill_buffer().await {
                Ok(0) => match content_length {
                    Some(len) => {
                        return Err(self.fail(ClientError::protocol(format!(
                            "body truncated: got {} of {} bytes",
                            received, len
                        ))));
                    }
                    None => break,
                },
                Ok(_) => {}
                Err(e) => return Err(self.fail(e)),
            }
        }

        let inner = match decoder.finish() {
            Ok(inner) => inner,
            Err(e) => return Err(self.fail(body_error(coding, e))),
        };

        trace!(received, encoding = coding.name(), "body streamed");
        self.state = ExchangeState::BodyStreamed;
        Ok((received, inner))
    }

    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        if self.state != ExchangeState::Error {
            self.state = ExchangeState::Closed;
        }
    }

    fn expect_state(&mut self, expected: ExchangeState) -> Result<(), ClientError> {
        if self.state == expected {
            return Ok(());
        }
        let err = ClientError::protocol(format!(
            "exchange in state {:?}, expected {:?}",
            self.state, expected
        ));
        Err(self.fail(err))
    }

    fn fail(&mut self, err: ClientError) -> ClientError {
        self.state = ExchangeState::Error;
        err
    }
}

/// Corrupt gzip data is the peer's fault, anything else failed locally.
fn body_error(coding: ContentCoding, e: io::Error) -> ClientError {
    let corrupt = matches!(e.kind(), io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput);
    if coding == ContentCoding::Gzip && corrupt {
        ClientError::protocol(format!("invalid gzip body: {}", e))
    } else {
        ClientError::Output(e)
    }
}
