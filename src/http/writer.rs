use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::request::Request;
use crate::http::response::Response;

/// Status line, headers in stored order, blank line, then the body verbatim.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256 + resp.body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        resp.version,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    for (k, v) in resp.headers.iter() {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf.extend_from_slice(&resp.body);

    buf
}

/// Request line and headers. Requests never carry a body here.
pub fn serialize_request(req: &Request) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.extend_from_slice(
        format!("{} {} {}\r\n", req.method, req.target, req.version).as_bytes(),
    );

    for (key, value) in req.headers.iter() {
        buf.extend_from_slice(format!("{}: {}\r\n", key, value).as_bytes());
    }

    buf.extend_from_slice(b"\r\n");

    buf
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.written
    }

    pub async fn write_to_stream<S>(&mut self, stream: &mut S) -> anyhow::Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
