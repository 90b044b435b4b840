//! Content-coding negotiation and the gzip codec.
//!
//! The server only compresses when the request lists `gzip` in
//! `Accept-Encoding`, and the client only ever advertises `gzip`, so any
//! other coding in a response is treated as a protocol violation.

use std::io::{self, Write};

use flate2::Compression;
use flate2::write::{GzDecoder, GzEncoder};
use tracing::trace;

use crate::http::request::Request;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCoding {
    Identity,
    Gzip,
}

impl ContentCoding {
    /// Picks the coding for a response to `req`.
    pub fn negotiate(req: &Request) -> Self {
        if req.accepts_encoding("gzip") {
            ContentCoding::Gzip
        } else {
            ContentCoding::Identity
        }
    }

    /// Interprets a `Content-Encoding` header value. `None` for codings we
    /// cannot decode.
    pub fn from_header(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            None | Some("") => Some(ContentCoding::Identity),
            Some(v) if v.eq_ignore_ascii_case("identity") => Some(ContentCoding::Identity),
            Some(v) if v.eq_ignore_ascii_case("gzip") || v.eq_ignore_ascii_case("x-gzip") => {
                Some(ContentCoding::Gzip)
            }
            Some(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContentCoding::Identity => "identity",
            ContentCoding::Gzip => "gzip",
        }
    }

    /// Applies this coding to a complete body.
    pub fn encode(&self, body: Vec<u8>) -> io::Result<Vec<u8>> {
        match self {
            ContentCoding::Identity => Ok(body),
            ContentCoding::Gzip => {
                let mut encoder = GzEncoder::new(Vec::with_capacity(body.len() / 2), Compression::default());
                encoder.write_all(&body)?;
                let out = encoder.finish()?;
                trace!(plain = body.len(), encoded = out.len(), "gzip encoded body");
                Ok(out)
            }
        }
    }
}

/// Streams a received body into `W`, undoing the content coding on the way.
pub enum BodyDecoder<W: Write> {
    Identity(W),
    Gzip(GzDecoder<W>),
}

impl<W: Write> BodyDecoder<W> {
    pub fn new(coding: ContentCoding, inner: W) -> Self {
        match coding {
            ContentCoding::Identity => BodyDecoder::Identity(inner),
            ContentCoding::Gzip => BodyDecoder::Gzip(GzDecoder::new(inner)),
        }
    }

    pub fn coding(&self) -> ContentCoding {
        match self {
            BodyDecoder::Identity(_) => ContentCoding::Identity,
            BodyDecoder::Gzip(_) => ContentCoding::Gzip,
        }
    }

    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            BodyDecoder::Identity(w) => w.write_all(data),
            BodyDecoder::Gzip(d) => d.write_all(data),
        }
    }

    /// Flushes any buffered output and hands back the inner writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            BodyDecoder::Identity(mut w) => {
                w.flush()?;
                Ok(w)
            }
            BodyDecoder::Gzip(d) => {
                let mut w = d.finish()?;
                w.flush()?;
                Ok(w)
            }
        }
    }
}
