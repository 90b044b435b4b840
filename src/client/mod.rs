//! HTTP/1.1 client: fetch one URL and deliver the body to stdout or a file.

pub mod exchange;
pub mod output;
pub mod target;

pub use exchange::{Exchange, ExchangeState};
pub use output::{Destination, OutputSink};
pub use target::Target;

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::encoding::{BodyDecoder, ContentCoding};
use crate::http::request::{Method, Request, RequestBuilder, Version};
use crate::http::response::ResponseHead;

/// What a successful fetch delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// Body bytes as received on the wire, before decoding
    pub received: u64,
    pub coding: ContentCoding,
    /// Written file, `None` when the body went to stdout
    pub path: Option<PathBuf>,
}

/// The request sent for `target`.
pub fn build_request(target: &Target) -> Result<Request, ClientError> {
    RequestBuilder::new()
        .method(Method::GET)
        .target(target.path.clone())
        .version(Version::Http11)
        .header("Host", target.authority.clone())
        .header("User-Agent", concat!("sparrow/", env!("CARGO_PKG_VERSION")))
        .header("Accept-Encoding", "gzip")
        .header("Connection", "close")
        .build()
        .map_err(ClientError::usage)
}

/// Performs the whole exchange described by `config`.
///
/// The output is only opened once a 200 response head has been read, so a
/// failed request never creates or truncates a file. If the body cannot be
/// delivered completely the partial file is removed.
pub async fn run(config: &ClientConfig) -> Result<Fetched, ClientError> {
    let target = &config.target;
    let request = build_request(target)?;

    let mut exchange = Exchange::new(config.connect_timeout, config.read_timeout);
    exchange.connect(target).await?;
    exchange.send_request(&request).await?;
    let head = exchange.read_head().await?;

    if !head.status.is_ok() {
        exchange.close().await;
        return Err(ClientError::Status {
            code: head.status.code,
            reason: head.status.reason,
        });
    }

    let (coding, content_length) = body_framing(&head)?;
    debug!(?content_length, encoding = coding.name(), "reading body");

    let mut sink = config.output.open(target)?;
    let path = sink.path().map(|p| p.to_path_buf());

    let decoder = BodyDecoder::new(coding, &mut sink);
    let streamed = exchange
        .stream_body(decoder, content_length)
        .await
        .map(|(received, _)| received);
    exchange.close().await;

    let received = match streamed {
        Ok(received) => received,
        Err(e) => {
            sink.abandon();
            return Err(e);
        }
    };
    sink.finish().map_err(ClientError::Output)?;

    info!(received, encoding = coding.name(), "fetched {}", target.path);
    Ok(Fetched {
        received,
        coding,
        path,
    })
}

/// Content coding and length of the body that follows `head`.
fn body_framing(head: &ResponseHead) -> Result<(ContentCoding, Option<u64>), ClientError> {
    if let Some(te) = head.header("Transfer-Encoding") {
        if !te.trim().eq_ignore_ascii_case("identity") {
            return Err(ClientError::protocol(format!(
                "unsupported transfer encoding: {}",
                te
            )));
        }
    }

    let encoding = head.header("Content-Encoding");
    let coding = ContentCoding::from_header(encoding).ok_or_else(|| {
        ClientError::protocol(format!(
            "unsupported content encoding: {}",
            encoding.unwrap_or_default()
        ))
    })?;

    let length = match head.header("Content-Length") {
        None => None,
        Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
            ClientError::protocol(format!("invalid Content-Length: {:?}", raw))
        })?),
    };

    Ok((coding, length))
}
