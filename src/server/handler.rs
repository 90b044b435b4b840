use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::error;

use crate::http::encoding::ContentCoding;
use crate::http::mime::content_type_for;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::server::docroot::DocRoot;

/// Outcome of servicing one request, kept for the request log.
#[derive(Debug)]
pub struct Served {
    pub response: Response,
    pub file: Option<PathBuf>,
    pub coding: ContentCoding,
}

impl Served {
    fn status(response: Response) -> Self {
        Self {
            response,
            file: None,
            coding: ContentCoding::Identity,
        }
    }
}

/// Maps a parsed request to its response.
///
/// Non-GET methods get 501 whether or not the resource exists.
pub async fn handle_request(req: &Request, doc_root: &DocRoot) -> Served {
    if req.method != Method::GET {
        return Served::status(Response::not_implemented());
    }

    let Some(path) = doc_root.resolve(req.path()).await else {
        return Served::status(Response::not_found());
    };

    let body = match tokio::fs::read(&path).await {
        Ok(body) => body,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Served::status(Response::not_found());
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to read resource");
            return Served::status(Response::internal_error());
        }
    };

    let coding = ContentCoding::negotiate(req);
    let body = match coding.encode(body) {
        Ok(encoded) => encoded,
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to encode resource");
            return Served::status(Response::internal_error());
        }
    };

    let mut builder = ResponseBuilder::new(StatusCode::Ok)
        .header("Date", http_date())
        .header("Content-Type", content_type_for(&path).to_string());
    if coding == ContentCoding::Gzip {
        builder = builder.header("Content-Encoding", coding.name());
    }

    Served {
        response: builder.body(body).build(),
        file: Some(path),
        coding,
    }
}

/// Current time in IMF-fixdate form, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date() -> String {
    let mut buf = faf_http_date::get_date_buff_no_key();
    faf_http_date::get_date_no_key(&mut buf);
    String::from_utf8_lossy(&buf[..]).into_owned()
}
