use crate::http::headers::Headers;
use crate::http::request::Version;

/// HTTP status codes the server produces.
///
/// - `Ok` (200): Resource delivered
/// - `BadRequest` (400): Malformed request line or headers
/// - `NotFound` (404): Resource missing or outside the document root
/// - `InternalServerError` (500): Resource could not be read
/// - `NotImplemented` (501): Method other than GET
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use sparrow::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }
}

/// A complete HTTP response ready to be sent to a client.
#[derive(Debug)]
pub struct Response {
    pub version: Version,
    pub status: StatusCode,
    /// Header fields in serialization order
    pub headers: Headers,
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/html")
///     .body(b"<h1>hi</h1>".to_vec())
///     .build();
/// ```
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Headers,
    body: Vec<u8>,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builds the final Response.
    ///
    /// Appends `Content-Length` (exact body size) and `Connection: close`
    /// unless they were set explicitly. Connections are never reused.
    pub fn build(mut self) -> Response {
        if !self.headers.contains_key("Content-Length") {
            self.headers
                .insert("Content-Length", self.body.len().to_string());
        }
        if !self.headers.contains_key("Connection") {
            self.headers.insert("Connection", "close");
        }

        Response {
            version: Version::Http11,
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Creates a simple 200 OK response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .body(body.into())
            .build()
    }

    /// Creates an error response whose body names the status, e.g.
    /// `404 Not Found`.
    pub fn error(status: StatusCode) -> Self {
        let body = format!("{} {}\n", status.as_u16(), status.reason_phrase());
        ResponseBuilder::new(status)
            .header("Content-Type", mime::TEXT_PLAIN.as_ref())
            .body(body.into_bytes())
            .build()
    }

    pub fn bad_request() -> Self {
        Self::error(StatusCode::BadRequest)
    }

    pub fn not_found() -> Self {
        Self::error(StatusCode::NotFound)
    }

    pub fn not_implemented() -> Self {
        Self::error(StatusCode::NotImplemented)
    }

    pub fn internal_error() -> Self {
        Self::error(StatusCode::InternalServerError)
    }
}

/// A parsed response status line as seen by the client.
///
/// Unlike [`StatusCode`] this carries any code in `100..=599` together with
/// whatever reason phrase the peer sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: Version,
    pub code: u16,
    pub reason: String,
}

impl StatusLine {
    pub fn is_ok(&self) -> bool {
        self.code == 200
    }
}

/// Status line plus header block of a received response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusLine,
    pub headers: Headers,
}

impl ResponseHead {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }
}
