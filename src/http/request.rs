use std::fmt;

use crate::http::headers::Headers;

/// HTTP request methods.
///
/// Every syntactically valid method token is accepted by the parser. Only
/// `GET` is serviced by the server; everything else is answered with
/// 501 Not Implemented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// CONNECT - Establish a tunnel
    CONNECT,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// TRACE - Loop-back test
    TRACE,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// Any other well-formed method token
    Extension(String),
}

impl Method {
    /// Parses an HTTP method token.
    ///
    /// Method names are case-sensitive. Returns `None` only when `s` is not
    /// a valid token (empty or containing separators/control characters).
    ///
    /// # Example
    ///
    /// ```
    /// # use sparrow::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), Some(Method::Extension("get".into())));
    /// assert_eq!(Method::from_str("G(T"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        if !is_token(s) {
            return None;
        }

        let method = match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "CONNECT" => Method::CONNECT,
            "OPTIONS" => Method::OPTIONS,
            "TRACE" => Method::TRACE,
            "PATCH" => Method::PATCH,
            other => Method::Extension(other.to_string()),
        };
        Some(method)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::CONNECT => "CONNECT",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::PATCH => "PATCH",
            Method::Extension(token) => token,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// tchar as defined for HTTP tokens.
pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// Protocol versions understood on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    Http10,
    #[default]
    Http11,
}

impl Version {
    /// Only the exact literals `HTTP/1.0` and `HTTP/1.1` are accepted.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "HTTP/1.0" => Some(Version::Http10),
            "HTTP/1.1" => Some(Version::Http11),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a parsed HTTP request head.
///
/// Bodies are never read: the server only services GET, and every
/// connection is closed after one response.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target as sent on the wire (e.g. "/index.html?x=1")
    pub target: String,
    pub version: Version,
    pub headers: Headers,
}

/// Builder for constructing Request objects.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    target: Option<String>,
    version: Version,
    headers: Headers,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let target = self.target.ok_or("target missing")?;
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            target: if target.is_empty() { "/".to_string() } else { target },
            version: self.version,
            headers: self.headers,
        })
    }
}

impl Request {
    /// Retrieves a header value by name (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// The target with any query string or fragment stripped.
    pub fn path(&self) -> &str {
        let end = self
            .target
            .find(['?', '#'])
            .unwrap_or(self.target.len());
        &self.target[..end]
    }

    /// Whether `Accept-Encoding` lists `coding` with a non-zero q-value.
    pub fn accepts_encoding(&self, coding: &str) -> bool {
        let Some(accept) = self.header("Accept-Encoding") else {
            return false;
        };

        accept.split(',').any(|item| {
            let mut params = item.split(';');
            let name = params.next().unwrap_or("").trim();
            if !name.eq_ignore_ascii_case(coding) {
                return false;
            }
            params
                .filter_map(|p| p.trim().strip_prefix("q="))
                .all(|q| q.trim().parse::<f32>().map(|q| q > 0.0).unwrap_or(false))
        })
    }
}
