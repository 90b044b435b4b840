use url::{Host, Url};

use crate::config::DEFAULT_CLIENT_PORT;
use crate::error::ClientError;

/// Where a request goes and what it asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Host to resolve and connect to (IPv6 without brackets)
    pub host: String,
    pub port: u16,
    /// Value for the `Host` header
    pub authority: String,
    /// Request target: path plus optional query, never empty
    pub path: String,
}

impl Target {
    /// Parses an `http://` URL. An explicit `port` wins over the URL's own
    /// port, which wins over 80. Fragments are dropped.
    pub fn parse(raw: &str, port: Option<u16>) -> Result<Self, ClientError> {
        let has_scheme = raw
            .get(..7)
            .is_some_and(|s| s.eq_ignore_ascii_case("http://"));
        if !has_scheme {
            return Err(ClientError::usage(format!("URL must start with http://: {}", raw)));
        }

        let url = Url::parse(raw)
            .map_err(|e| ClientError::usage(format!("invalid URL {:?}: {}", raw, e)))?;

        let host = match url.host() {
            Some(Host::Domain(d)) => d.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(ClientError::usage(format!("URL has no host: {}", raw))),
        };

        let port = port.or(url.port()).unwrap_or(DEFAULT_CLIENT_PORT);

        // host_str keeps the brackets around IPv6 literals
        let host_str = url.host_str().unwrap_or(&host);
        let authority = if port == DEFAULT_CLIENT_PORT {
            host_str.to_string()
        } else {
            format!("{}:{}", host_str, port)
        };

        let mut path = match url.path() {
            "" => "/".to_string(),
            p => p.to_string(),
        };
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        Ok(Self {
            host,
            port,
            authority,
            path,
        })
    }

    /// File name used with `-d`: the last path segment, or `index.html`
    /// when the path ends in `/`.
    ///
    /// The segment is used exactly as it appears on the wire. Like the
    /// server, the client does no percent-decoding, so `/a%20b.png` is
    /// saved as `a%20b.png` and an encoded `%2F` can never introduce a
    /// directory separator.
    pub fn file_name(&self) -> &str {
        let path = self.path.split('?').next().unwrap_or("");
        match path.rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => crate::config::DEFAULT_INDEX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_from_last_segment() {
        let t = Target::parse("http://example.com/osue/cat.png", None).unwrap();
        assert_eq!(t.file_name(), "cat.png");

        let t = Target::parse("http://example.com/osue/", None).unwrap();
        assert_eq!(t.file_name(), "index.html");

        let t = Target::parse("http://example.com", None).unwrap();
        assert_eq!(t.file_name(), "index.html");
    }

    #[test]
    fn file_name_is_not_percent_decoded() {
        let t = Target::parse("http://example.com/img/a%20b.png?size=2", None).unwrap();
        assert_eq!(t.file_name(), "a%20b.png");

        let t = Target::parse("http://example.com/x%2Fy.txt", None).unwrap();
        assert_eq!(t.file_name(), "x%2Fy.txt");
    }
}
