use thiserror::Error;

use crate::http::headers::Headers;
use crate::http::request::{is_token, Method, Request, Version};
use crate::http::response::StatusLine;

/// Longest single request line or header line accepted.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// Largest request head (request line + headers + blank line) accepted.
pub const MAX_HEAD_BYTES: usize = 16 * 1024;

pub const MAX_HEADERS: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("more input needed")]
    Incomplete,

    #[error("line terminated by a bare LF")]
    BareLineFeed,

    #[error("carriage return inside a line")]
    StrayCarriageReturn,

    #[error("line exceeds {} bytes", MAX_LINE_BYTES)]
    LineTooLong,

    #[error("message head exceeds the limit of {max} bytes")]
    HeadTooLarge { max: usize },

    #[error("more than {} header fields", MAX_HEADERS)]
    TooManyHeaders,

    #[error("message head is not valid UTF-8")]
    InvalidEncoding,

    #[error("malformed request line: {0:?}")]
    InvalidRequestLine(String),

    #[error("invalid method token")]
    InvalidMethod,

    #[error("request target must start with '/': {0:?}")]
    InvalidTarget(String),

    #[error("unsupported http version: {0:?}")]
    InvalidVersion(String),

    #[error("malformed header line: {0:?}")]
    InvalidHeader(String),

    #[error("malformed status line: {0:?}")]
    InvalidStatusLine(String),
}

/// Splits the first CRLF-terminated line off `buf`.
///
/// Returns the line (without CRLF) and the number of bytes consumed, or
/// `None` when no complete line is buffered yet.
pub fn take_line(buf: &[u8]) -> Result<Option<(&str, usize)>, ParseError> {
    let Some(lf) = buf.iter().position(|&b| b == b'\n') else {
        if buf.len() > MAX_LINE_BYTES {
            return Err(ParseError::LineTooLong);
        }
        return Ok(None);
    };

    if lf == 0 || buf[lf - 1] != b'\r' {
        return Err(ParseError::BareLineFeed);
    }

    let line = &buf[..lf - 1];
    if line.len() > MAX_LINE_BYTES {
        return Err(ParseError::LineTooLong);
    }
    if line.contains(&b'\r') {
        return Err(ParseError::StrayCarriageReturn);
    }

    let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidEncoding)?;
    Ok(Some((line, lf + 1)))
}

/// Parses a complete request head from the front of `buf`.
///
/// On success returns the request and the number of bytes consumed.
/// `ParseError::Incomplete` means the head is valid so far but the blank
/// line has not arrived yet.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let result = parse_head(buf);

    match result {
        Err(ParseError::Incomplete) if buf.len() >= MAX_HEAD_BYTES => {
            Err(ParseError::HeadTooLarge { max: MAX_HEAD_BYTES })
        }
        Ok((_, consumed)) if consumed > MAX_HEAD_BYTES => {
            Err(ParseError::HeadTooLarge { max: MAX_HEAD_BYTES })
        }
        other => other,
    }
}

fn parse_head(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let (line, mut consumed) = take_line(buf)?.ok_or(ParseError::Incomplete)?;
    let (method, target, version) = parse_request_line(line)?;

    let mut headers = Headers::new();
    let mut header_lines = 0;
    loop {
        let (line, n) = take_line(&buf[consumed..])?.ok_or(ParseError::Incomplete)?;
        consumed += n;

        if line.is_empty() {
            break;
        }
        // Repeated names merge, so count lines rather than entries
        header_lines += 1;
        if header_lines > MAX_HEADERS {
            return Err(ParseError::TooManyHeaders);
        }

        let (key, value) = parse_header_line(line)?;
        headers.insert(key, value);
    }

    let request = Request {
        method,
        target,
        version,
        headers,
    };
    Ok((request, consumed))
}

/// `METHOD SP TARGET SP VERSION`, exactly three single-space separated tokens.
pub fn parse_request_line(line: &str) -> Result<(Method, String, Version), ParseError> {
    let parts: Vec<&str> = line.split(' ').collect();
    let [method, target, version] = parts[..] else {
        return Err(ParseError::InvalidRequestLine(line.to_string()));
    };
    if target.is_empty() {
        return Err(ParseError::InvalidRequestLine(line.to_string()));
    }

    let method = Method::from_str(method).ok_or(ParseError::InvalidMethod)?;

    if !target.starts_with('/') || target.bytes().any(|b| b.is_ascii_control()) {
        return Err(ParseError::InvalidTarget(target.to_string()));
    }

    let version =
        Version::from_str(version).ok_or_else(|| ParseError::InvalidVersion(version.to_string()))?;

    Ok((method, target.to_string(), version))
}

/// `Name: Value`. Folded continuation lines are rejected.
pub fn parse_header_line(line: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;

    if !is_token(key) {
        return Err(ParseError::InvalidHeader(line.to_string()));
    }

    Ok((key, value.trim_matches([' ', '\t'])))
}

/// `VERSION SP CODE [SP REASON]` with a three digit code in `100..=599`.
pub fn parse_status_line(line: &str) -> Result<StatusLine, ParseError> {
    let invalid = || ParseError::InvalidStatusLine(line.to_string());

    let mut parts = line.splitn(3, ' ');
    let version = parts.next().and_then(Version::from_str).ok_or_else(invalid)?;

    let code = parts.next().ok_or_else(invalid)?;
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let code: u16 = code.parse().map_err(|_| invalid())?;
    if !(100..=599).contains(&code) {
        return Err(invalid());
    }

    let reason = parts.next().unwrap_or("").to_string();

    Ok(StatusLine {
        version,
        code,
        reason,
    })
}
