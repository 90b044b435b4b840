use sparrow::http::parser::{
    parse_header_line, parse_http_request, parse_request_line, parse_status_line, take_line,
    ParseError, MAX_HEAD_BYTES,
};
use sparrow::http::request::{Method, Version};

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.target, "/");
    assert_eq!(parsed.version, Version::Http11);
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_http10_request() {
    let req = b"GET /index.html HTTP/1.0\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.version, Version::Http10);
    assert!(parsed.headers.is_empty());
}

#[test]
fn test_parse_multiple_headers() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.headers.len(), 3);
    assert_eq!(parsed.headers.get("user-agent").unwrap(), "test-client");
    assert_eq!(parsed.headers.get("ACCEPT").unwrap(), "*/*");
}

#[test]
fn test_duplicate_header_last_wins() {
    let req = b"GET / HTTP/1.1\r\nX-A: one\r\nHost: h\r\nx-a: two\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.headers.get("X-A").unwrap(), "two");
    let names: Vec<&str> = parsed.headers.iter().map(|(k, _)| k).collect();
    assert_eq!(names.len(), 2);
    assert!(names[0].eq_ignore_ascii_case("x-a"));
}

#[test]
fn test_incomplete_head_needs_more_input() {
    assert_eq!(
        parse_http_request(b"GET / HTTP/1.1\r\nHost: x\r\n").unwrap_err(),
        ParseError::Incomplete
    );
    assert_eq!(parse_http_request(b"GET / HT").unwrap_err(), ParseError::Incomplete);
    assert_eq!(parse_http_request(b"").unwrap_err(), ParseError::Incomplete);
}

#[test]
fn test_missing_version_is_rejected() {
    let err = parse_http_request(b"GET /\r\n\r\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidRequestLine(_)));
}

#[test]
fn test_extra_token_is_rejected() {
    let err = parse_http_request(b"GET / HTTP/1.1 extra\r\n\r\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidRequestLine(_)));
}

#[test]
fn test_double_space_is_rejected() {
    assert!(parse_request_line("GET  / HTTP/1.1").is_err());
}

#[test]
fn test_unknown_version_is_rejected() {
    let err = parse_http_request(b"GET / HTTP/1.3\r\n\r\n").unwrap_err();
    assert_eq!(err, ParseError::InvalidVersion("HTTP/1.3".into()));

    assert!(parse_request_line("GET / http/1.1").is_err());
    assert!(parse_request_line("GET / HTTP/2").is_err());
}

#[test]
fn test_target_must_be_origin_form() {
    let err = parse_request_line("GET index.html HTTP/1.1").unwrap_err();
    assert!(matches!(err, ParseError::InvalidTarget(_)));

    let err = parse_request_line("GET http://host/ HTTP/1.1").unwrap_err();
    assert!(matches!(err, ParseError::InvalidTarget(_)));
}

#[test]
fn test_unknown_method_token_parses() {
    let (method, target, _) = parse_request_line("BREW /pot HTTP/1.1").unwrap();
    assert_eq!(method, Method::Extension("BREW".into()));
    assert_eq!(target, "/pot");

    let (method, _, _) = parse_request_line("DELETE / HTTP/1.1").unwrap();
    assert_eq!(method, Method::DELETE);
}

#[test]
fn test_invalid_method_token() {
    assert_eq!(
        parse_request_line("G(T / HTTP/1.1").unwrap_err(),
        ParseError::InvalidMethod
    );
}

#[test]
fn test_bare_lf_is_rejected() {
    assert_eq!(
        parse_http_request(b"GET / HTTP/1.1\nHost: x\n\n").unwrap_err(),
        ParseError::BareLineFeed
    );
    assert_eq!(
        parse_http_request(b"GET / HTTP/1.1\r\nHost: x\n\r\n").unwrap_err(),
        ParseError::BareLineFeed
    );
}

#[test]
fn test_header_without_colon_is_rejected() {
    let err = parse_http_request(b"GET / HTTP/1.1\r\nNoColonHere\r\n\r\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidHeader(_)));
}

#[test]
fn test_header_value_is_trimmed() {
    assert_eq!(parse_header_line("Host:   example.com  ").unwrap(), ("Host", "example.com"));
    assert_eq!(parse_header_line("X-Empty:").unwrap(), ("X-Empty", ""));
    assert!(parse_header_line("Bad Name: x").is_err());
    assert!(parse_header_line(": x").is_err());
}

#[test]
fn test_oversized_head_is_rejected() {
    let mut req = b"GET / HTTP/1.1\r\n".to_vec();
    while req.len() <= MAX_HEAD_BYTES {
        req.extend_from_slice(b"X-Filler: aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\r\n");
    }
    let err = parse_http_request(&req).unwrap_err();
    assert!(matches!(
        err,
        ParseError::HeadTooLarge { .. } | ParseError::TooManyHeaders
    ));
}

#[test]
fn test_too_many_headers() {
    let mut req = b"GET / HTTP/1.1\r\n".to_vec();
    for i in 0..101 {
        req.extend_from_slice(format!("X-H{}: v\r\n", i).as_bytes());
    }
    req.extend_from_slice(b"\r\n");
    assert_eq!(parse_http_request(&req).unwrap_err(), ParseError::TooManyHeaders);
}

#[test]
fn test_repeated_header_lines_count_towards_limit() {
    let mut req = b"GET / HTTP/1.1\r\n".to_vec();
    for _ in 0..101 {
        req.extend_from_slice(b"X: a\r\n");
    }
    req.extend_from_slice(b"\r\n");
    assert_eq!(parse_http_request(&req).unwrap_err(), ParseError::TooManyHeaders);

    let mut req = b"GET / HTTP/1.1\r\n".to_vec();
    for _ in 0..100 {
        req.extend_from_slice(b"X: a\r\n");
    }
    req.extend_from_slice(b"\r\n");
    let (parsed, _) = parse_http_request(&req).unwrap();
    assert_eq!(parsed.headers.len(), 1);
}

#[test]
fn test_take_line() {
    assert_eq!(take_line(b"abc\r\nrest").unwrap(), Some(("abc", 5)));
    assert_eq!(take_line(b"abc").unwrap(), None);
    assert_eq!(take_line(b"\r\n").unwrap(), Some(("", 2)));
    assert_eq!(take_line(b"a\rb\r\n").unwrap_err(), ParseError::StrayCarriageReturn);
}

#[test]
fn test_parse_status_line() {
    let status = parse_status_line("HTTP/1.1 404 Not Found").unwrap();
    assert_eq!(status.code, 404);
    assert_eq!(status.reason, "Not Found");
    assert_eq!(status.version, Version::Http11);
    assert!(!status.is_ok());

    let status = parse_status_line("HTTP/1.0 200").unwrap();
    assert!(status.is_ok());
    assert_eq!(status.reason, "");
}

#[test]
fn test_malformed_status_lines() {
    for line in [
        "HTTP/1.1 20 OK",
        "HTTP/1.1 2000 OK",
        "HTTP/1.1 abc OK",
        "HTTP/1.1 099 Low",
        "HTTP/1.1 600 High",
        "HTTP/3 200 OK",
        "garbage",
        "",
    ] {
        assert!(
            matches!(parse_status_line(line), Err(ParseError::InvalidStatusLine(_))),
            "accepted {:?}",
            line
        );
    }
}
