use sparrow::http::response::{Response, ResponseBuilder, StatusCode};
use sparrow::http::writer::{serialize_response, ResponseWriter};

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
    assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(StatusCode::NotImplemented.reason_phrase(), "Not Implemented");
}

#[test]
fn test_response_builder_with_headers() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .header("X-Custom", "value")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.headers.get("Content-Type").unwrap(), "text/plain");
    assert_eq!(response.headers.get("X-Custom").unwrap(), "value");
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok).body(body.clone()).build();

    let content_length = response.headers.get("Content-Length").unwrap();
    assert_eq!(content_length, body.len().to_string());
    assert_eq!(response.headers.get("Connection").unwrap(), "close");
}

#[test]
fn test_empty_body_has_zero_length() {
    let response = ResponseBuilder::new(StatusCode::Ok).build();
    assert_eq!(response.headers.get("Content-Length").unwrap(), "0");
}

#[test]
fn test_error_responses_name_their_status() {
    let response = Response::not_found();
    assert_eq!(response.status, StatusCode::NotFound);
    assert!(String::from_utf8_lossy(&response.body).contains("404 Not Found"));

    assert_eq!(Response::bad_request().status.as_u16(), 400);
    assert_eq!(Response::not_implemented().status.as_u16(), 501);
    assert_eq!(Response::internal_error().status.as_u16(), 500);
}

#[test]
fn test_serialize_response() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/html")
        .body(b"<h1>hi</h1>".to_vec())
        .build();

    let bytes = serialize_response(&response);
    let expected = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 11\r\nConnection: close\r\n\r\n<h1>hi</h1>";
    assert_eq!(bytes, expected.to_vec());
}

#[test]
fn test_binary_body_is_verbatim() {
    let body: Vec<u8> = (0..=255u8).chain([b'\r', b'\n', 0, 0]).collect();
    let response = Response::ok(body.clone());
    let bytes = serialize_response(&response);

    assert!(bytes.ends_with(&body));
}

#[tokio::test]
async fn test_response_writer_writes_everything() {
    let response = Response::ok(b"payload".to_vec());
    let mut writer = ResponseWriter::new(&response);
    let mut out: Vec<u8> = Vec::new();

    writer.write_to_stream(&mut out).await.unwrap();

    assert_eq!(out, serialize_response(&response));
    assert_eq!(writer.remaining(), 0);
}
