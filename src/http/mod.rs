//! HTTP/1.x message model and wire codec shared by the client and server.
//!
//! # Architecture
//!
//! - **`headers`**: Ordered, case-insensitive header map (last occurrence wins)
//! - **`request`**: Method, version and request-head representation
//! - **`response`**: Status codes, outbound responses and received response heads
//! - **`parser`**: CRLF line splitting and request/status/header line parsing
//! - **`writer`**: Byte-exact serialization of requests and responses
//! - **`connection`**: The server-side per-connection state machine
//! - **`encoding`**: gzip content-coding negotiation and codec
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! Each accepted connection carries exactly one exchange:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for the request head (bounded by a timeout)
//!        └──────┬──────┘
//!               │ Head parsed          │ Malformed / stalled
//!               ▼                      ▼
//!        ┌──────────────────┐   400 Bad Request
//!        │   Processing     │ ← Resolve resource, build response
//!        └──────┬───────────┘          │
//!               ▼                      │
//!        ┌──────────────────┐          │
//!        │    Writing       │ ◄────────┘
//!        └──────┬───────────┘
//!               ▼
//!             Closed
//! ```

pub mod connection;
pub mod encoding;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

pub use headers::Headers;
pub use request::{Method, Request, RequestBuilder, Version};
pub use response::{Response, ResponseBuilder, ResponseHead, StatusCode, StatusLine};
