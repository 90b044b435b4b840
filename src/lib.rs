//! Sparrow - minimal HTTP/1.1 client and static file server
//!
//! Shared codec in [`http`], the accept loop and file handler in
//! [`server`], and the single-request fetcher in [`client`].

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod server;
