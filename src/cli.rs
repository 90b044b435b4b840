//! Command line surfaces of the two binaries.
//!
//! Options take exactly one value and may appear at most once; clap rejects
//! repeats. Every rejection maps to exit status 1.

use std::path::PathBuf;

use clap::Parser;
use clap::error::ErrorKind;

use crate::config::{DEFAULT_INDEX, DEFAULT_SERVER_PORT};
use crate::error::{EXIT_OK, EXIT_USAGE};

#[derive(Parser, Debug)]
#[command(name = "server", version, about = "Serve files from DOC_ROOT over HTTP/1.1")]
pub struct ServerArgs {
    /// Port to listen on
    #[arg(
        short = 'p',
        value_name = "PORT",
        default_value_t = DEFAULT_SERVER_PORT,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub port: u16,

    /// File served for `/` and for targets ending in `/`
    #[arg(short = 'i', value_name = "INDEX", default_value = DEFAULT_INDEX)]
    pub index: String,

    /// Directory the request paths are resolved against
    #[arg(value_name = "DOC_ROOT")]
    pub doc_root: PathBuf,
}

#[derive(Parser, Debug)]
#[command(name = "client", version, about = "Fetch a resource with a single HTTP/1.1 GET")]
pub struct ClientArgs {
    /// Port to connect to (defaults to the URL's port, then 80)
    #[arg(short = 'p', value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Write the body to FILE
    #[arg(short = 'o', value_name = "FILE", conflicts_with = "dir")]
    pub file: Option<PathBuf>,

    /// Write the body into DIR, named after the last path segment
    #[arg(short = 'd', value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// URL to fetch; must start with http://
    #[arg(value_name = "URL")]
    pub url: String,
}

/// Exit status for a failed argument parse. Help and version requests are
/// not failures.
pub fn exit_code_for(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_OK,
        _ => EXIT_USAGE,
    }
}
