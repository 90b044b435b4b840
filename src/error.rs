//! Error taxonomy for both programs.
//!
//! Every failure maps to a stable exit code so scripts can tell a bad
//! invocation from a network problem from an unsuccessful HTTP status.

use std::io;

use thiserror::Error;

use crate::http::parser::ParseError;

/// Exit status of a client run that delivered a 200 body.
pub const EXIT_OK: u8 = 0;
/// Bad or conflicting arguments, or the output could not be written.
pub const EXIT_USAGE: u8 = 1;
/// The peer sent something that is not a well-formed HTTP response.
pub const EXIT_PROTOCOL: u8 = 2;
/// A well-formed response with a status other than 200.
pub const EXIT_STATUS: u8 = 3;
/// Name resolution, connect, reset or timeout.
pub const EXIT_TRANSPORT: u8 = 4;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Usage(String),

    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("protocol error: {0}")]
    Malformed(#[from] ParseError),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("{code} {reason}")]
    Status { code: u16, reason: String },

    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

impl ClientError {
    pub fn usage<S: ToString>(msg: S) -> Self {
        Self::Usage(msg.to_string())
    }

    pub fn protocol<S: ToString>(msg: S) -> Self {
        Self::Protocol(msg.to_string())
    }

    pub fn transport<S: ToString>(context: S, source: io::Error) -> Self {
        Self::Transport {
            context: context.to_string(),
            source,
        }
    }

    pub fn timed_out<S: ToString>(context: S) -> Self {
        Self::transport(context, io::Error::new(io::ErrorKind::TimedOut, "timed out"))
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            ClientError::Usage(_) | ClientError::Output(_) => EXIT_USAGE,
            ClientError::Malformed(_) | ClientError::Protocol(_) => EXIT_PROTOCOL,
            ClientError::Status { .. } => EXIT_STATUS,
            ClientError::Transport { .. } => EXIT_TRANSPORT,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Usage(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ServerError {
    pub fn usage<S: ToString>(msg: S) -> Self {
        Self::Usage(msg.to_string())
    }
}
