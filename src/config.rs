use std::time::Duration;

use crate::cli::{ClientArgs, ServerArgs};
use crate::client::output::Destination;
use crate::client::target::Target;
use crate::error::{ClientError, ServerError};
use crate::server::docroot::DocRoot;

pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_CLIENT_PORT: u16 = 80;
pub const DEFAULT_INDEX: &str = "index.html";

const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_SERVER_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// Immutable server settings, built once at startup and shared by every
/// connection task.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub doc_root: DocRoot,
    /// Upper bound on each socket read while waiting for a request head.
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// How long in-flight connections may keep running after shutdown.
    pub shutdown_grace: Duration,
}

impl ServerConfig {
    pub fn new(doc_root: DocRoot, listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            doc_root,
            read_timeout: DEFAULT_SERVER_TIMEOUT,
            write_timeout: DEFAULT_SERVER_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Builds the configuration from parsed arguments plus the
    /// `SPARROW_BIND` and `SPARROW_TIMEOUT_MS` environment overrides.
    pub fn load(args: ServerArgs) -> Result<Self, ServerError> {
        let doc_root = DocRoot::new(&args.doc_root, &args.index)?;

        let host = std::env::var("SPARROW_BIND").unwrap_or_else(|_| DEFAULT_BIND_HOST.to_string());
        let listen_addr = if host.contains(':') {
            format!("[{}]:{}", host, args.port)
        } else {
            format!("{}:{}", host, args.port)
        };

        let timeout = timeout_from_env(DEFAULT_SERVER_TIMEOUT);
        Ok(Self {
            read_timeout: timeout,
            write_timeout: timeout,
            ..Self::new(doc_root, listen_addr)
        })
    }
}

/// Settings for one client invocation.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub target: Target,
    pub output: Destination,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl ClientConfig {
    pub fn new(target: Target, output: Destination) -> Self {
        Self {
            target,
            output,
            connect_timeout: DEFAULT_CLIENT_TIMEOUT,
            read_timeout: DEFAULT_CLIENT_TIMEOUT,
        }
    }

    pub fn load(args: ClientArgs) -> Result<Self, ClientError> {
        let target = Target::parse(&args.url, args.port)?;

        let output = match (args.file, args.dir) {
            (Some(_), Some(_)) => {
                return Err(ClientError::usage("-o and -d cannot be used together"));
            }
            (Some(file), None) => Destination::File(file),
            (None, Some(dir)) => Destination::Directory(dir),
            (None, None) => Destination::Stdout,
        };

        let timeout = timeout_from_env(DEFAULT_CLIENT_TIMEOUT);
        Ok(Self {
            connect_timeout: timeout,
            read_timeout: timeout,
            ..Self::new(target, output)
        })
    }
}

fn timeout_from_env(default: Duration) -> Duration {
    std::env::var("SPARROW_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(default)
}

