use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::http::connection::Connection;
use crate::server::stats::ServerStats;

/// A bound listening socket plus the configuration every connection shares.
pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    stats: Arc<ServerStats>,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.listen_addr.clone(),
                source,
            })?;

        Ok(Self {
            listener,
            config: Arc::new(config),
            stats: Arc::new(ServerStats::default()),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Accepts connections until `shutdown` resolves, one task per
    /// connection. After shutdown the listener is closed at once, in-flight
    /// connections get `shutdown_grace` to finish and are aborted after that.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let Server {
            listener,
            config,
            stats,
        } = self;
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }

                accepted = listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            continue;
                        }
                    };
                    debug!(peer = %peer, "accepted connection");

                    let guard = ServerStats::connection_opened(&stats);
                    let config = Arc::clone(&config);
                    connections.spawn(async move {
                        let mut conn = Connection::new(socket, peer, config);
                        match conn.run().await {
                            Ok(()) => guard.served(),
                            Err(e) => error!("Connection error from {}: {}", peer, e),
                        }
                    });
                }

                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            error!(error = %e, "connection task panicked");
                        }
                    }
                }
            }
        }

        drop(listener);

        let drained = timeout(config.shutdown_grace, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(remaining = connections.len(), "aborting in-flight connections");
            connections.shutdown().await;
        }

        let snapshot = stats.snapshot();
        info!(
            accepted = snapshot.accepted,
            active = snapshot.active,
            served = snapshot.served,
            "server stopped"
        );
        Ok(())
    }
}

/// Binds according to `cfg` and serves until SIGINT or SIGTERM.
pub async fn run(cfg: ServerConfig) -> anyhow::Result<()> {
    let server = Server::bind(cfg).await?;
    info!("Listening on {}", server.local_addr()?);

    server.run_until(crate::server::shutdown_signal()).await
}
