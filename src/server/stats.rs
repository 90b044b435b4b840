use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Process-wide connection counters, updated from every connection task.
#[derive(Debug, Default)]
pub struct ServerStats {
    accepted: AtomicU64,
    active: AtomicUsize,
    served: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub accepted: u64,
    pub active: usize,
    pub served: u64,
}

impl ServerStats {
    /// Counts a new connection as accepted and active. The connection stays
    /// active until the returned guard is dropped, including when its task
    /// is aborted.
    pub fn connection_opened(stats: &Arc<Self>) -> ConnectionGuard {
        stats.accepted.fetch_add(1, Ordering::Relaxed);
        stats.active.fetch_add(1, Ordering::AcqRel);
        ConnectionGuard {
            stats: Arc::clone(stats),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Acquire),
            served: self.served.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
pub struct ConnectionGuard {
    stats: Arc<ServerStats>,
}

impl ConnectionGuard {
    /// Marks the exchange as finished without error.
    pub fn served(&self) {
        self.stats.served.fetch_add(1, Ordering::Relaxed);
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.stats.active.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_tracks_active_connections() {
        let stats = Arc::new(ServerStats::default());

        let first = ServerStats::connection_opened(&stats);
        let second = ServerStats::connection_opened(&stats);
        assert_eq!(stats.snapshot().active, 2);

        first.served();
        drop(first);
        drop(second);

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                accepted: 2,
                active: 0,
                served: 1,
            }
        );
    }
}
