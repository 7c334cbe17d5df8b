use std::fmt;

/// Identity of one pooled backend connection, unique within its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) u64);

impl ConnectionId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Point-in-time view of a pool's bookkeeping.
///
/// `idle` is in reuse order (front is handed out next).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStatus {
    pub max_size: usize,
    pub idle: Vec<ConnectionId>,
    pub in_use: Vec<ConnectionId>,
    /// Slots reserved by connection attempts still in flight.
    pub connecting: usize,
}

impl PoolStatus {
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    #[must_use]
    pub fn in_use_count(&self) -> usize {
        self.in_use.len()
    }

    /// Live connections the pool is accountable for.
    #[must_use]
    pub fn total(&self) -> usize {
        self.idle.len() + self.in_use.len()
    }
}
