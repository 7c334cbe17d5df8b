//! Bounded pool of [`Database`] handles for one backend configuration.
//!
//! All bookkeeping sits behind one short, non-reentrant lock that is never held
//! across backend I/O. Acquiring never waits: when every slot is taken the call
//! fails with [`SqlPoolError::PoolExhausted`] and the caller decides whether to
//! retry (see [`ConnectionPool::acquire_with_retry`]).

pub mod connection;
pub mod types;

pub use connection::PooledConnection;
pub use types::{ConnectionId, PoolStatus};

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::ConnectionConfig;
use crate::database::Database;
use crate::error::SqlPoolError;
use crate::factory::connect_direct;
use crate::types::DatabaseType;

struct IdleConnection {
    id: ConnectionId,
    db: Box<dyn Database>,
}

#[derive(Default)]
struct PoolState {
    idle: VecDeque<IdleConnection>,
    in_use: HashSet<ConnectionId>,
    connecting: usize,
}

pub(crate) struct PoolShared {
    kind: DatabaseType,
    config: ConnectionConfig,
    key: String,
    max_size: usize,
    next_id: AtomicU64,
    state: Mutex<PoolState>,
}

impl PoolShared {
    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        // Bookkeeping stays consistent across a panic elsewhere; recover the guard.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return a checked-out connection. Anything not recycled is handed back to
    /// be dropped once the lock is released.
    pub(crate) fn check_in(
        &self,
        id: ConnectionId,
        db: Box<dyn Database>,
    ) -> (bool, Option<Box<dyn Database>>) {
        let mut state = self.lock_state();
        if !state.in_use.remove(&id) {
            warn!(pool_key = %self.key, %id, "attempted to release unknown connection");
            return (false, Some(db));
        }
        if !db.is_open() {
            info!(pool_key = %self.key, %id, "discarding closed connection instead of reusing it");
            return (true, Some(db));
        }
        state.idle.push_back(IdleConnection { id, db });
        info!(
            pool_key = %self.key,
            %id,
            idle = state.idle.len(),
            in_use = state.in_use.len(),
            "connection released back to pool"
        );
        (true, None)
    }

    /// Drop a connection from the in-use set without recycling it.
    pub(crate) fn forget(&self, id: ConnectionId) -> bool {
        let removed = self.lock_state().in_use.remove(&id);
        if removed {
            info!(pool_key = %self.key, %id, "connection detached from pool");
        } else {
            warn!(pool_key = %self.key, %id, "attempted to detach unknown connection");
        }
        removed
    }
}

/// Holds one reserved slot while a new connection is being opened.
///
/// Dropping it without [`Reservation::complete`] (a failed or cancelled
/// connect) gives the slot back.
struct Reservation<'a> {
    shared: &'a PoolShared,
    armed: bool,
}

impl Reservation<'_> {
    fn complete(mut self, id: ConnectionId) {
        let mut state = self.shared.lock_state();
        state.connecting -= 1;
        state.in_use.insert(id);
        self.armed = false;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.lock_state().connecting -= 1;
        }
    }
}

enum Checkout<'a> {
    Reuse(IdleConnection),
    Create(Reservation<'a>),
    Exhausted,
}

/// Bounded, non-blocking pool of backend connections.
///
/// Cloning is cheap and every clone shares the same connections. Connections
/// are created lazily up to `max_size`; released connections are reused
/// oldest-first.
///
/// ```rust,no_run
/// use sql_pool_access::prelude::*;
///
/// # async fn demo() -> Result<(), SqlPoolError> {
/// let cfg = ConnectionConfig::builder().path("app.db").finish();
/// let pool = ConnectionPool::new(DatabaseType::Sqlite, cfg, 2);
/// let mut conn = pool.acquire().await?;
/// conn.select(&StatementBuilder::new().table("users")).await.print();
/// pool.release(conn);
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct ConnectionPool {
    shared: Arc<PoolShared>,
}

impl ConnectionPool {
    #[must_use]
    pub fn new(kind: DatabaseType, config: ConnectionConfig, max_size: usize) -> Self {
        let key = config.pool_key(kind);
        info!(pool_key = %key, backend = %kind, max_size, "connection pool constructed");
        Self {
            shared: Arc::new(PoolShared {
                kind,
                config,
                key,
                max_size,
                next_id: AtomicU64::new(1),
                state: Mutex::new(PoolState::default()),
            }),
        }
    }

    #[must_use]
    pub fn kind(&self) -> DatabaseType {
        self.shared.kind
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.shared.key
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.shared.max_size
    }

    /// Check out a connection: reuse the oldest idle one that is still open, else
    /// open a new one if below `max_size`, else fail immediately. Idle connections
    /// found closed are discarded on the way.
    ///
    /// # Errors
    /// Returns `SqlPoolError::PoolExhausted` when no connection is available or
    /// creatable, or the backend's connection error when opening a new one fails
    /// (the pool size is unchanged in that case).
    pub async fn acquire(&self) -> Result<PooledConnection, SqlPoolError> {
        // Idle entries whose backend went away while parked; dropped after unlocking.
        let mut stale: Vec<IdleConnection> = Vec::new();
        let checkout = {
            let mut state = self.shared.lock_state();
            debug!(
                pool_key = %self.shared.key,
                idle = state.idle.len(),
                in_use = state.in_use.len(),
                connecting = state.connecting,
                "acquire called"
            );

            loop {
                match state.idle.pop_front() {
                    Some(idle) if idle.db.is_open() => {
                        state.in_use.insert(idle.id);
                        break Checkout::Reuse(idle);
                    }
                    Some(idle) => stale.push(idle),
                    None if state.in_use.len() + state.connecting >= self.shared.max_size => {
                        break Checkout::Exhausted;
                    }
                    None => {
                        state.connecting += 1;
                        break Checkout::Create(Reservation {
                            shared: &self.shared,
                            armed: true,
                        });
                    }
                }
            }
        };

        if !stale.is_empty() {
            info!(
                pool_key = %self.shared.key,
                count = stale.len(),
                "discarding idle connections that closed while parked"
            );
            drop(stale);
        }

        let reservation = match checkout {
            Checkout::Reuse(IdleConnection { id, db }) => {
                info!(pool_key = %self.shared.key, %id, "reusing existing connection from pool");
                return Ok(PooledConnection::new(id, db, Arc::downgrade(&self.shared)));
            }
            Checkout::Exhausted => {
                warn!(
                    pool_key = %self.shared.key,
                    max_size = self.shared.max_size,
                    "connection pool exhausted"
                );
                return Err(SqlPoolError::PoolExhausted {
                    max_size: self.shared.max_size,
                });
            }
            Checkout::Create(reservation) => reservation,
        };

        let db = match self.open_connection().await {
            Ok(db) => db,
            Err(e) => {
                error!(pool_key = %self.shared.key, error = %e, "failed to create new connection");
                return Err(e);
            }
        };

        let id = ConnectionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        reservation.complete(id);
        info!(pool_key = %self.shared.key, %id, "new connection created and added to in-use");
        Ok(PooledConnection::new(id, db, Arc::downgrade(&self.shared)))
    }

    /// Caller-side polling for a free connection: retry on exhaustion with a fixed
    /// delay, up to `attempts` tries in total. At least one attempt is always made,
    /// so `attempts == 0` behaves like `1`.
    ///
    /// # Errors
    /// Returns the last exhaustion error once attempts run out, or any other
    /// acquire error immediately.
    pub async fn acquire_with_retry(
        &self,
        attempts: usize,
        delay: Duration,
    ) -> Result<PooledConnection, SqlPoolError> {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.acquire().await {
                Err(e) if e.is_pool_exhausted() && attempt < attempts => {
                    debug!(pool_key = %self.shared.key, attempt, "pool exhausted, retrying");
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    /// Return a connection for reuse.
    ///
    /// Returns `false` (and logs a warning) for a connection that this pool does
    /// not own; such a handle goes back to its own pool instead. A connection
    /// whose backend was closed while checked out is discarded, not reused.
    pub fn release(&self, mut conn: PooledConnection) -> bool {
        if !conn.belongs_to(&self.shared) {
            warn!(
                pool_key = %self.shared.key,
                id = %conn.id(),
                "attempted to release a connection owned by another pool"
            );
            return false;
        }
        let Some(db) = conn.take_database() else {
            return false;
        };
        let (released, leftover) = self.shared.check_in(conn.id(), db);
        drop(leftover);
        released
    }

    /// Close every idle connection. Checked-out connections are untouched.
    pub fn clear(&self) -> usize {
        let drained: Vec<IdleConnection> = self.shared.lock_state().idle.drain(..).collect();
        let count = drained.len();
        drop(drained);
        info!(pool_key = %self.shared.key, count, "idle connections cleared");
        count
    }

    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let state = self.shared.lock_state();
        let mut in_use: Vec<ConnectionId> = state.in_use.iter().copied().collect();
        in_use.sort_unstable();
        PoolStatus {
            max_size: self.shared.max_size,
            idle: state.idle.iter().map(|c| c.id).collect(),
            in_use,
            connecting: state.connecting,
        }
    }

    async fn open_connection(&self) -> Result<Box<dyn Database>, SqlPoolError> {
        let mut db = connect_direct(self.shared.kind, self.shared.config.clone())?;
        db.connect().await?;
        Ok(db)
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("key", &self.shared.key)
            .field("max_size", &self.shared.max_size)
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    fn sqlite_pool(dir: &tempfile::TempDir, max_size: usize) -> ConnectionPool {
        let path = dir.path().join("idle.db");
        let cfg = ConnectionConfig::builder()
            .path(path.to_string_lossy())
            .finish();
        ConnectionPool::new(DatabaseType::Sqlite, cfg, max_size)
    }

    // Stand-in for a server dropping a parked connection.
    async fn close_oldest_idle(pool: &ConnectionPool) {
        let mut idle = pool
            .shared
            .lock_state()
            .idle
            .pop_front()
            .expect("an idle connection");
        idle.db.close().await;
        pool.shared.lock_state().idle.push_front(idle);
    }

    #[tokio::test]
    async fn closed_idle_connection_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let pool = sqlite_pool(&dir, 2);
        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        let id_b = b.id();
        pool.release(a);
        pool.release(b);

        close_oldest_idle(&pool).await;

        let conn = pool.acquire().await.unwrap();
        assert_eq!(conn.id(), id_b);
        assert!(conn.is_open());
        let status = pool.status();
        assert_eq!(status.idle_count(), 0);
        assert_eq!(status.in_use, vec![id_b]);
    }

    #[tokio::test]
    async fn closed_idle_connection_frees_its_slot() {
        let dir = tempfile::tempdir().unwrap();
        let pool = sqlite_pool(&dir, 1);
        let conn = pool.acquire().await.unwrap();
        let old_id = conn.id();
        pool.release(conn);

        close_oldest_idle(&pool).await;

        let fresh = pool.acquire().await.unwrap();
        assert_ne!(fresh.id(), old_id);
        assert!(fresh.is_open());
        assert_eq!(pool.status().total(), 1);
    }
}
