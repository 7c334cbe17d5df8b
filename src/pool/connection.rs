use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::database::Database;

use super::PoolShared;
use super::types::ConnectionId;

const CHECKED_OUT: &str = "pooled connection is present until it is consumed";

/// A connection checked out of a [`ConnectionPool`](super::ConnectionPool).
///
/// Derefs to [`Database`], so the CRUD surface is used directly. Dropping the
/// handle returns it to its pool; the pool is referenced weakly, so an
/// outstanding handle never keeps a pool alive. If the pool is already gone the
/// connection is simply closed.
pub struct PooledConnection {
    id: ConnectionId,
    db: Option<Box<dyn Database>>,
    pool: Weak<PoolShared>,
}

impl PooledConnection {
    pub(crate) fn new(id: ConnectionId, db: Box<dyn Database>, pool: Weak<PoolShared>) -> Self {
        Self {
            id,
            db: Some(db),
            pool,
        }
    }

    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether the owning pool still exists.
    #[must_use]
    pub fn has_pool(&self) -> bool {
        self.pool.strong_count() > 0
    }

    pub(crate) fn belongs_to(&self, shared: &Arc<PoolShared>) -> bool {
        std::ptr::eq(self.pool.as_ptr(), Arc::as_ptr(shared))
    }

    pub(crate) fn take_database(&mut self) -> Option<Box<dyn Database>> {
        self.db.take()
    }

    /// Remove this connection from the pool's bookkeeping and keep the backend
    /// connection. The freed slot lets the pool open a replacement.
    #[must_use]
    pub fn detach(mut self) -> Box<dyn Database> {
        if let Some(shared) = self.pool.upgrade() {
            shared.forget(self.id);
        }
        self.db.take().expect(CHECKED_OUT)
    }

    /// Close the backend connection and remove it from the pool for good.
    pub async fn discard(self) {
        let id = self.id;
        let mut db = self.detach();
        db.close().await;
        debug!(%id, "pooled connection discarded");
    }
}

impl Deref for PooledConnection {
    type Target = dyn Database;

    fn deref(&self) -> &Self::Target {
        self.db.as_deref().expect(CHECKED_OUT)
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.db.as_deref_mut().expect(CHECKED_OUT)
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(db) = self.db.take() else {
            return;
        };
        match self.pool.upgrade() {
            Some(shared) => {
                let (_, leftover) = shared.check_in(self.id, db);
                drop(leftover);
            }
            None => debug!(id = %self.id, "pool gone; closing connection on drop"),
        }
    }
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}
