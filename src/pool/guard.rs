//! RAII guard for a checked-out handle.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::janitor::HandleId;
use crate::pool::handle_pool::Shared;

/// A handle on loan from a [`HandlePool`](crate::pool::HandlePool).
///
/// Dropping the guard checks the handle back in; [`destroy`](Self::destroy)
/// discards it instead.
pub struct PooledHandle<T> {
    id: HandleId,
    value: Option<T>,
    pool: Arc<Shared<T>>,
}

impl<T> PooledHandle<T> {
    pub(crate) fn new(id: HandleId, value: T, pool: Arc<Shared<T>>) -> Self {
        Self {
            id,
            value: Some(value),
            pool,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Discard the handle rather than returning it to the pool.
    pub fn destroy(mut self) {
        if let Some(value) = self.value.take() {
            self.pool.destroy(self.id, value);
        }
    }
}

impl<T> Deref for PooledHandle<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // Only `destroy` and `drop` take the value, and both consume the guard.
        self.value.as_ref().expect("pooled handle already released")
    }
}

impl<T> DerefMut for PooledHandle<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("pooled handle already released")
    }
}

impl<T> Drop for PooledHandle<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.checkin(self.id, value);
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for PooledHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledHandle")
            .field("id", &self.id)
            .field("value", &self.value)
            .finish()
    }
}
