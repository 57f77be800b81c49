use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

/// Process-wide lock serializing writes to shared files
///
/// Clones share the same lock.
#[derive(Debug, Clone, Default)]
pub struct WriteLock {
    inner: Arc<Mutex<()>>,
}

impl WriteLock {
    /// A fresh, unshared lock
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().await
    }

    /// Whether two handles guard the same lock
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
