//! Per-submission mutation locks shared across request handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes mutations (update, soft-delete toggle, hard delete) per
/// submission id so concurrent requests cannot interleave blob moves.
#[derive(Default)]
pub struct SubmissionLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SubmissionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a submission id, waiting if another request
    /// holds it. The guard releases on drop.
    pub async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().expect("submission lock registry poisoned");
            map.entry(id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
