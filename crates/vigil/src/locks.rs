//! Per-item mutual exclusion for read-modify-write sequences

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use vigil_common::ContentId;

/// Held while a content item is being read, modified and committed
pub type ItemGuard = OwnedMutexGuard<()>;

/// Registry of per-item async locks
///
/// Serializes writers to the same content item within this process. Writers
/// to different items never contend. Entries are dropped once no guard or
/// waiter references them. Cross-process writers are caught by the store's
/// version check instead.
#[derive(Debug, Clone, Default)]
pub struct ItemLocks {
    slots: Arc<Mutex<HashMap<ContentId, Weak<AsyncMutex<()>>>>>,
}

impl ItemLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`
    pub async fn lock(&self, id: &ContentId) -> ItemGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.retain(|_, weak| weak.strong_count() > 0);
            match slots.get(id).and_then(Weak::upgrade) {
                Some(slot) => slot,
                None => {
                    let slot = Arc::new(AsyncMutex::new(()));
                    slots.insert(id.clone(), Arc::downgrade(&slot));
                    slot
                }
            }
        };
        slot.lock_owned().await
    }

    /// Number of items currently locked or awaited
    pub fn active(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.values().filter(|w| w.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_item_is_serialized() {
        let locks = ItemLocks::new();
        let id = ContentId::generate();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let id = id.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(&id).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_items_do_not_contend() {
        let locks = ItemLocks::new();
        let a = locks.lock(&ContentId::generate()).await;
        let b = locks.lock(&ContentId::generate()).await;
        assert_eq!(locks.active(), 2);
        drop((a, b));
        assert_eq!(locks.active(), 0);
    }
}
