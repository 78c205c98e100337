//! Per-key serialization of cache fills.
//!
//! Two requests for the same missing entry would otherwise both download and
//! decode it. The first request to [`acquire`](InFlight::acquire) a key holds
//! its lock for the duration of the fill; later requests wait, then re-check
//! the cache and find the entry already there.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<()>>;

#[derive(Default)]
pub(crate) struct InFlight {
    slots: Mutex<HashMap<PathBuf, Slot>>,
}

/// Exclusive claim on one key. Dropping it wakes the next waiter, or forgets
/// the key entirely if nobody else is interested.
pub(crate) struct FlightGuard<'a> {
    registry: &'a InFlight,
    key: PathBuf,
    slot: Slot,
    _held: OwnedMutexGuard<()>,
}

impl InFlight {
    pub(crate) async fn acquire(&self, key: &Path) -> FlightGuard<'_> {
        let slot = self.slots().entry(key.to_path_buf()).or_default().clone();
        let held = slot.clone().lock_owned().await;
        FlightGuard { registry: self, key: key.to_path_buf(), slot, _held: held }
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Slot>> {
        // The map is only ever mutated by single, non-panicking statements.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots().len()
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut slots = self.registry.slots();
        // References: the map, `self.slot` and `self._held`. Anything above
        // that is another request waiting on (or about to wait on) this key.
        if Arc::strong_count(&self.slot) <= 3 {
            slots.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_forgets_key_after_release() {
        let registry = InFlight::default();
        let guard = registry.acquire(Path::new("/cache/a.pcm")).await;
        assert_eq!(registry.len(), 1);
        drop(guard);
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let registry = InFlight::default();
        let _a = registry.acquire(Path::new("/cache/a.pcm")).await;
        let b = tokio::time::timeout(Duration::from_secs(5), registry.acquire(Path::new("/cache/b.pcm"))).await;
        assert!(b.is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let registry = InFlight::default();
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let (registry, active, peak) = (&registry, &active, &peak);
        let work = move || async move {
            let _guard = registry.acquire(Path::new("/cache/a.pcm")).await;
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            active.fetch_sub(1, Ordering::SeqCst);
        };
        tokio::join!(work(), work(), work());
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 0);
    }
}
