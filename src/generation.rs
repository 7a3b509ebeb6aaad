use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::Mutex;
use tracing::debug;

/// Token identifying one refresh of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

#[derive(Debug)]
struct Slot<T> {
    latest: Generation,
    committed: Option<(Generation, T)>,
}

/// Last published result of each distinct view request, guarded so that only
/// the newest refresh of the same request may publish. Refreshes of different
/// requests never see each other's results.
#[derive(Debug)]
pub struct LatestView<K, T> {
    issued: AtomicU64,
    slots: Mutex<HashMap<K, Slot<T>>>,
}

impl<K: Eq + Hash, T: Clone> LatestView<K, T> {
    pub fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Issues a new generation for `key`, superseding any refresh of the same
    /// request still in flight.
    pub async fn begin(&self, key: K) -> Generation {
        let generation = Generation(self.issued.fetch_add(1, Ordering::SeqCst) + 1);
        let mut slots = self.slots.lock().await;
        slots
            .entry(key)
            .and_modify(|slot| slot.latest = slot.latest.max(generation))
            .or_insert(Slot {
                latest: generation,
                committed: None,
            });
        generation
    }

    /// Stores `value` if `generation` is still the newest one issued for `key`.
    /// Returns whether it was stored.
    pub async fn commit(&self, key: &K, generation: Generation, value: T) -> bool {
        let mut slots = self.slots.lock().await;
        let Some(slot) = slots.get_mut(key) else {
            return false;
        };
        if slot.latest != generation {
            debug!(generation = generation.0, latest = slot.latest.0, "discarding stale result");
            return false;
        }
        if matches!(&slot.committed, Some((stored, _)) if *stored >= generation) {
            return false;
        }
        slot.committed = Some((generation, value));
        true
    }

    pub async fn current(&self, key: &K) -> Option<(Generation, T)> {
        self.slots
            .lock()
            .await
            .get(key)
            .and_then(|slot| slot.committed.clone())
    }
}

impl<K: Eq + Hash, T: Clone> Default for LatestView<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn older_generation_cannot_overwrite_newer() {
        let view = LatestView::<&str, &str>::new();
        let g1 = view.begin("today").await;
        let g2 = view.begin("today").await;

        assert!(view.commit(&"today", g2, "second").await);
        assert!(!view.commit(&"today", g1, "first").await);
        assert_eq!(view.current(&"today").await, Some((g2, "second")));
    }

    #[tokio::test]
    async fn superseded_generation_is_dropped_even_when_first() {
        let view = LatestView::<&str, u32>::new();
        let g1 = view.begin("today").await;
        let g2 = view.begin("today").await;

        assert!(!view.commit(&"today", g1, 1).await);
        assert_eq!(view.current(&"today").await, None);
        assert!(view.commit(&"today", g2, 2).await);
        assert_eq!(view.current(&"today").await, Some((g2, 2)));
    }

    #[tokio::test]
    async fn generation_commits_once() {
        let view = LatestView::<&str, u32>::new();
        let g = view.begin("today").await;
        assert!(view.commit(&"today", g, 1).await);
        assert!(!view.commit(&"today", g, 2).await);
        assert_eq!(view.current(&"today").await, Some((g, 1)));
    }

    #[tokio::test]
    async fn different_requests_do_not_supersede_each_other() {
        let view = LatestView::<&str, u32>::new();
        let today = view.begin("today").await;
        let yesterday = view.begin("yesterday").await;

        assert!(view.commit(&"yesterday", yesterday, 14).await);
        assert!(view.commit(&"today", today, 15).await);
        assert_eq!(view.current(&"today").await, Some((today, 15)));
        assert_eq!(view.current(&"yesterday").await, Some((yesterday, 14)));
    }

    #[tokio::test]
    async fn commit_without_begin_is_rejected() {
        let view = LatestView::<&str, u32>::new();
        assert!(!view.commit(&"today", Generation(1), 1).await);
        assert_eq!(view.current(&"today").await, None);
    }
}
