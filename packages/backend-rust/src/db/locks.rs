use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle entries are pruned once the registry grows past this size
const PRUNE_THRESHOLD: usize = 256;

/// Per-profile write serialization
///
/// A guard is held across read, compute and write of one profile, so two
/// requests for the same learner never work from the same stale snapshot.
/// Different learners never contend.
#[derive(Clone, Default)]
pub struct ProfileLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl ProfileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, profile_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self.inner.lock();
            if registry.len() >= PRUNE_THRESHOLD {
                registry.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(
                registry
                    .entry(profile_id.to_string())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_id_is_serialized() {
        let locks = ProfileLocks::new();
        let guard = locks.acquire("miles").await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.acquire("miles").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        waiting.await.unwrap();
    }

    #[tokio::test]
    async fn different_ids_do_not_contend() {
        let locks = ProfileLocks::new();
        let _miles = locks.acquire("miles").await;
        let robert = tokio::time::timeout(Duration::from_millis(100), locks.acquire("robert")).await;
        assert!(robert.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = ProfileLocks::new();
        for i in 0..PRUNE_THRESHOLD + 10 {
            let _guard = locks.acquire(&format!("learner-{i}")).await;
        }
        assert!(locks.len() < PRUNE_THRESHOLD + 10);
    }
}
