use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::db::{MemoryProfileStore, ProfileLocks, Store};
use crate::roster::Roster;

#[derive(Clone)]
pub struct AppState {
    store: Store,
    locks: ProfileLocks,
    roster: Arc<Roster>,
    started_at: Instant,
    started_at_system: SystemTime,
}

impl AppState {
    pub fn new(store: Store, roster: Roster) -> Self {
        Self {
            store,
            locks: ProfileLocks::new(),
            roster: Arc::new(roster),
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
        }
    }

    /// State backed by a fresh in-memory store
    pub fn in_memory(roster: Roster) -> Self {
        Self::new(Store::Memory(MemoryProfileStore::new()), roster)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn locks(&self) -> &ProfileLocks {
        &self.locks
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }
}
