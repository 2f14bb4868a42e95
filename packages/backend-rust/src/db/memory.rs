use std::collections::HashMap;
use std::sync::Arc;

use mathwiz_algo::LearnerProfile;
use parking_lot::RwLock;

use super::{prepare_for_write, ProfileStore, StoreError};

/// Process-local store used when no database is configured
#[derive(Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Arc<RwLock<HashMap<String, LearnerProfile>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn get(&self, id: &str) -> Result<Option<LearnerProfile>, StoreError> {
        Ok(self.profiles.read().get(id).cloned())
    }

    async fn upsert(&self, id: &str, profile: &LearnerProfile) -> Result<LearnerProfile, StoreError> {
        let stored = prepare_for_write(id, profile);
        self.profiles.write().insert(id.to_string(), stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn upsert_then_get_returns_normalized_copy() {
        let store = MemoryProfileStore::new();
        assert!(store.get("miles").await.unwrap().is_none());

        let mut profile = LearnerProfile::new("someone-else", "Miles", Utc::now());
        profile.xp = 2_500;
        profile.level = 1;
        profile.total_problems_completed = 4;
        profile.correct_answers = 3;

        let stored = store.upsert("miles", &profile).await.unwrap();
        assert_eq!(stored.id, "miles");
        assert_eq!(stored.level, 3);
        assert_eq!(stored.accuracy_rate, 75);

        let fetched = store.get("miles").await.unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(store.len(), 1);
    }
}
