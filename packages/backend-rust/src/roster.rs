//! Named-profile selector: the fixed set of learners this deployment serves.

use chrono::{DateTime, Utc};
use mathwiz_algo::LearnerProfile;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Later duplicates of an id are ignored
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        let mut unique: Vec<RosterEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !unique.iter().any(|e| e.id == entry.id) {
                unique.push(entry);
            }
        }
        Self { entries: unique }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Profile for a learner who has never been persisted
    pub fn fresh_profile(&self, id: &str, now: DateTime<Utc>) -> Option<LearnerProfile> {
        self.get(id)
            .map(|entry| LearnerProfile::new(entry.id.clone(), entry.name.clone(), now))
    }
}
