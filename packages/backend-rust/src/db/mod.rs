//! Profile persistence: a narrow get/upsert contract over learner records.

pub mod locks;
pub mod memory;
pub mod sqlite_primary;
pub mod sqlite_schema;

use std::future::Future;

use mathwiz_algo::LearnerProfile;

pub use locks::ProfileLocks;
pub use memory::MemoryProfileStore;
pub use sqlite_primary::{SqliteInitError, SqliteProfileStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("profile encoding error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed get/upsert of whole learner profiles
///
/// `upsert` returns the copy as stored. Implementations normalize profiles on
/// the way in and out, so callers always see consistent derived fields.
pub trait ProfileStore: Send + Sync {
    fn get(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<LearnerProfile>, StoreError>> + Send;

    fn upsert(
        &self,
        id: &str,
        profile: &LearnerProfile,
    ) -> impl Future<Output = Result<LearnerProfile, StoreError>> + Send;
}

/// Store selected at startup
#[derive(Clone)]
pub enum Store {
    Sqlite(SqliteProfileStore),
    Memory(MemoryProfileStore),
}

impl Store {
    pub async fn from_database_url(database_url: Option<&str>) -> Result<Self, SqliteInitError> {
        match database_url {
            Some(url) => Ok(Self::Sqlite(SqliteProfileStore::connect(url).await?)),
            None => Ok(Self::Memory(MemoryProfileStore::new())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Memory(_) => "memory",
        }
    }

    pub async fn is_healthy(&self) -> bool {
        match self {
            Self::Sqlite(store) => store.ping().await.is_ok(),
            Self::Memory(_) => true,
        }
    }
}

impl ProfileStore for Store {
    async fn get(&self, id: &str) -> Result<Option<LearnerProfile>, StoreError> {
        match self {
            Self::Sqlite(store) => store.get(id).await,
            Self::Memory(store) => store.get(id).await,
        }
    }

    async fn upsert(&self, id: &str, profile: &LearnerProfile) -> Result<LearnerProfile, StoreError> {
        match self {
            Self::Sqlite(store) => store.upsert(id, profile).await,
            Self::Memory(store) => store.upsert(id, profile).await,
        }
    }
}

/// Copy of `profile` keyed to `id` with derived fields recomputed
pub(crate) fn prepare_for_write(id: &str, profile: &LearnerProfile) -> LearnerProfile {
    let mut stored = profile.clone();
    stored.id = id.to_string();
    stored.normalize();
    stored
}
