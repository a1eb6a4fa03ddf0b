//! Typed user profile storage wrapper.

use anyhow::Result;
use async_trait::async_trait;
use moodmem_models::UserEmotionProfile;
use moodmem_storage::VersionedPut;
use moodmem_traits::{ProfileStore, PutOutcome};
use redb::Database;
use std::sync::Arc;

/// Typed wrapper around moodmem-storage::UserProfileStorage.
#[derive(Debug, Clone)]
pub struct UserProfileStorage {
    inner: moodmem_storage::UserProfileStorage,
}

impl UserProfileStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            inner: moodmem_storage::UserProfileStorage::new(db)?,
        })
    }

    /// Get the profile of a user.
    pub fn get(&self, user_id: &str) -> Result<Option<UserEmotionProfile>> {
        if let Some(bytes) = self.inner.get_raw(user_id)? {
            Ok(Some(serde_json::from_slice(&bytes)?))
        } else {
            Ok(None)
        }
    }

    /// Save `profile` if nobody wrote the row since `profile.version` was read.
    pub fn save(&self, profile: &UserEmotionProfile) -> Result<PutOutcome> {
        let expected = profile.version;
        let mut row = profile.clone();
        row.version = expected + 1;
        let bytes = serde_json::to_vec(&row)?;

        Ok(
            match self
                .inner
                .put_raw_if_version(&profile.user_id, expected, &bytes)?
            {
                VersionedPut::Written(version) => PutOutcome::Written(version),
                VersionedPut::Conflict { current } => PutOutcome::Conflict { current },
            },
        )
    }

    pub fn count(&self) -> Result<usize> {
        self.inner.count()
    }
}

#[async_trait]
impl ProfileStore for UserProfileStorage {
    async fn get_profile(&self, user_id: &str) -> moodmem_traits::Result<Option<UserEmotionProfile>> {
        Ok(self.get(user_id)?)
    }

    async fn put_profile(&self, profile: &UserEmotionProfile) -> moodmem_traits::Result<PutOutcome> {
        Ok(self.save(profile)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_get_and_conflict() {
        let temp_dir = tempdir().unwrap();
        let db = Arc::new(Database::create(temp_dir.path().join("test.db")).unwrap());
        let storage = UserProfileStorage::new(db).unwrap();

        let mut profile = UserEmotionProfile::empty("user-1", 1);
        profile.volatility_index = Some(0.4);
        assert_eq!(storage.save(&profile).unwrap(), PutOutcome::Written(1));

        let stored = storage.get("user-1").unwrap().unwrap();
        assert_eq!(stored.volatility_index, Some(0.4));
        assert_eq!(stored.version, 1);

        // A second writer that also started from "absent" loses.
        assert_eq!(
            storage.save(&profile).unwrap(),
            PutOutcome::Conflict { current: Some(1) }
        );
        assert_eq!(storage.count().unwrap(), 1);
    }
}
