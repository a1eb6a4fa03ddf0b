//! User profile storage - byte-level API for long-term aggregates.

use crate::define_versioned_storage;

define_versioned_storage! {
    /// User emotion profile storage keyed by user ID.
    pub struct UserProfileStorage { table: "user_profiles", versions: "user_profile_versions" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VersionedPut;
    use redb::Database;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_put_and_count() {
        let temp_dir = tempdir().unwrap();
        let db = Arc::new(Database::create(temp_dir.path().join("test.db")).unwrap());
        let storage = UserProfileStorage::new(db).unwrap();

        assert_eq!(
            storage.put_raw_if_version("user-1", 0, b"a").unwrap(),
            VersionedPut::Written(1)
        );
        storage.put_raw_if_version("user-2", 0, b"b").unwrap();

        storage.put_raw_if_version("user-1", 1, b"a2").unwrap();

        assert_eq!(storage.count().unwrap(), 2);
        assert_eq!(storage.get_raw("user-1").unwrap().unwrap(), b"a2");
    }
}
