use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::sync::Arc;

/// Result of a version-checked raw write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionedPut {
    /// Stored; carries the new version
    Written(u64),
    /// The stored version differs from the expected one
    Conflict { current: Option<u64> },
}

/// Trait for aggregate tables whose rows are written with a version check.
///
/// Each storage owns a data table and a version table keyed by the same ID.
/// Implementors only need to specify the two table definitions and the
/// database reference.
pub trait VersionedStorage: Send + Sync {
    const TABLE: TableDefinition<'static, &'static str, &'static [u8]>;
    const VERSIONS: TableDefinition<'static, &'static str, u64>;

    /// Get reference to the database.
    fn db(&self) -> &Arc<Database>;

    /// Get raw bytes by ID.
    fn get_raw(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db().begin_read()?;
        let table = read_txn.open_table(Self::TABLE)?;

        if let Some(value) = table.get(id)? {
            Ok(Some(value.value().to_vec()))
        } else {
            Ok(None)
        }
    }

    /// Store raw bytes if the stored version equals `expected` (0 = absent).
    ///
    /// The check and the write happen in one write transaction.
    fn put_raw_if_version(&self, id: &str, expected: u64, data: &[u8]) -> Result<VersionedPut> {
        let write_txn = self.db().begin_write()?;
        let outcome = {
            let mut versions = write_txn.open_table(Self::VERSIONS)?;
            let current = versions.get(id)?.map(|v| v.value());

            if current.unwrap_or(0) != expected {
                VersionedPut::Conflict { current }
            } else {
                let next = expected + 1;
                let mut table = write_txn.open_table(Self::TABLE)?;
                table.insert(id, data)?;
                versions.insert(id, next)?;
                VersionedPut::Written(next)
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }

    /// Count all entries.
    fn count(&self) -> Result<usize> {
        let read_txn = self.db().begin_read()?;
        let table = read_txn.open_table(Self::TABLE)?;
        Ok(table.len()? as usize)
    }
}

/// Macro to generate a versioned storage struct with common implementations.
#[macro_export]
macro_rules! define_versioned_storage {
    ( $(#[$meta:meta])* $vis:vis struct $name:ident { table: $table_name:literal, versions: $versions_name:literal } ) => {
        const TABLE: redb::TableDefinition<'static, &'static str, &'static [u8]> =
            redb::TableDefinition::new($table_name);
        const VERSIONS: redb::TableDefinition<'static, &'static str, u64> =
            redb::TableDefinition::new($versions_name);

        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            db: std::sync::Arc<redb::Database>,
        }

        impl $name {
            pub fn new(db: std::sync::Arc<redb::Database>) -> anyhow::Result<Self> {
                let write_txn = db.begin_write()?;
                write_txn.open_table(TABLE)?;
                write_txn.open_table(VERSIONS)?;
                write_txn.commit()?;

                Ok(Self { db })
            }

            pub fn get_raw(&self, id: &str) -> anyhow::Result<Option<Vec<u8>>> {
                <Self as $crate::VersionedStorage>::get_raw(self, id)
            }

            pub fn put_raw_if_version(
                &self,
                id: &str,
                expected: u64,
                data: &[u8],
            ) -> anyhow::Result<$crate::VersionedPut> {
                <Self as $crate::VersionedStorage>::put_raw_if_version(self, id, expected, data)
            }

            pub fn count(&self) -> anyhow::Result<usize> {
                <Self as $crate::VersionedStorage>::count(self)
            }
        }

        impl $crate::VersionedStorage for $name {
            const TABLE: redb::TableDefinition<'static, &'static str, &'static [u8]> = TABLE;
            const VERSIONS: redb::TableDefinition<'static, &'static str, u64> = VERSIONS;

            fn db(&self) -> &std::sync::Arc<redb::Database> {
                &self.db
            }
        }
    };
}
