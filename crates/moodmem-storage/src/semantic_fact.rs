//! Semantic fact storage - byte-level API for user facts.
//!
//! Facts are keyed by `user_id:kind:value`, so re-putting the same value
//! refreshes it instead of duplicating it, and all values of one kind are a
//! single prefix scan away. Every segment is escaped, so IDs may contain `:`.

use crate::range_utils::{key_segment, prefix_range};
use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::sync::Arc;

const FACT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("semantic_facts");

fn fact_key(user_id: &str, kind: &str, value: &str) -> String {
    format!(
        "{}:{}:{}",
        key_segment(user_id),
        key_segment(kind),
        key_segment(value)
    )
}

fn kind_prefix(user_id: &str, kind: &str) -> String {
    format!("{}:{}:", key_segment(user_id), key_segment(kind))
}

/// Low-level semantic fact storage with byte-level API
#[derive(Debug, Clone)]
pub struct SemanticFactStorage {
    db: Arc<Database>,
}

impl SemanticFactStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(FACT_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert or refresh one fact value.
    pub fn put_raw(&self, user_id: &str, kind: &str, value: &str, data: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(FACT_TABLE)?;
            let key = fact_key(user_id, kind, value);
            table.insert(key.as_str(), data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// List every stored value of one kind for a user.
    pub fn list_kind_raw(&self, user_id: &str, kind: &str) -> Result<Vec<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FACT_TABLE)?;

        let (start, end) = prefix_range(&kind_prefix(user_id, kind));
        let mut facts = Vec::new();
        for item in table.range(start.as_str()..end.as_str())? {
            let (_, value) = item?;
            facts.push(value.value().to_vec());
        }

        Ok(facts)
    }

    /// Delete all values of one kind for a user. Returns the number removed.
    pub fn delete_kind(&self, user_id: &str, kind: &str) -> Result<usize> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(FACT_TABLE)?;
            let (start, end) = prefix_range(&kind_prefix(user_id, kind));
            let keys: Vec<String> = table
                .range(start.as_str()..end.as_str())?
                .map(|item| item.map(|(key, _)| key.value().to_string()))
                .collect::<std::result::Result<_, _>>()?;
            for key in &keys {
                table.remove(key.as_str())?;
            }
            keys.len()
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    /// Count all stored facts.
    pub fn count(&self) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FACT_TABLE)?;
        Ok(table.len()? as usize)
    }
}
