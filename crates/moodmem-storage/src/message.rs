//! Message storage - byte-level API for message records.
//!
//! # Tables
//!
//! - `messages`: message_id -> message_data
//! - `message_timeline_index`: conversation_id:user_id:created_at:message_id -> message_id
//!   (only messages that carry an emotion are indexed)
//! - `message_index_keys`: message_id -> timeline key (for index cleanup on rewrite)
//!
//! Key segments are escaped with [`key_segment`], so IDs may contain `:`.

use crate::range_utils::{key_segment, prefix_range, sortable_timestamp};
use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

const MESSAGE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("messages");
/// Index: conversation_id:user_id:created_at:message_id -> message_id
const TIMELINE_INDEX_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("message_timeline_index");
/// Reverse lookup: message_id -> timeline key
const INDEX_KEY_TABLE: TableDefinition<&str, &str> = TableDefinition::new("message_index_keys");

/// Where a message sits on its conversation timeline.
#[derive(Debug, Clone, Copy)]
pub struct TimelinePosition<'a> {
    pub conversation_id: &'a str,
    pub user_id: &'a str,
    pub created_at: i64,
}

impl TimelinePosition<'_> {
    fn key(&self, message_id: &str) -> String {
        format!(
            "{}:{}:{}:{}",
            key_segment(self.conversation_id),
            key_segment(self.user_id),
            sortable_timestamp(self.created_at),
            key_segment(message_id)
        )
    }
}

fn timeline_prefix(conversation_id: &str, user_id: &str) -> String {
    format!("{}:{}:", key_segment(conversation_id), key_segment(user_id))
}

/// Low-level message storage with byte-level API
#[derive(Debug, Clone)]
pub struct MessageStorage {
    db: Arc<Database>,
}

impl MessageStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(MESSAGE_TABLE)?;
        write_txn.open_table(TIMELINE_INDEX_TABLE)?;
        write_txn.open_table(INDEX_KEY_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Store raw message data and keep the timeline index in sync.
    ///
    /// Pass `None` as `position` for messages that should not appear on the
    /// timeline (no emotion yet); any previous index entry is removed.
    pub fn put_raw(
        &self,
        message_id: &str,
        position: Option<TimelinePosition<'_>>,
        data: &[u8],
    ) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut message_table = write_txn.open_table(MESSAGE_TABLE)?;
            message_table.insert(message_id, data)?;

            let mut timeline = write_txn.open_table(TIMELINE_INDEX_TABLE)?;
            let mut index_keys = write_txn.open_table(INDEX_KEY_TABLE)?;

            let previous = index_keys
                .get(message_id)?
                .map(|value| value.value().to_string());
            let next = position.map(|position| position.key(message_id));

            if previous != next {
                if let Some(old_key) = previous {
                    timeline.remove(old_key.as_str())?;
                    index_keys.remove(message_id)?;
                }
                if let Some(new_key) = next {
                    timeline.insert(new_key.as_str(), message_id)?;
                    index_keys.insert(message_id, new_key.as_str())?;
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get raw message data by ID
    pub fn get_raw(&self, message_id: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MESSAGE_TABLE)?;

        if let Some(value) = table.get(message_id)? {
            Ok(Some(value.value().to_vec()))
        } else {
            Ok(None)
        }
    }

    /// List indexed messages of one user in one conversation, newest first.
    ///
    /// Stops after `limit` entries; `exclude` skips a single message ID.
    pub fn list_timeline_raw(
        &self,
        conversation_id: &str,
        user_id: &str,
        limit: usize,
        exclude: Option<&str>,
    ) -> Result<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let timeline = read_txn.open_table(TIMELINE_INDEX_TABLE)?;
        let message_table = read_txn.open_table(MESSAGE_TABLE)?;

        let (start, end) = prefix_range(&timeline_prefix(conversation_id, user_id));
        let mut messages = Vec::new();

        for item in timeline.range(start.as_str()..end.as_str())?.rev() {
            if messages.len() >= limit {
                break;
            }
            let (_, value) = item?;
            let message_id = value.value();
            if exclude == Some(message_id) {
                continue;
            }
            if let Some(data) = message_table.get(message_id)? {
                messages.push((message_id.to_string(), data.value().to_vec()));
            }
        }

        Ok(messages)
    }

    /// Count indexed messages of one user in one conversation.
    pub fn count_timeline(&self, conversation_id: &str, user_id: &str) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let timeline = read_txn.open_table(TIMELINE_INDEX_TABLE)?;

        let (start, end) = prefix_range(&timeline_prefix(conversation_id, user_id));
        let mut count = 0usize;
        for item in timeline.range(start.as_str()..end.as_str())? {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_storage() -> (MessageStorage, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        (MessageStorage::new(db).unwrap(), temp_dir)
    }

    fn at(created_at: i64) -> Option<TimelinePosition<'static>> {
        Some(TimelinePosition {
            conversation_id: "conv-1",
            user_id: "user-1",
            created_at,
        })
    }

    #[test]
    fn test_timeline_is_newest_first() {
        let (storage, _temp_dir) = create_test_storage();

        storage.put_raw("m1", at(100), b"one").unwrap();
        storage.put_raw("m2", at(300), b"three").unwrap();
        storage.put_raw("m3", at(200), b"two").unwrap();

        let listed = storage.list_timeline_raw("conv-1", "user-1", 10, None).unwrap();
        let ids: Vec<&str> = listed.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m3", "m1"]);
    }

    #[test]
    fn test_timeline_limit_and_exclude() {
        let (storage, _temp_dir) = create_test_storage();

        for i in 0..5 {
            storage
                .put_raw(&format!("m{i}"), at(i * 10), b"data")
                .unwrap();
        }

        let listed = storage
            .list_timeline_raw("conv-1", "user-1", 2, Some("m4"))
            .unwrap();
        let ids: Vec<&str> = listed.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["m3", "m2"]);
    }

    #[test]
    fn test_timeline_is_scoped_by_user_and_conversation() {
        let (storage, _temp_dir) = create_test_storage();

        storage.put_raw("m1", at(1), b"a").unwrap();
        storage
            .put_raw(
                "m2",
                Some(TimelinePosition {
                    conversation_id: "conv-1",
                    user_id: "user-2",
                    created_at: 2,
                }),
                b"b",
            )
            .unwrap();
        storage
            .put_raw(
                "m3",
                Some(TimelinePosition {
                    conversation_id: "conv-10",
                    user_id: "user-1",
                    created_at: 3,
                }),
                b"c",
            )
            .unwrap();

        assert_eq!(storage.count_timeline("conv-1", "user-1").unwrap(), 1);
        assert_eq!(storage.count_timeline("conv-1", "user-2").unwrap(), 1);
        assert_eq!(storage.count_timeline("conv-10", "user-1").unwrap(), 1);
    }

    #[test]
    fn test_colon_in_ids_does_not_cross_timelines() {
        let (storage, _temp_dir) = create_test_storage();

        let position = |conversation_id, user_id| {
            Some(TimelinePosition {
                conversation_id,
                user_id,
                created_at: 1,
            })
        };
        storage.put_raw("m1", position("a:b", "c"), b"first").unwrap();
        storage.put_raw("m2", position("a", "b:c"), b"second").unwrap();

        let listed = storage.list_timeline_raw("a:b", "c", 10, None).unwrap();
        let ids: Vec<&str> = listed.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["m1"]);
        assert_eq!(storage.count_timeline("a", "b:c").unwrap(), 1);
        assert_eq!(storage.count_timeline("a", "b").unwrap(), 0);
    }

    #[test]
    fn test_rewrite_moves_and_drops_index() {
        let (storage, _temp_dir) = create_test_storage();

        storage.put_raw("m1", None, b"no emotion").unwrap();
        assert_eq!(storage.count_timeline("conv-1", "user-1").unwrap(), 0);

        storage.put_raw("m1", at(5), b"with emotion").unwrap();
        storage.put_raw("m1", at(5), b"patched").unwrap();
        assert_eq!(storage.count_timeline("conv-1", "user-1").unwrap(), 1);

        storage.put_raw("m1", None, b"cleared").unwrap();
        assert_eq!(storage.count_timeline("conv-1", "user-1").unwrap(), 0);
        assert_eq!(storage.get_raw("m1").unwrap().unwrap(), b"cleared");
    }
}
