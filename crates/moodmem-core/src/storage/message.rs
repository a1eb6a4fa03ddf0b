//! Typed message storage wrapper.

use anyhow::Result;
use async_trait::async_trait;
use moodmem_models::{MessagePatch, MessageRecord, time_utils};
use moodmem_storage::TimelinePosition;
use moodmem_traits::MessageStore;
use redb::Database;
use std::sync::Arc;

/// Typed wrapper around moodmem-storage::MessageStorage.
///
/// Only records that carry an emotion are placed on the conversation
/// timeline; the rest are stored but never show up in rolling windows.
#[derive(Debug, Clone)]
pub struct MessageStorage {
    inner: moodmem_storage::MessageStorage,
}

impl MessageStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            inner: moodmem_storage::MessageStorage::new(db)?,
        })
    }

    /// Store or replace a whole message record.
    pub fn put(&self, record: &MessageRecord) -> Result<()> {
        let position = record.has_emotion().then(|| TimelinePosition {
            conversation_id: &record.conversation_id,
            user_id: &record.user_id,
            created_at: record.created_at,
        });
        let bytes = serde_json::to_vec(record)?;
        self.inner.put_raw(&record.message_id, position, &bytes)
    }

    pub fn get(&self, message_id: &str) -> Result<Option<MessageRecord>> {
        if let Some(bytes) = self.inner.get_raw(message_id)? {
            Ok(Some(serde_json::from_slice(&bytes)?))
        } else {
            Ok(None)
        }
    }

    /// Apply `patch` to a record, creating it when it does not exist.
    pub fn patch(&self, message_id: &str, patch: &MessagePatch) -> Result<MessageRecord> {
        let record = match self.get(message_id)? {
            Some(mut record) => {
                patch.apply(&mut record);
                record
            }
            None => patch.into_record(message_id, time_utils::now_ms()),
        };
        self.put(&record)?;
        Ok(record)
    }

    /// Newest-first records with an emotion for one user in one conversation.
    pub fn recent_with_emotion(
        &self,
        conversation_id: &str,
        user_id: &str,
        limit: usize,
        exclude_message_id: Option<&str>,
    ) -> Result<Vec<MessageRecord>> {
        let mut records = Vec::new();
        for (_, bytes) in
            self.inner
                .list_timeline_raw(conversation_id, user_id, limit, exclude_message_id)?
        {
            records.push(serde_json::from_slice(&bytes)?);
        }
        Ok(records)
    }

    pub fn count_with_emotion(&self, conversation_id: &str, user_id: &str) -> Result<usize> {
        self.inner.count_timeline(conversation_id, user_id)
    }
}

#[async_trait]
impl MessageStore for MessageStorage {
    async fn patch_message(&self, message_id: &str, patch: &MessagePatch) -> moodmem_traits::Result<()> {
        self.patch(message_id, patch)?;
        Ok(())
    }

    async fn message_text(&self, message_id: &str) -> moodmem_traits::Result<Option<String>> {
        Ok(self.get(message_id)?.and_then(|record| record.text))
    }

    async fn recent_emotion_records(
        &self,
        conversation_id: &str,
        user_id: &str,
        limit: usize,
        exclude_message_id: Option<&str>,
    ) -> moodmem_traits::Result<Vec<MessageRecord>> {
        Ok(self.recent_with_emotion(conversation_id, user_id, limit, exclude_message_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodmem_models::{EmotionReading, Trend};
    use tempfile::tempdir;

    fn setup() -> (MessageStorage, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db = Arc::new(Database::create(temp_dir.path().join("test.db")).unwrap());
        (MessageStorage::new(db).unwrap(), temp_dir)
    }

    #[test]
    fn test_only_emotional_records_are_on_timeline() {
        let (storage, _temp_dir) = setup();

        storage
            .put(&MessageRecord::new("m1", "u1", "c1", 1).with_text("hi"))
            .unwrap();
        storage
            .put(
                &MessageRecord::new("m2", "u1", "c1", 2)
                    .with_emotion(EmotionReading::new("SAD", 3.0)),
            )
            .unwrap();
        storage
            .put(
                &MessageRecord::new("m3", "u2", "c1", 3)
                    .with_emotion(EmotionReading::new("SAD", 3.0)),
            )
            .unwrap();

        let records = storage.recent_with_emotion("c1", "u1", 10, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message_id, "m2");
        assert!(storage.get("m1").unwrap().is_some());
    }

    #[test]
    fn test_patch_keeps_text_and_indexes_new_emotion() {
        let (storage, _temp_dir) = setup();
        storage
            .put(&MessageRecord::new("m1", "u1", "c1", 5).with_text("exam tomorrow"))
            .unwrap();

        let patch = MessagePatch {
            emotion: Some(EmotionReading::new("ANXIOUS", 4.0)),
            ..MessagePatch::default()
        };
        storage.patch("m1", &patch).unwrap();
        storage
            .patch("m1", &MessagePatch::trend(Some(1.0), Some(Trend::Up)))
            .unwrap();

        let records = storage.recent_with_emotion("c1", "u1", 10, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text.as_deref(), Some("exam tomorrow"));
        assert_eq!(records[0].trend, Some(Trend::Up));
    }

    #[tokio::test]
    async fn test_patch_creates_missing_record() {
        let (storage, _temp_dir) = setup();
        let store: &dyn MessageStore = &storage;

        let patch = MessagePatch {
            user_id: Some("u1".to_string()),
            conversation_id: Some("c1".to_string()),
            emotion: Some(EmotionReading::new("CALM", 1.0)),
            created_at: Some(9),
            ..MessagePatch::default()
        };
        store.patch_message("m1", &patch).await.unwrap();

        assert!(store.message_text("m1").await.unwrap().is_none());
        let records = store.recent_emotion_records("c1", "u1", 5, None).await.unwrap();
        assert_eq!(records[0].created_at, 9);
        assert!(
            store
                .recent_emotion_records("c1", "u1", 5, Some("m1"))
                .await
                .unwrap()
                .is_empty()
        );
    }
}
