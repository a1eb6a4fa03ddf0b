//! Typed conversation state storage wrapper.

use anyhow::Result;
use async_trait::async_trait;
use moodmem_models::ConversationEmotionState;
use moodmem_storage::VersionedPut;
use moodmem_traits::{ConversationStateStore, PutOutcome};
use redb::Database;
use std::sync::Arc;

/// Typed wrapper around moodmem-storage::ConversationStateStorage.
///
/// Rows are JSON; each successful save bumps the stored version by one.
#[derive(Debug, Clone)]
pub struct ConversationStateStorage {
    inner: moodmem_storage::ConversationStateStorage,
}

impl ConversationStateStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            inner: moodmem_storage::ConversationStateStorage::new(db)?,
        })
    }

    /// Get the state of a conversation.
    pub fn get(&self, conversation_id: &str) -> Result<Option<ConversationEmotionState>> {
        if let Some(bytes) = self.inner.get_raw(conversation_id)? {
            Ok(Some(serde_json::from_slice(&bytes)?))
        } else {
            Ok(None)
        }
    }

    /// Save `state` if nobody wrote the row since `state.version` was read.
    pub fn save(&self, state: &ConversationEmotionState) -> Result<PutOutcome> {
        let expected = state.version;
        let mut row = state.clone();
        row.version = expected + 1;
        let bytes = serde_json::to_vec(&row)?;

        Ok(
            match self
                .inner
                .put_raw_if_version(&state.conversation_id, expected, &bytes)?
            {
                VersionedPut::Written(version) => PutOutcome::Written(version),
                VersionedPut::Conflict { current } => PutOutcome::Conflict { current },
            },
        )
    }
}

#[async_trait]
impl ConversationStateStore for ConversationStateStorage {
    async fn get_state(
        &self,
        conversation_id: &str,
    ) -> moodmem_traits::Result<Option<ConversationEmotionState>> {
        Ok(self.get(conversation_id)?)
    }

    async fn put_state(&self, state: &ConversationEmotionState) -> moodmem_traits::Result<PutOutcome> {
        Ok(self.save(state)?)
    }
}
