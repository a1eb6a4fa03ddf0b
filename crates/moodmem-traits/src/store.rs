//! Row-store trait abstractions.
//!
//! Aggregate rows carry a `version`. A put succeeds only when the stored
//! version still equals the version the caller read (0 for "absent"), so
//! concurrent read-modify-write cycles are detected instead of silently
//! overwriting each other. Implementations are provided by `moodmem-core`.

use async_trait::async_trait;
use moodmem_models::{
    ConversationEmotionState, MessagePatch, MessageRecord, SemanticFact, UserEmotionProfile,
};

use crate::error::Result;

/// Result of a version-checked write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// Row stored with this new version
    Written(u64),
    /// Stored version no longer matches; nothing was written
    Conflict { current: Option<u64> },
}

// ── ConversationStateStore ───────────────────────────────────────────

#[async_trait]
pub trait ConversationStateStore: Send + Sync {
    async fn get_state(&self, conversation_id: &str) -> Result<Option<ConversationEmotionState>>;

    /// Store `state` if the stored version equals `state.version`.
    async fn put_state(&self, state: &ConversationEmotionState) -> Result<PutOutcome>;
}

// ── ProfileStore ─────────────────────────────────────────────────────

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserEmotionProfile>>;

    /// Store `profile` if the stored version equals `profile.version`.
    async fn put_profile(&self, profile: &UserEmotionProfile) -> Result<PutOutcome>;
}

// ── MessageStore ─────────────────────────────────────────────────────

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Apply a partial update, creating the record when it does not exist.
    async fn patch_message(&self, message_id: &str, patch: &MessagePatch) -> Result<()>;

    async fn message_text(&self, message_id: &str) -> Result<Option<String>>;

    /// Most recent same-user records carrying an emotion, newest first.
    async fn recent_emotion_records(
        &self,
        conversation_id: &str,
        user_id: &str,
        limit: usize,
        exclude_message_id: Option<&str>,
    ) -> Result<Vec<MessageRecord>>;
}

// ── FactStore ────────────────────────────────────────────────────────

#[async_trait]
pub trait FactStore: Send + Sync {
    /// Facts of the given kinds for a user, most recently updated first.
    async fn facts(&self, user_id: &str, kinds: &[&str], limit: usize)
    -> Result<Vec<SemanticFact>>;
}
