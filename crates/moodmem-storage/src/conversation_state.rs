//! Conversation state storage - byte-level API for short-term aggregates.

use crate::define_versioned_storage;

define_versioned_storage! {
    /// Conversation emotion state storage keyed by conversation ID.
    pub struct ConversationStateStorage { table: "conversation_states", versions: "conversation_state_versions" }
}
