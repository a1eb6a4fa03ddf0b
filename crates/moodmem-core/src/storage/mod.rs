//! Storage layer with typed wrappers around moodmem-storage.
//!
//! This module provides type-safe access to the storage layer by wrapping
//! the byte-level APIs from moodmem-storage with the model types, and
//! implements the row-store traits from moodmem-traits on top of them.

pub mod conversation_state;
pub mod message;
pub mod semantic_fact;
pub mod user_profile;

use anyhow::Result;
use redb::Database;
use std::sync::Arc;
use tracing::info;

// Re-export types that are self-contained in moodmem-storage
pub use moodmem_storage::{ConfigStorage, MemoryConfig};

pub use conversation_state::ConversationStateStorage;
pub use message::MessageStorage;
pub use semantic_fact::SemanticFactStorage;
pub use user_profile::UserProfileStorage;

/// Central storage manager that initializes all storage subsystems.
///
/// Provides typed access to all storage components through wrapper types
/// that convert between models and byte-level storage.
pub struct Storage {
    pub config: ConfigStorage,
    pub conversation_states: ConversationStateStorage,
    pub user_profiles: UserProfileStorage,
    pub messages: MessageStorage,
    pub semantic_facts: SemanticFactStorage,
}

impl Storage {
    /// Create a new storage instance at the given path.
    pub fn new(path: &str) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);
        info!(path, "Opened memory database");
        Self::with_db(db)
    }

    /// Initialize typed storages on an already opened database.
    pub fn with_db(db: Arc<Database>) -> Result<Self> {
        let config = ConfigStorage::new(db.clone())?;
        let conversation_states = ConversationStateStorage::new(db.clone())?;
        let user_profiles = UserProfileStorage::new(db.clone())?;
        let messages = MessageStorage::new(db.clone())?;
        let semantic_facts = SemanticFactStorage::new(db)?;

        Ok(Self {
            config,
            conversation_states,
            user_profiles,
            messages,
            semantic_facts,
        })
    }

    /// Current memory configuration, falling back to defaults.
    pub fn memory_config(&self) -> Result<MemoryConfig> {
        Ok(self.config.get_config()?.unwrap_or_default())
    }
}
