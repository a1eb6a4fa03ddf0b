//! MoodMem Storage - Low-level storage abstraction layer
//!
//! This crate provides the persistence layer for MoodMem, using redb as the
//! embedded database. It exposes byte-level APIs so that it does not depend
//! on the model crate; typed wrappers live in moodmem-core.
//!
//! # Tables
//!
//! - `conversation_states` / `conversation_state_versions` - short-term aggregates
//! - `user_profiles` / `user_profile_versions` - long-term aggregates
//! - `messages`, `message_timeline_index`, `message_index_keys` - message records
//! - `semantic_facts` - user facts
//! - `system_config` - memory configuration

pub mod config;
pub mod conversation_state;
pub mod message;
pub mod paths;
pub mod range_utils;
pub mod semantic_fact;
pub mod user_profile;
pub mod versioned_storage;

pub use config::{ConfigStorage, MemoryConfig};
pub use conversation_state::ConversationStateStorage;
pub use message::{MessageStorage, TimelinePosition};
pub use semantic_fact::SemanticFactStorage;
pub use user_profile::UserProfileStorage;
pub use versioned_storage::{VersionedPut, VersionedStorage};
