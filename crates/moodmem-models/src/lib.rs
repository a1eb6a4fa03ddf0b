//! MoodMem Models - shared data types for layered emotional memory.
//!
//! These types are persisted as JSON by `moodmem-storage` and flow through
//! the seams defined in `moodmem-traits`:
//! - `EmotionEvent` - one classified message, consumed and never stored verbatim
//! - `ConversationEmotionState` - short-term rolling window per conversation
//! - `UserEmotionProfile` - long-term profile per user
//! - `MessageRecord` / `MessagePatch` - message-level emotion fields
//! - `SemanticFact` - durable (kind, value) attributes sourced elsewhere

pub mod conversation;
pub mod event;
pub mod fact;
pub mod intensity;
pub mod message;
pub mod profile;
pub mod time_utils;
pub mod trend;

pub use conversation::{ActiveThread, ConversationEmotionState, LabelStat, RollingEmotionStats};
pub use event::{EmotionEvent, EmotionReading, OutcomeSignal};
pub use fact::{SemanticFact, kinds};
pub use intensity::{intensity01, normalize_label};
pub use message::{MessagePatch, MessageRecord};
pub use profile::{
    EmotionStat, KernelSnapshot, LegacyEmotionScores, PersonaAffinity, TopicStat,
    UserEmotionProfile,
};
pub use trend::{Trend, classify_trend};
