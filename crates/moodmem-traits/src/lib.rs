//! MoodMem Traits - the seams between the memory layers and their collaborators.
//!
//! - Row-store traits for conversation states, user profiles and message records
//! - `FactStore` for read-only semantic facts
//! - `AnchorDetector` and `ReasonDeriver` for best-effort text analysis
//! - `MemoryError` and the crate-wide `Result` alias

pub mod detector;
pub mod error;
pub mod store;

pub use detector::{AnchorDetector, NoAnchors, NoReason, ReasonDeriver, ReasonRequest};
pub use error::{MemoryError, Result};
pub use store::{ConversationStateStore, FactStore, MessageStore, ProfileStore, PutOutcome};
