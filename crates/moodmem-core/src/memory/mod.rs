//! Memory layers: event normalization, short-term windows, long-term
//! profiles, persona snapshots, and block composition.

pub mod composer;
pub mod long_term;
pub mod normalizer;
pub mod persona_snapshot;
pub mod short_term;
pub mod stage;
pub mod stats;
pub mod templates;

pub use composer::{IdentityMemory, MemoryBlockComposer, MemoryBlockParams};
pub use long_term::LongTermAggregator;
pub use normalizer::{ValidatedEvent, validate};
pub use persona_snapshot::{PersonaSnapshot, PersonaSnapshotBuilder, TaggedFact};
pub use short_term::{ShortTermSignal, ShortTermTracker};
pub use stage::{EventOutcome, EventReport, RejectReason, StageOutcome};
pub use templates::{HintKind, Language};
