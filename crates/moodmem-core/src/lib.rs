//! MoodMem Core - layered emotional memory for a conversational companion.
//!
//! [`EmotionMemory`] absorbs per-message emotion events into a short-term
//! window per conversation and a long-term profile per user, and composes
//! both with persona facts into one bounded text block for reply generation.
//! Nothing here fails the caller: every stage reports a [`StageOutcome`]
//! and logs what went wrong.

pub mod memory;
pub mod storage;

use anyhow::Result;
use moodmem_models::{EmotionEvent, time_utils};
use moodmem_storage::MemoryConfig;
use moodmem_traits::{
    AnchorDetector, ConversationStateStore, FactStore, MessageStore, NoAnchors, NoReason,
    ProfileStore, ReasonDeriver,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use memory::{
    EventOutcome, EventReport, IdentityMemory, Language, MemoryBlockParams, PersonaSnapshot,
    RejectReason, ShortTermSignal, StageOutcome,
};
pub use storage::Storage;

use memory::{LongTermAggregator, MemoryBlockComposer, ShortTermTracker, normalizer};

/// Row stores the memory layers read and write.
#[derive(Clone)]
pub struct MemoryStores {
    pub states: Arc<dyn ConversationStateStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub messages: Arc<dyn MessageStore>,
    /// `None` when the host has no semantic fact source
    pub facts: Option<Arc<dyn FactStore>>,
}

impl MemoryStores {
    /// Stores backed by the bundled redb database.
    pub fn from_storage(storage: &Storage) -> Self {
        Self {
            states: Arc::new(storage.conversation_states.clone()),
            profiles: Arc::new(storage.user_profiles.clone()),
            messages: Arc::new(storage.messages.clone()),
            facts: Some(Arc::new(storage.semantic_facts.clone())),
        }
    }
}

pub struct EmotionMemory {
    messages: Arc<dyn MessageStore>,
    short_term: ShortTermTracker,
    long_term: LongTermAggregator,
    composer: MemoryBlockComposer,
    config: MemoryConfig,
}

impl EmotionMemory {
    /// Memory without anchor detection or reason derivation.
    pub fn new(stores: MemoryStores, config: MemoryConfig) -> Self {
        Self::with_detectors(stores, config, Arc::new(NoAnchors), Arc::new(NoReason))
    }

    pub fn with_detectors(
        stores: MemoryStores,
        config: MemoryConfig,
        anchors: Arc<dyn AnchorDetector>,
        reasons: Arc<dyn ReasonDeriver>,
    ) -> Self {
        let short_term =
            ShortTermTracker::new(stores.states.clone(), stores.messages.clone(), config.clone());
        let long_term = LongTermAggregator::new(
            stores.profiles.clone(),
            stores.messages.clone(),
            anchors,
            reasons,
            config.clone(),
        );
        let composer = MemoryBlockComposer::new(
            stores.states,
            stores.profiles,
            stores.facts,
            config.clone(),
        );

        Self {
            messages: stores.messages,
            short_term,
            long_term,
            composer,
            config,
        }
    }

    /// Memory over the bundled store, using its persisted configuration.
    pub fn from_storage(storage: &Storage) -> Result<Self> {
        let config = storage.memory_config()?;
        Ok(Self::new(MemoryStores::from_storage(storage), config))
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Absorb one emotion event. Never fails; see the returned outcome.
    pub async fn record_event(&self, event: &EmotionEvent) -> EventOutcome {
        self.record_event_at(event, time_utils::now_ms()).await
    }

    pub async fn record_event_at(&self, event: &EmotionEvent, now: i64) -> EventOutcome {
        let event = match normalizer::validate(event, now) {
            Ok(event) => event,
            Err(reason) => {
                debug!(%reason, "Ignoring emotion event");
                return EventOutcome::Rejected { reason };
            }
        };

        let enrichment = match self
            .messages
            .patch_message(&event.message_id, &event.enrichment_patch())
            .await
        {
            Ok(()) => StageOutcome::Success { value: () },
            Err(error) => {
                warn!(
                    message_id = %event.message_id,
                    error = %error,
                    "Failed to enrich message record"
                );
                StageOutcome::failed(error)
            }
        };

        let short_term = self.short_term.update(&event, now).await;
        let long_term = self.long_term.update(&event, short_term.value(), now).await;

        let report = EventReport {
            enrichment,
            short_term,
            long_term,
        };
        debug!(
            user_id = %event.user_id,
            conversation_id = %event.conversation_id,
            message_id = %event.message_id,
            enrichment = report.enrichment.status(),
            short_term = report.short_term.status(),
            long_term = report.long_term.status(),
            "Processed emotion event"
        );
        EventOutcome::Processed(report)
    }

    /// Fire-and-forget variant of [`record_event`](Self::record_event).
    ///
    /// Must be called from within a tokio runtime. Awaiting the handle is optional.
    pub fn spawn_record(self: &Arc<Self>, event: EmotionEvent) -> JoinHandle<EventOutcome> {
        let memory = Arc::clone(self);
        tokio::spawn(async move { memory.record_event(&event).await })
    }

    /// Block for the reply generator; empty means nothing to add.
    pub async fn build_memory_block(&self, params: &MemoryBlockParams) -> String {
        self.composer.compose(params).await
    }

    pub async fn persona_snapshot(&self, user_id: &str) -> PersonaSnapshot {
        self.composer.persona_snapshot(user_id).await
    }
}
