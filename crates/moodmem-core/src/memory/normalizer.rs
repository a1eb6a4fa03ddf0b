//! Event validation and message enrichment.

use crate::memory::stage::RejectReason;
use moodmem_models::{EmotionEvent, EmotionReading, MessagePatch, intensity01, normalize_label};
use std::collections::BTreeMap;

/// An event that passed validation, with its derived values.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEvent {
    pub user_id: String,
    pub conversation_id: String,
    pub message_id: String,
    pub persona_id: Option<String>,
    /// Canonical uppercase label
    pub label: String,
    /// Intensity on the classifier's 1..5 scale
    pub raw_intensity: f64,
    /// Intensity normalized to [0, 1]
    pub intensity: f64,
    pub confidence: Option<f64>,
    pub topics: Vec<String>,
    pub secondary_emotion: Option<String>,
    pub emotion_vector: Option<BTreeMap<String, f64>>,
    pub detector_version: Option<String>,
    pub kernel_relevant: bool,
    pub outcome_score: Option<f64>,
    pub occurred_at: i64,
}

fn required(value: &str, reason: RejectReason) -> Result<String, RejectReason> {
    let value = value.trim();
    if value.is_empty() {
        Err(reason)
    } else {
        Ok(value.to_string())
    }
}

/// Check that an event can be absorbed and derive its normalized values.
///
/// `now` stands in for a missing `occurred_at`.
pub fn validate(event: &EmotionEvent, now: i64) -> Result<ValidatedEvent, RejectReason> {
    let user_id = required(&event.user_id, RejectReason::MissingUserId)?;
    let conversation_id = required(&event.conversation_id, RejectReason::MissingConversationId)?;
    let message_id = required(&event.message_id, RejectReason::MissingMessageId)?;

    let emotion = event.emotion.as_ref().ok_or(RejectReason::MissingEmotion)?;
    let label = normalize_label(&emotion.label).ok_or(RejectReason::MissingEmotion)?;

    let persona_id = event
        .persona_id
        .as_deref()
        .map(str::trim)
        .filter(|persona| !persona.is_empty())
        .map(str::to_string);

    Ok(ValidatedEvent {
        user_id,
        conversation_id,
        message_id,
        persona_id,
        label,
        raw_intensity: emotion.intensity,
        intensity: intensity01(emotion.intensity),
        confidence: emotion.confidence,
        topics: event.clean_topics(),
        secondary_emotion: event
            .secondary_emotion
            .as_deref()
            .and_then(normalize_label),
        emotion_vector: event.emotion_vector.clone(),
        detector_version: event.detector_version.clone(),
        kernel_relevant: event.kernel_relevant(),
        outcome_score: event
            .outcome
            .map(|outcome| outcome.score)
            .filter(|score| score.is_finite())
            .map(|score| score.clamp(-1.0, 1.0)),
        occurred_at: event.occurred_at.unwrap_or(now),
    })
}

impl ValidatedEvent {
    pub fn reading(&self) -> EmotionReading {
        EmotionReading {
            label: self.label.clone(),
            intensity: self.raw_intensity,
            confidence: self.confidence,
        }
    }

    /// Patch that writes the event's emotion fields onto its message record.
    ///
    /// Identifiers and the creation time are included so the patch can
    /// create the record when the host has not stored it.
    pub fn enrichment_patch(&self) -> MessagePatch {
        MessagePatch {
            user_id: Some(self.user_id.clone()),
            conversation_id: Some(self.conversation_id.clone()),
            emotion: Some(self.reading()),
            secondary_emotion: self.secondary_emotion.clone(),
            emotion_vector: self.emotion_vector.clone(),
            topic_tags: Some(self.topics.clone()),
            detector_version: self.detector_version.clone(),
            is_kernel_relevant: Some(self.kernel_relevant),
            created_at: Some(self.occurred_at),
            ..MessagePatch::default()
        }
    }
}
