//! Message-level emotion fields.

use crate::event::EmotionReading;
use crate::intensity::{intensity01, normalize_label};
use crate::trend::Trend;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_true() -> bool {
    true
}

/// One stored chat message with the emotion fields this subsystem reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub message_id: String,
    pub user_id: String,
    pub conversation_id: String,

    /// Raw message text, used only for anchor and reason detection
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub emotion: Option<EmotionReading>,

    /// Unix timestamp in milliseconds
    pub created_at: i64,

    /// Raw intensity change from the previous same-user message
    #[serde(default)]
    pub intensity_delta: Option<f64>,

    #[serde(default)]
    pub trend: Option<Trend>,

    #[serde(default)]
    pub secondary_emotion: Option<String>,

    #[serde(default)]
    pub emotion_vector: Option<BTreeMap<String, f64>>,

    #[serde(default)]
    pub topic_tags: Vec<String>,

    #[serde(default)]
    pub detector_version: Option<String>,

    #[serde(default = "default_true")]
    pub is_kernel_relevant: bool,
}

impl MessageRecord {
    pub fn new(
        message_id: impl Into<String>,
        user_id: impl Into<String>,
        conversation_id: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
            text: None,
            emotion: None,
            created_at,
            intensity_delta: None,
            trend: None,
            secondary_emotion: None,
            emotion_vector: None,
            topic_tags: Vec::new(),
            detector_version: None,
            is_kernel_relevant: true,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_emotion(mut self, emotion: EmotionReading) -> Self {
        self.emotion = Some(emotion);
        self
    }

    #[must_use]
    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topic_tags = topics;
        self
    }

    /// Canonical label of the primary emotion, if any.
    pub fn label(&self) -> Option<String> {
        self.emotion
            .as_ref()
            .and_then(|emotion| normalize_label(&emotion.label))
    }

    /// Raw intensity of the primary emotion.
    pub fn raw_intensity(&self) -> Option<f64> {
        self.emotion.as_ref().map(|emotion| emotion.intensity)
    }

    /// Intensity normalized to [0, 1].
    pub fn intensity01(&self) -> Option<f64> {
        self.raw_intensity().map(intensity01)
    }

    /// Whether this record takes part in rolling windows.
    pub fn has_emotion(&self) -> bool {
        self.label().is_some()
    }
}

/// Partial update of a message record keyed by message ID.
///
/// Only fields that are `Some` are written. Applying a patch to a message
/// that does not exist yet creates it from the identifiers in the patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePatch {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub emotion: Option<EmotionReading>,
    #[serde(default)]
    pub intensity_delta: Option<f64>,
    #[serde(default)]
    pub trend: Option<Trend>,
    #[serde(default)]
    pub secondary_emotion: Option<String>,
    #[serde(default)]
    pub emotion_vector: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub topic_tags: Option<Vec<String>>,
    #[serde(default)]
    pub detector_version: Option<String>,
    #[serde(default)]
    pub is_kernel_relevant: Option<bool>,
    /// Creation time used when the patch creates the record
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl MessagePatch {
    /// Patch carrying only the short-term trend fields.
    pub fn trend(intensity_delta: Option<f64>, trend: Option<Trend>) -> Self {
        Self {
            intensity_delta,
            trend,
            ..Self::default()
        }
    }

    pub fn apply(&self, record: &mut MessageRecord) {
        if let Some(user_id) = &self.user_id {
            record.user_id = user_id.clone();
        }
        if let Some(conversation_id) = &self.conversation_id {
            record.conversation_id = conversation_id.clone();
        }
        if let Some(emotion) = &self.emotion {
            record.emotion = Some(emotion.clone());
        }
        if let Some(delta) = self.intensity_delta {
            record.intensity_delta = Some(delta);
        }
        if let Some(trend) = self.trend {
            record.trend = Some(trend);
        }
        if let Some(secondary) = &self.secondary_emotion {
            record.secondary_emotion = Some(secondary.clone());
        }
        if let Some(vector) = &self.emotion_vector {
            record.emotion_vector = Some(vector.clone());
        }
        if let Some(tags) = &self.topic_tags {
            record.topic_tags = tags.clone();
        }
        if let Some(version) = &self.detector_version {
            record.detector_version = Some(version.clone());
        }
        if let Some(relevant) = self.is_kernel_relevant {
            record.is_kernel_relevant = relevant;
        }
    }

    /// Build a fresh record from this patch.
    pub fn into_record(&self, message_id: &str, fallback_created_at: i64) -> MessageRecord {
        let mut record = MessageRecord::new(
            message_id,
            self.user_id.clone().unwrap_or_default(),
            self.conversation_id.clone().unwrap_or_default(),
            self.created_at.unwrap_or(fallback_created_at),
        );
        self.apply(&mut record);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_only_touches_set_fields() {
        let mut record = MessageRecord::new("m1", "u1", "c1", 10)
            .with_text("hello")
            .with_emotion(EmotionReading::new("calm", 2.0))
            .with_topics(vec!["work".to_string()]);

        MessagePatch::trend(Some(-1.0), Some(Trend::Down)).apply(&mut record);

        assert_eq!(record.intensity_delta, Some(-1.0));
        assert_eq!(record.trend, Some(Trend::Down));
        assert_eq!(record.text.as_deref(), Some("hello"));
        assert_eq!(record.topic_tags, vec!["work"]);
        assert_eq!(record.label().as_deref(), Some("CALM"));
    }

    #[test]
    fn test_patch_creates_record() {
        let patch = MessagePatch {
            user_id: Some("u1".to_string()),
            conversation_id: Some("c1".to_string()),
            emotion: Some(EmotionReading::new("ANXIOUS", 4.0)),
            is_kernel_relevant: Some(false),
            ..MessagePatch::default()
        };
        let record = patch.into_record("m9", 42);
        assert_eq!(record.message_id, "m9");
        assert_eq!(record.created_at, 42);
        assert!(!record.is_kernel_relevant);
        assert!((record.intensity01().unwrap() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_missing_relevance_flag_defaults_true() {
        let record: MessageRecord = serde_json::from_str(
            r#"{"message_id":"m1","user_id":"u1","conversation_id":"c1","created_at":1}"#,
        )
        .unwrap();
        assert!(record.is_kernel_relevant);
        assert!(!record.has_emotion());
    }
}
