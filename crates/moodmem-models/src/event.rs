//! Emotion events submitted for memory absorption.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Primary emotion detected for one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionReading {
    /// Classifier label, e.g. `ANXIOUS`
    pub label: String,
    /// Raw intensity on the classifier's 1..5 scale
    pub intensity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl EmotionReading {
    pub fn new(label: impl Into<String>, intensity: f64) -> Self {
        Self {
            label: label.into(),
            intensity,
            confidence: None,
        }
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Externally measured reply quality for the persona that answered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSignal {
    /// Quality in [-1, 1]; positive means the reply helped
    pub score: f64,
}

/// One message's detected affect.
///
/// Identifier fields default to empty so that incomplete payloads still
/// deserialize; the normalizer rejects them before any store is touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionEvent {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub persona_id: Option<String>,
    #[serde(default)]
    pub emotion: Option<EmotionReading>,
    /// Raw topic list as produced upstream; may contain nulls and blanks
    #[serde(default)]
    pub topics: Vec<Option<String>>,
    #[serde(default)]
    pub secondary_emotion: Option<String>,
    #[serde(default)]
    pub outcome: Option<OutcomeSignal>,
    #[serde(default)]
    pub emotion_vector: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub detector_version: Option<String>,
    #[serde(default)]
    pub is_kernel_relevant: Option<bool>,
    /// Unix timestamp in milliseconds; defaults to processing time
    #[serde(default)]
    pub occurred_at: Option<i64>,
}

impl EmotionEvent {
    pub fn new(
        user_id: impl Into<String>,
        conversation_id: impl Into<String>,
        message_id: impl Into<String>,
        emotion: EmotionReading,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
            message_id: message_id.into(),
            emotion: Some(emotion),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_persona(mut self, persona_id: impl Into<String>) -> Self {
        self.persona_id = Some(persona_id.into());
        self
    }

    #[must_use]
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(|t| Some(t.into())).collect();
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, score: f64) -> Self {
        self.outcome = Some(OutcomeSignal { score });
        self
    }

    #[must_use]
    pub fn with_occurred_at(mut self, timestamp_ms: i64) -> Self {
        self.occurred_at = Some(timestamp_ms);
        self
    }

    /// Topics with nulls and blank entries dropped, trimmed.
    pub fn clean_topics(&self) -> Vec<String> {
        self.topics
            .iter()
            .flatten()
            .map(|topic| topic.trim())
            .filter(|topic| !topic.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Kernel relevance defaults to true unless explicitly disabled.
    pub fn kernel_relevant(&self) -> bool {
        self.is_kernel_relevant != Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_topics_drops_falsy() {
        let mut event = EmotionEvent::new("u1", "c1", "m1", EmotionReading::new("SAD", 3.0));
        event.topics = vec![
            Some("work".to_string()),
            None,
            Some("".to_string()),
            Some("  family ".to_string()),
        ];
        assert_eq!(event.clean_topics(), vec!["work", "family"]);
    }

    #[test]
    fn test_kernel_relevance_default() {
        let mut event = EmotionEvent::default();
        assert!(event.kernel_relevant());
        event.is_kernel_relevant = Some(true);
        assert!(event.kernel_relevant());
        event.is_kernel_relevant = Some(false);
        assert!(!event.kernel_relevant());
    }

    #[test]
    fn test_deserialize_partial_payload() {
        let event: EmotionEvent =
            serde_json::from_str(r#"{"user_id":"u1","topics":["a",null]}"#).unwrap();
        assert_eq!(event.user_id, "u1");
        assert!(event.conversation_id.is_empty());
        assert!(event.emotion.is_none());
        assert_eq!(event.clean_topics(), vec!["a"]);
    }
}
