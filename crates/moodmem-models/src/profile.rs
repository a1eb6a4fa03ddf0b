//! Long-term emotional profile spanning all conversations of a user.

use crate::conversation::LabelStat;
use crate::trend::Trend;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-label long-term statistics share the short-term shape.
pub type EmotionStat = LabelStat;

/// Decayed interest score for one topic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopicStat {
    pub count: u32,
    /// Decayed score in [0, 10]
    pub score: f64,
    pub last_seen_at: i64,
}

/// Running outcome-quality estimate for one (user, persona) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonaAffinity {
    pub uses: u64,
    /// Mean outcome in [-1, 1]
    pub avg_outcome: f64,
    pub last_used_at: i64,
    #[serde(default)]
    pub last_trend: Option<Trend>,
}

/// Most recent emotional reading absorbed into the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelSnapshot {
    pub last_emotion: String,
    /// Normalized intensity in [0, 1]
    pub last_intensity: f64,
    pub last_updated_at: i64,
    #[serde(default)]
    pub reason_label: Option<String>,
}

/// Named scalar scores carried by profiles imported from older rows.
///
/// Each score is in [0, 1]. They are never written by event processing and
/// only feed the long-term fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyEmotionScores {
    pub stress: Option<f64>,
    pub anxiety: Option<f64>,
    pub sadness: Option<f64>,
    pub anger: Option<f64>,
    pub loneliness: Option<f64>,
    pub joy: Option<f64>,
    pub calm: Option<f64>,
    pub hope: Option<f64>,
    pub avg_intensity: Option<f64>,
}

impl LegacyEmotionScores {
    /// Label and score pairs, negatives first.
    pub fn named(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("STRESSED", self.stress),
            ("ANXIOUS", self.anxiety),
            ("SAD", self.sadness),
            ("ANGRY", self.anger),
            ("LONELY", self.loneliness),
            ("JOYFUL", self.joy),
            ("CALM", self.calm),
            ("HOPEFUL", self.hope),
        ]
    }

    pub fn negative_sum(&self) -> f64 {
        [self.stress, self.anxiety, self.sadness, self.anger, self.loneliness]
            .iter()
            .flatten()
            .sum()
    }

    pub fn positive_sum(&self) -> f64 {
        [self.joy, self.calm, self.hope].iter().flatten().sum()
    }

    /// Highest named score, if any is positive.
    pub fn strongest(&self) -> Option<(&'static str, f64)> {
        self.named()
            .into_iter()
            .filter_map(|(label, score)| score.map(|s| (label, s)))
            .filter(|(_, score)| *score > 0.0)
            .fold(None, |best: Option<(&'static str, f64)>, (label, score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((label, score)),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.named().iter().all(|(_, score)| score.is_none()) && self.avg_intensity.is_none()
    }
}

/// Per-user long-term memory row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEmotionProfile {
    pub user_id: String,

    #[serde(default)]
    pub emotion_stats: BTreeMap<String, EmotionStat>,

    #[serde(default)]
    pub topic_profile: BTreeMap<String, TopicStat>,

    #[serde(default)]
    pub persona_affinity: BTreeMap<String, PersonaAffinity>,

    /// EMA of |delta| / 5 in [0, 1]; `None` until the first delta arrives
    #[serde(default)]
    pub volatility_index: Option<f64>,

    /// Ordered, de-duplicated, append-only
    #[serde(default)]
    pub emotional_anchors: Vec<String>,

    #[serde(default)]
    pub recent_kernel_snapshot: Option<KernelSnapshot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_scores: Option<LegacyEmotionScores>,

    #[serde(default)]
    pub version: u64,

    pub created_at: i64,
    pub updated_at: i64,
}

impl UserEmotionProfile {
    /// The canonical empty profile for a user.
    pub fn empty(user_id: impl Into<String>, now: i64) -> Self {
        Self {
            user_id: user_id.into(),
            emotion_stats: BTreeMap::new(),
            topic_profile: BTreeMap::new(),
            persona_affinity: BTreeMap::new(),
            volatility_index: None,
            emotional_anchors: Vec::new(),
            recent_kernel_snapshot: None,
            legacy_scores: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append anchors that are not already present, preserving order.
    ///
    /// Returns the number of anchors added.
    pub fn append_anchors<I>(&mut self, anchors: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for anchor in anchors {
            if anchor.is_empty() || self.emotional_anchors.contains(&anchor) {
                continue;
            }
            self.emotional_anchors.push(anchor);
            added += 1;
        }
        added
    }
}
