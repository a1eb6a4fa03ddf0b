//! Short-term emotional state scoped to one conversation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of most-recent records in a rolling window.
pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// Count and mean normalized intensity for one emotion label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelStat {
    pub count: u32,
    /// Mean intensity in [0, 1]
    pub avg_intensity: f64,
    /// Unix timestamp in milliseconds
    pub last_seen_at: i64,
}

/// Aggregate over the most recent window of same-user records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollingEmotionStats {
    pub total_count: usize,
    /// Mean normalized intensity in [0, 1]
    pub recent_avg_intensity: f64,
    /// Newest minus oldest normalized intensity in the window
    pub trend_delta: f64,
    #[serde(default)]
    pub emotions: BTreeMap<String, LabelStat>,
}

/// A topic that is currently active in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveThread {
    pub topic: String,
    pub count: u32,
    pub first_seen_at: i64,
    pub last_seen_at: i64,
    /// Highest normalized intensity seen with this topic
    pub peak_intensity: f64,
}

/// Per-conversation short-term memory row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEmotionState {
    pub conversation_id: String,
    pub user_id: String,
    pub window_size: usize,

    #[serde(default)]
    pub rolling: RollingEmotionStats,

    /// Ranked by most recent activity
    #[serde(default)]
    pub active_threads: Vec<ActiveThread>,

    /// First label ever observed in this conversation; never overwritten
    #[serde(default)]
    pub session_baseline_emotion: Option<String>,

    /// Most frequent label in the current window
    #[serde(default)]
    pub current_baseline_emotion: Option<String>,

    /// 1 minus normalized window variance, in [0, 1]; unset until a window exists
    #[serde(default)]
    pub stability_score: Option<f64>,

    /// Scalar summary used when no window samples are available
    #[serde(default)]
    pub dominant_emotion: Option<String>,

    #[serde(default)]
    pub avg_intensity: Option<f64>,

    #[serde(default)]
    pub last_kernel_update_at: Option<i64>,

    /// Optimistic-concurrency version; 0 means never stored
    #[serde(default)]
    pub version: u64,

    pub created_at: i64,
    pub updated_at: i64,
}

impl ConversationEmotionState {
    /// The canonical empty state for a conversation.
    pub fn empty(
        conversation_id: impl Into<String>,
        user_id: impl Into<String>,
        window_size: usize,
        now: i64,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
            window_size,
            rolling: RollingEmotionStats::default(),
            active_threads: Vec::new(),
            session_baseline_emotion: None,
            current_baseline_emotion: None,
            stability_score: None,
            dominant_emotion: None,
            avg_intensity: None,
            last_kernel_update_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_window(&self) -> bool {
        self.rolling.total_count > 0
    }
}
