//! Short-term rolling window over one conversation.
//!
//! The window is re-derived from the message timeline on every event rather
//! than maintained incrementally, so a retried write always recomputes from
//! what is actually stored.

use crate::memory::normalizer::ValidatedEvent;
use crate::memory::stage::{StageIssues, StageOutcome};
use crate::memory::stats;
use moodmem_models::{
    ActiveThread, ConversationEmotionState, LabelStat, MessagePatch, MessageRecord,
    RollingEmotionStats, Trend, classify_trend,
};
use moodmem_storage::MemoryConfig;
use moodmem_traits::{ConversationStateStore, MemoryError, MessageStore, PutOutcome};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// What the short-term stage hands to the long-term stage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ShortTermSignal {
    /// Raw intensity change from the previous same-user message
    pub intensity_delta: Option<f64>,
    pub trend: Option<Trend>,
}

pub struct ShortTermTracker {
    states: Arc<dyn ConversationStateStore>,
    messages: Arc<dyn MessageStore>,
    config: MemoryConfig,
}

impl ShortTermTracker {
    pub fn new(
        states: Arc<dyn ConversationStateStore>,
        messages: Arc<dyn MessageStore>,
        config: MemoryConfig,
    ) -> Self {
        Self {
            states,
            messages,
            config,
        }
    }

    /// Absorb one event into its conversation's window.
    ///
    /// The computed signal is returned even when the state write fails.
    pub async fn update(&self, event: &ValidatedEvent, now: i64) -> StageOutcome<ShortTermSignal> {
        let mut issues = StageIssues::default();
        let signal = self.signal(event, &mut issues).await;

        if signal.intensity_delta.is_some() {
            let patch = MessagePatch::trend(signal.intensity_delta, signal.trend);
            if let Err(error) = self.messages.patch_message(&event.message_id, &patch).await {
                warn!(
                    message_id = %event.message_id,
                    error = %error,
                    "Failed to store intensity trend on message"
                );
                issues.push("trend patch", &error);
            }
        }

        match self.persist(event, now).await {
            Ok(version) => debug!(
                conversation_id = %event.conversation_id,
                version,
                delta = ?signal.intensity_delta,
                trend = ?signal.trend,
                "Updated conversation emotion state"
            ),
            Err(error) => {
                warn!(
                    conversation_id = %event.conversation_id,
                    error = %error,
                    "Failed to update conversation emotion state"
                );
                issues.push("state upsert", &error);
            }
        }

        issues.finish(signal)
    }

    async fn signal(&self, event: &ValidatedEvent, issues: &mut StageIssues) -> ShortTermSignal {
        let previous = match self
            .messages
            .recent_emotion_records(
                &event.conversation_id,
                &event.user_id,
                1,
                Some(&event.message_id),
            )
            .await
        {
            Ok(records) => records.into_iter().next(),
            Err(error) => {
                warn!(
                    conversation_id = %event.conversation_id,
                    error = %error,
                    "Failed to load previous emotion record"
                );
                issues.push("previous record", &error);
                None
            }
        };

        let intensity_delta = previous
            .and_then(|record| record.raw_intensity())
            .map(|previous| event.raw_intensity - previous)
            .filter(|delta| delta.is_finite());

        ShortTermSignal {
            intensity_delta,
            trend: classify_trend(intensity_delta),
        }
    }

    async fn persist(&self, event: &ValidatedEvent, now: i64) -> Result<u64, MemoryError> {
        let attempts = self.config.max_write_attempts.max(1);
        let mut expected = 0;
        let mut found = None;

        for attempt in 1..=attempts {
            let mut state = match self.states.get_state(&event.conversation_id).await? {
                Some(state) => state,
                None => ConversationEmotionState::empty(
                    &event.conversation_id,
                    &event.user_id,
                    self.config.window_size,
                    now,
                ),
            };
            expected = state.version;
            state.window_size = self.config.window_size.max(1);

            let window = self.load_window(event, state.window_size).await?;
            apply_window(&mut state, event, &window, self.config.max_active_threads, now);

            match self.states.put_state(&state).await? {
                PutOutcome::Written(version) => return Ok(version),
                PutOutcome::Conflict { current } => {
                    debug!(
                        conversation_id = %event.conversation_id,
                        attempt,
                        "Conversation state changed concurrently, retrying"
                    );
                    found = current;
                }
            }
        }

        Err(MemoryError::Conflict {
            key: event.conversation_id.clone(),
            expected,
            found,
        })
    }

    /// Newest-first window that always contains the triggering message.
    async fn load_window(
        &self,
        event: &ValidatedEvent,
        window_size: usize,
    ) -> Result<Vec<MessageRecord>, MemoryError> {
        let mut window = self
            .messages
            .recent_emotion_records(&event.conversation_id, &event.user_id, window_size, None)
            .await?;

        // Enrichment may have failed to persist the current message.
        if !window
            .iter()
            .any(|record| record.message_id == event.message_id)
        {
            let current = MessageRecord::new(
                &event.message_id,
                &event.user_id,
                &event.conversation_id,
                event.occurred_at,
            )
            .with_emotion(event.reading())
            .with_topics(event.topics.clone());
            window.insert(0, current);
            window.truncate(window_size);
        }

        Ok(window)
    }
}

struct ThreadAccumulator {
    count: u32,
    first_seen_at: i64,
    last_seen_at: i64,
    peak_intensity: f64,
}

struct LabelAccumulator {
    count: u32,
    sum: f64,
    last_seen_at: i64,
}

/// Recompute every window-derived field of `state` from `window` (newest first).
pub(crate) fn apply_window(
    state: &mut ConversationEmotionState,
    event: &ValidatedEvent,
    window: &[MessageRecord],
    max_active_threads: usize,
    now: i64,
) {
    if state.dominant_emotion.is_none() {
        state.dominant_emotion = Some(event.label.clone());
    }
    if state.avg_intensity.is_none() {
        state.avg_intensity = Some(event.intensity);
    }
    state.last_kernel_update_at = Some(now);
    state.updated_at = now;

    let samples: Vec<(&MessageRecord, String, f64)> = window
        .iter()
        .filter_map(|record| Some((record, record.label()?, record.intensity01()?)))
        .collect();

    if state.session_baseline_emotion.is_none() {
        state.session_baseline_emotion = samples
            .last()
            .map(|(_, label, _)| label.clone())
            .or_else(|| Some(event.label.clone()));
    }

    if samples.is_empty() {
        return;
    }

    // Insertion order is first-seen order in the newest-first scan.
    let mut labels: Vec<(String, LabelAccumulator)> = Vec::new();
    let mut threads: Vec<(String, ThreadAccumulator)> = Vec::new();

    for (record, label, intensity) in &samples {
        let seen_at = record.created_at;
        match labels.iter_mut().find(|(existing, _)| existing == label) {
            Some((_, acc)) => {
                acc.count += 1;
                acc.sum += intensity;
                acc.last_seen_at = acc.last_seen_at.max(seen_at);
            }
            None => labels.push((
                label.clone(),
                LabelAccumulator {
                    count: 1,
                    sum: *intensity,
                    last_seen_at: seen_at,
                },
            )),
        }

        for topic in record
            .topic_tags
            .iter()
            .map(|topic| topic.trim())
            .filter(|topic| !topic.is_empty())
        {
            match threads.iter_mut().find(|(existing, _)| existing == topic) {
                Some((_, acc)) => {
                    acc.count += 1;
                    acc.first_seen_at = acc.first_seen_at.min(seen_at);
                    acc.last_seen_at = acc.last_seen_at.max(seen_at);
                    acc.peak_intensity = acc.peak_intensity.max(*intensity);
                }
                None => threads.push((
                    topic.to_string(),
                    ThreadAccumulator {
                        count: 1,
                        first_seen_at: seen_at,
                        last_seen_at: seen_at,
                        peak_intensity: *intensity,
                    },
                )),
            }
        }
    }

    let intensities: Vec<f64> = samples.iter().map(|(_, _, intensity)| *intensity).collect();
    let trend_delta = match (intensities.first(), intensities.last()) {
        (Some(newest), Some(oldest)) if intensities.len() >= 2 => newest - oldest,
        _ => 0.0,
    };

    state.current_baseline_emotion = labels
        .iter()
        .fold(None::<(&String, u32)>, |best, (label, acc)| match best {
            Some((_, count)) if count >= acc.count => best,
            _ => Some((label, acc.count)),
        })
        .map(|(label, _)| label.clone());

    state.rolling = RollingEmotionStats {
        total_count: samples.len(),
        recent_avg_intensity: stats::mean(&intensities).unwrap_or(0.0),
        trend_delta,
        emotions: labels
            .into_iter()
            .map(|(label, acc)| {
                let stat = LabelStat {
                    count: acc.count,
                    avg_intensity: acc.sum / f64::from(acc.count),
                    last_seen_at: acc.last_seen_at,
                };
                (label, stat)
            })
            .collect(),
    };

    let mut active_threads: Vec<ActiveThread> = threads
        .into_iter()
        .map(|(topic, acc)| ActiveThread {
            topic,
            count: acc.count,
            first_seen_at: acc.first_seen_at,
            last_seen_at: acc.last_seen_at,
            peak_intensity: acc.peak_intensity,
        })
        .collect();
    active_threads.sort_by(|a, b| b.last_seen_at.cmp(&a.last_seen_at));
    active_threads.truncate(max_active_threads);
    state.active_threads = active_threads;

    state.stability_score = stats::stability(&intensities);
}
