//! Long-term profile spanning every conversation of a user.

use crate::memory::normalizer::ValidatedEvent;
use crate::memory::short_term::ShortTermSignal;
use crate::memory::stage::{StageIssues, StageOutcome};
use crate::memory::stats;
use moodmem_models::{
    KernelSnapshot, LabelStat, PersonaAffinity, TopicStat, UserEmotionProfile,
};
use moodmem_storage::MemoryConfig;
use moodmem_traits::{
    AnchorDetector, MemoryError, MessageStore, ProfileStore, PutOutcome, ReasonDeriver,
    ReasonRequest,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// History handed to the reason deriver.
const REASON_HISTORY_LIMIT: usize = 5;

pub struct LongTermAggregator {
    profiles: Arc<dyn ProfileStore>,
    messages: Arc<dyn MessageStore>,
    anchors: Arc<dyn AnchorDetector>,
    reasons: Arc<dyn ReasonDeriver>,
    config: MemoryConfig,
}

/// Everything folded into a profile for one event, computed before any write.
#[derive(Debug, Clone)]
pub(crate) struct ProfileDelta<'a> {
    pub event: &'a ValidatedEvent,
    pub signal: ShortTermSignal,
    pub anchors: &'a [String],
    pub reason_label: Option<&'a str>,
}

impl LongTermAggregator {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        messages: Arc<dyn MessageStore>,
        anchors: Arc<dyn AnchorDetector>,
        reasons: Arc<dyn ReasonDeriver>,
        config: MemoryConfig,
    ) -> Self {
        Self {
            profiles,
            messages,
            anchors,
            reasons,
            config,
        }
    }

    /// Absorb one event into the user's profile.
    ///
    /// Detector failures degrade the stage; only an unreadable or
    /// unwritable profile fails it.
    pub async fn update(
        &self,
        event: &ValidatedEvent,
        signal: Option<&ShortTermSignal>,
        now: i64,
    ) -> StageOutcome<()> {
        let mut issues = StageIssues::default();

        let prior = match self.profiles.get_profile(&event.user_id).await {
            Ok(profile) => profile,
            Err(error) => {
                warn!(
                    user_id = %event.user_id,
                    error = %error,
                    "Failed to load user emotion profile"
                );
                return StageOutcome::failed(format!("profile read: {error}"));
            }
        };

        let text = match self.messages.message_text(&event.message_id).await {
            Ok(text) => text.filter(|text| !text.trim().is_empty()),
            Err(error) => {
                warn!(
                    message_id = %event.message_id,
                    error = %error,
                    "Failed to load message text"
                );
                issues.push("message text", &error);
                None
            }
        };

        let anchors = match text.as_deref() {
            Some(text) => self.detect_anchors(event, text, &mut issues).await,
            None => Vec::new(),
        };
        let reason_label = self
            .derive_reason(event, text.as_deref(), &anchors, prior.as_ref(), now, &mut issues)
            .await;

        let delta = ProfileDelta {
            event,
            signal: signal.copied().unwrap_or_default(),
            anchors: &anchors,
            reason_label: reason_label.as_deref(),
        };

        match self.persist(prior, &delta, now).await {
            Ok(version) => debug!(
                user_id = %event.user_id,
                version,
                label = %event.label,
                anchors = anchors.len(),
                "Updated user emotion profile"
            ),
            Err(error) => {
                warn!(
                    user_id = %event.user_id,
                    error = %error,
                    "Failed to update user emotion profile"
                );
                return StageOutcome::failed(format!("profile upsert: {error}"));
            }
        }

        issues.finish(())
    }

    async fn detect_anchors(
        &self,
        event: &ValidatedEvent,
        text: &str,
        issues: &mut StageIssues,
    ) -> Vec<String> {
        match self.anchors.detect(text, &event.label, event.intensity).await {
            Ok(anchors) => anchors
                .into_iter()
                .map(|anchor| anchor.trim().to_string())
                .filter(|anchor| !anchor.is_empty())
                .collect(),
            Err(error) => {
                warn!(
                    message_id = %event.message_id,
                    error = %error,
                    "Anchor detection failed"
                );
                issues.push("anchor detection", &error);
                Vec::new()
            }
        }
    }

    async fn derive_reason(
        &self,
        event: &ValidatedEvent,
        text: Option<&str>,
        new_anchors: &[String],
        prior: Option<&UserEmotionProfile>,
        now: i64,
        issues: &mut StageIssues,
    ) -> Option<String> {
        let history = match self
            .messages
            .recent_emotion_records(
                &event.conversation_id,
                &event.user_id,
                REASON_HISTORY_LIMIT,
                None,
            )
            .await
        {
            Ok(history) => history,
            Err(error) => {
                issues.push("reason history", &error);
                Vec::new()
            }
        };

        let empty;
        let profile = match prior {
            Some(profile) => profile,
            None => {
                empty = UserEmotionProfile::empty(&event.user_id, now);
                &empty
            }
        };
        let mut known_anchors = profile.emotional_anchors.clone();
        known_anchors.extend(
            new_anchors
                .iter()
                .filter(|anchor| !profile.emotional_anchors.contains(anchor))
                .cloned(),
        );

        let request = ReasonRequest {
            text,
            anchors: &known_anchors,
            history: &history,
            profile,
        };
        match self.reasons.derive(request).await {
            Ok(reason) => reason
                .map(|reason| reason.trim().to_string())
                .filter(|reason| !reason.is_empty()),
            Err(error) => {
                warn!(
                    user_id = %event.user_id,
                    error = %error,
                    "Reason derivation failed"
                );
                issues.push("reason derivation", &error);
                None
            }
        }
    }

    async fn persist(
        &self,
        prior: Option<UserEmotionProfile>,
        delta: &ProfileDelta<'_>,
        now: i64,
    ) -> Result<u64, MemoryError> {
        let user_id = &delta.event.user_id;
        let attempts = self.config.max_write_attempts.max(1);
        let mut current = prior;
        let mut expected = 0;
        let mut found = None;

        for attempt in 1..=attempts {
            let mut profile = current
                .take()
                .unwrap_or_else(|| UserEmotionProfile::empty(user_id, now));
            expected = profile.version;
            apply_delta(&mut profile, delta, &self.config, now);

            match self.profiles.put_profile(&profile).await? {
                PutOutcome::Written(version) => return Ok(version),
                PutOutcome::Conflict { current: stored } => {
                    debug!(user_id = %user_id, attempt, "User profile changed concurrently, retrying");
                    found = stored;
                    current = self.profiles.get_profile(user_id).await?;
                }
            }
        }

        Err(MemoryError::Conflict {
            key: user_id.clone(),
            expected,
            found,
        })
    }
}

/// Fold one event into `profile`.
pub(crate) fn apply_delta(
    profile: &mut UserEmotionProfile,
    delta: &ProfileDelta<'_>,
    config: &MemoryConfig,
    now: i64,
) {
    let event = delta.event;
    let seen_at = event.occurred_at;

    let stat = profile
        .emotion_stats
        .entry(event.label.clone())
        .or_insert(LabelStat {
            count: 0,
            avg_intensity: 0.0,
            last_seen_at: seen_at,
        });
    stat.avg_intensity =
        stats::incremental_mean(stat.avg_intensity, u64::from(stat.count), event.intensity)
            .clamp(0.0, 1.0);
    stat.count = stat.count.saturating_add(1);
    stat.last_seen_at = seen_at;

    let mut seen_topics: Vec<&str> = Vec::new();
    for topic in &event.topics {
        if seen_topics.contains(&topic.as_str()) {
            continue;
        }
        seen_topics.push(topic);

        let stat = profile.topic_profile.entry(topic.clone()).or_insert(TopicStat {
            count: 0,
            score: 0.0,
            last_seen_at: seen_at,
        });
        stat.count = stat.count.saturating_add(1);
        stat.last_seen_at = seen_at;
        stat.score = stats::decayed_score(
            stat.score,
            event.intensity,
            config.topic_decay,
            config.topic_score_cap,
        );
    }

    if let Some(persona_id) = &event.persona_id {
        let outcome = event
            .outcome_score
            .unwrap_or_else(|| stats::outcome_from_delta(delta.signal.intensity_delta));
        let affinity = profile
            .persona_affinity
            .entry(persona_id.clone())
            .or_insert(PersonaAffinity {
                uses: 0,
                avg_outcome: 0.0,
                last_used_at: seen_at,
                last_trend: None,
            });
        affinity.avg_outcome =
            stats::incremental_mean(affinity.avg_outcome, affinity.uses, outcome).clamp(-1.0, 1.0);
        affinity.uses = affinity.uses.saturating_add(1);
        affinity.last_used_at = seen_at;
        affinity.last_trend = delta.signal.trend.or(affinity.last_trend);
    }

    if let Some(intensity_delta) = delta.signal.intensity_delta {
        let sample = stats::volatility_sample(intensity_delta);
        profile.volatility_index = Some(
            stats::ema(profile.volatility_index, sample, config.volatility_alpha).clamp(0.0, 1.0),
        );
    }

    profile.append_anchors(delta.anchors.iter().cloned());

    profile.recent_kernel_snapshot = Some(KernelSnapshot {
        last_emotion: event.label.clone(),
        last_intensity: event.intensity,
        last_updated_at: now,
        reason_label: delta.reason_label.map(str::to_string),
    });
    profile.updated_at = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::normalizer::validate;
    use crate::storage::Storage;
    use async_trait::async_trait;
    use moodmem_models::{EmotionEvent, EmotionReading, MessageRecord, Trend};
    use moodmem_traits::NoReason;
    use tempfile::tempdir;

    fn event(raw: f64) -> ValidatedEvent {
        let event = EmotionEvent::new("u1", "c1", "m1", EmotionReading::new("ANXIOUS", raw))
            .with_topics(["exam", "exam", "sleep"])
            .with_persona("coach")
            .with_occurred_at(10);
        validate(&event, 0).unwrap()
    }

    fn delta(event: &ValidatedEvent, raw_delta: Option<f64>) -> ProfileDelta<'_> {
        ProfileDelta {
            event,
            signal: ShortTermSignal {
                intensity_delta: raw_delta,
                trend: moodmem_models::classify_trend(raw_delta),
            },
            anchors: &[],
            reason_label: None,
        }
    }

    #[test]
    fn test_first_event_seeds_profile() {
        let config = MemoryConfig::default();
        let event = event(4.0);
        let mut profile = UserEmotionProfile::empty("u1", 0);
        apply_delta(&mut profile, &delta(&event, None), &config, 20);

        let stat = profile.emotion_stats["ANXIOUS"];
        assert_eq!(stat.count, 1);
        assert!((stat.avg_intensity - 0.8).abs() < 1e-9);

        let exam = profile.topic_profile["exam"];
        assert_eq!(exam.count, 1);
        assert!((exam.score - 0.8).abs() < 1e-9);

        // No delta yet: volatility stays uninitialized, outcome is neutral.
        assert!(profile.volatility_index.is_none());
        let affinity = profile.persona_affinity["coach"];
        assert_eq!(affinity.uses, 1);
        assert_eq!(affinity.avg_outcome, 0.0);
        assert_eq!(
            profile.recent_kernel_snapshot.as_ref().map(|s| s.last_emotion.as_str()),
            Some("ANXIOUS")
        );
    }

    #[test]
    fn test_second_event_decays_topic_and_seeds_volatility() {
        let config = MemoryConfig::default();
        let mut profile = UserEmotionProfile::empty("u1", 0);
        let first = event(4.0);
        apply_delta(&mut profile, &delta(&first, None), &config, 20);
        let second = event(2.0);
        apply_delta(&mut profile, &delta(&second, Some(-2.0)), &config, 30);

        let stat = profile.emotion_stats["ANXIOUS"];
        assert_eq!(stat.count, 2);
        assert!((stat.avg_intensity - 0.6).abs() < 1e-9);
        assert!((profile.topic_profile["exam"].score - (0.9 * 0.8 + 0.4)).abs() < 1e-9);
        assert_eq!(profile.volatility_index, Some(0.4));

        let affinity = profile.persona_affinity["coach"];
        assert_eq!(affinity.uses, 2);
        assert!((affinity.avg_outcome - 0.5).abs() < 1e-9);
        assert_eq!(affinity.last_trend, Some(Trend::Down));
    }

    #[test]
    fn test_explicit_outcome_wins_and_trend_is_kept() {
        let config = MemoryConfig::default();
        let mut profile = UserEmotionProfile::empty("u1", 0);
        let mut event = event(3.0);
        event.outcome_score = Some(-0.5);
        apply_delta(&mut profile, &delta(&event, Some(-1.0)), &config, 1);
        assert_eq!(profile.persona_affinity["coach"].avg_outcome, -0.5);
        assert_eq!(profile.persona_affinity["coach"].last_trend, Some(Trend::Down));

        apply_delta(&mut profile, &delta(&event, None), &config, 2);
        assert_eq!(profile.persona_affinity["coach"].last_trend, Some(Trend::Down));
    }

    struct FailingAnchors;

    #[async_trait]
    impl AnchorDetector for FailingAnchors {
        async fn detect(&self, _: &str, _: &str, _: f64) -> moodmem_traits::Result<Vec<String>> {
            Err(MemoryError::Detector("model offline".to_string()))
        }
    }

    struct FixedAnchors;

    #[async_trait]
    impl AnchorDetector for FixedAnchors {
        async fn detect(&self, text: &str, _: &str, _: f64) -> moodmem_traits::Result<Vec<String>> {
            Ok(text.split(',').map(str::to_string).collect())
        }
    }

    #[tokio::test]
    async fn test_anchor_failure_does_not_block_upsert() {
        let temp_dir = tempdir().unwrap();
        let storage = Storage::new(temp_dir.path().join("test.db").to_str().unwrap()).unwrap();
        storage
            .messages
            .put(&MessageRecord::new("m1", "u1", "c1", 1).with_text("the exam"))
            .unwrap();

        let aggregator = LongTermAggregator::new(
            Arc::new(storage.user_profiles.clone()),
            Arc::new(storage.messages.clone()),
            Arc::new(FailingAnchors),
            Arc::new(NoReason),
            MemoryConfig::default(),
        );
        let outcome = aggregator.update(&event(4.0), None, 5).await;
        assert_eq!(outcome.status(), "degraded");
        assert!(outcome.issues()[0].starts_with("anchor detection"));
        assert_eq!(storage.user_profiles.get("u1").unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_anchors_are_appended_once() {
        let temp_dir = tempdir().unwrap();
        let storage = Storage::new(temp_dir.path().join("test.db").to_str().unwrap()).unwrap();
        storage
            .messages
            .put(&MessageRecord::new("m1", "u1", "c1", 1).with_text("my exam, my exam , mom"))
            .unwrap();

        let aggregator = LongTermAggregator::new(
            Arc::new(storage.user_profiles.clone()),
            Arc::new(storage.messages.clone()),
            Arc::new(FixedAnchors),
            Arc::new(NoReason),
            MemoryConfig::default(),
        );
        assert!(aggregator.update(&event(4.0), None, 5).await.is_success());
        assert!(aggregator.update(&event(4.0), None, 6).await.is_success());

        let profile = storage.user_profiles.get("u1").unwrap().unwrap();
        assert_eq!(profile.emotional_anchors, vec!["my exam", "mom"]);
        assert_eq!(profile.version, 2);
    }

    #[tokio::test]
    async fn test_missing_text_skips_anchor_detector() {
        let temp_dir = tempdir().unwrap();
        let storage = Storage::new(temp_dir.path().join("test.db").to_str().unwrap()).unwrap();
        let aggregator = LongTermAggregator::new(
            Arc::new(storage.user_profiles.clone()),
            Arc::new(storage.messages.clone()),
            Arc::new(FailingAnchors),
            Arc::new(ExpectsNoText),
            MemoryConfig::default(),
        );
        assert!(aggregator.update(&event(4.0), None, 5).await.is_success());

        let profile = storage.user_profiles.get("u1").unwrap().unwrap();
        let snapshot = profile.recent_kernel_snapshot.unwrap();
        assert_eq!(snapshot.reason_label.as_deref(), Some("exam pressure"));
    }

    struct ExpectsNoText;

    #[async_trait]
    impl ReasonDeriver for ExpectsNoText {
        async fn derive(&self, request: ReasonRequest<'_>) -> moodmem_traits::Result<Option<String>> {
            assert!(request.text.is_none());
            assert!(request.anchors.is_empty());
            Ok(Some("exam pressure".to_string()))
        }
    }
}
