//! Memory-aware text block for the reply generator.
//!
//! Composition only reads. The same inputs at the same point in time always
//! produce the same block, and an empty string means "nothing to add".

use crate::memory::persona_snapshot::{FactIndex, PersonaSnapshot, PersonaSnapshotBuilder};
use crate::memory::templates::{
    HintKind, Language, emotion_name, format_intensity, join_list, render,
};
use moodmem_models::{ConversationEmotionState, SemanticFact, UserEmotionProfile, kinds};
use moodmem_storage::MemoryConfig;
use moodmem_traits::{ConversationStateStore, FactStore, ProfileStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const GROUNDING_LABELS: &[&str] = &["ANXIOUS", "STRESSED"];
const GROUNDING_MIN_INTENSITY: f64 = 0.7;
const GROUNDING_MAX_STABILITY: f64 = 0.4;
const DIRECTIONAL_MIN_DELTA: f64 = 0.2;
const STABILITY_STEADY: f64 = 0.7;
const STABILITY_SOMEWHAT: f64 = 0.4;
const VOLATILITY_HIGH: f64 = 0.6;
const VOLATILITY_MODERATE: f64 = 0.3;
const PERSONA_MIN_OUTCOME: f64 = 0.1;
const LEGACY_SUM_THRESHOLD: f64 = 1.5;
const PACING_SLOW: f64 = 0.7;
const PACING_LIGHT: f64 = 0.3;
const MAX_SHORT_TERM_TOPICS: usize = 3;
const MAX_LONG_TERM_TOPICS: usize = 3;
const MAX_LONG_TERM_LINES: usize = 3;

/// What the host already knows about who the user is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityMemory {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBlockParams {
    pub user_id: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub persona_id: Option<String>,
    #[serde(default)]
    pub identity: Option<IdentityMemory>,
}

impl MemoryBlockParams {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            conversation_id: None,
            language: Language::default(),
            persona_id: None,
            identity: None,
        }
    }

    #[must_use]
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    #[must_use]
    pub fn with_persona(mut self, persona_id: impl Into<String>) -> Self {
        self.persona_id = Some(persona_id.into());
        self
    }

    #[must_use]
    pub fn with_identity_name(mut self, name: impl Into<String>) -> Self {
        self.identity = Some(IdentityMemory {
            name: Some(name.into()),
        });
        self
    }
}

pub struct MemoryBlockComposer {
    states: Arc<dyn ConversationStateStore>,
    profiles: Arc<dyn ProfileStore>,
    facts: Option<Arc<dyn FactStore>>,
    snapshots: PersonaSnapshotBuilder,
    config: MemoryConfig,
}

impl MemoryBlockComposer {
    pub fn new(
        states: Arc<dyn ConversationStateStore>,
        profiles: Arc<dyn ProfileStore>,
        facts: Option<Arc<dyn FactStore>>,
        config: MemoryConfig,
    ) -> Self {
        let snapshots = PersonaSnapshotBuilder::new(
            facts.clone(),
            config.snapshot_fact_limit,
            config.snapshot_max_hints,
        );
        Self {
            states,
            profiles,
            facts,
            snapshots,
            config,
        }
    }

    pub async fn compose(&self, params: &MemoryBlockParams) -> String {
        let (state, profile, snapshot, preferences) = tokio::join!(
            self.load_state(params),
            self.load_profile(&params.user_id),
            self.snapshots.build(&params.user_id),
            self.load_preferences(&params.user_id),
        );

        if state.is_none() && profile.is_none() && snapshot.is_empty() {
            return String::new();
        }

        let language = params.language;
        let mut body = Vec::new();

        if let Some(state) = &state {
            push_section(
                &mut body,
                language,
                HintKind::SectionShortTerm,
                short_term_lines(state, language),
            );
        }
        if let Some(profile) = &profile {
            push_section(
                &mut body,
                language,
                HintKind::SectionLongTerm,
                long_term_lines(profile, params.persona_id.as_deref(), language),
            );
        }
        if let Some(name) = params
            .identity
            .as_ref()
            .and_then(|identity| identity.name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
        {
            body.push(format!("- {}", render(HintKind::IdentityName, language, &[name])));
        }
        push_section(
            &mut body,
            language,
            HintKind::SectionPersona,
            snapshot.hints(language).to_vec(),
        );
        push_section(
            &mut body,
            language,
            HintKind::SectionPreferences,
            preference_lines(preferences, language),
        );

        if body.is_empty() {
            return String::new();
        }
        assemble(language, &body, self.config.block_char_budget)
    }

    async fn load_state(&self, params: &MemoryBlockParams) -> Option<ConversationEmotionState> {
        let conversation_id = params.conversation_id.as_deref()?;
        match self.states.get_state(conversation_id).await {
            Ok(state) => state,
            Err(error) => {
                warn!(%conversation_id, error = %error, "Failed to load conversation state for memory block");
                None
            }
        }
    }

    async fn load_profile(&self, user_id: &str) -> Option<UserEmotionProfile> {
        match self.profiles.get_profile(user_id).await {
            Ok(profile) => profile,
            Err(error) => {
                warn!(%user_id, error = %error, "Failed to load user profile for memory block");
                None
            }
        }
    }

    async fn load_preferences(&self, user_id: &str) -> Vec<SemanticFact> {
        let Some(store) = &self.facts else {
            return Vec::new();
        };
        match store
            .facts(user_id, kinds::PREFERENCE_KINDS, self.config.preference_fact_limit)
            .await
        {
            Ok(facts) => facts,
            Err(error) => {
                debug!(%user_id, error = %error, "Preference facts unavailable");
                Vec::new()
            }
        }
    }

    /// Snapshot as the composer would use it.
    pub async fn persona_snapshot(&self, user_id: &str) -> PersonaSnapshot {
        self.snapshots.build(user_id).await
    }
}

fn push_section(body: &mut Vec<String>, language: Language, heading: HintKind, lines: Vec<String>) {
    if lines.is_empty() {
        return;
    }
    body.push(heading.template(language).to_string());
    body.extend(lines.into_iter().map(|line| format!("- {line}")));
}

fn short_term_lines(state: &ConversationEmotionState, language: Language) -> Vec<String> {
    let mut lines = Vec::new();

    if !state.has_window() {
        if let Some(label) = &state.dominant_emotion {
            lines.push(render(HintKind::ScalarDominant, language, &[emotion_name(label, language)]));
        }
        if let Some(intensity) = state.avg_intensity {
            lines.push(render(HintKind::ScalarIntensity, language, &[format_intensity(intensity)]));
        }
        return lines;
    }

    let rolling = &state.rolling;
    let dominant = state
        .current_baseline_emotion
        .as_deref()
        .or(state.dominant_emotion.as_deref());

    if let Some(label) = dominant {
        lines.push(render(
            HintKind::RecentDominant,
            language,
            &[emotion_name(label, language), format_intensity(rolling.recent_avg_intensity)],
        ));

        let tense = GROUNDING_LABELS.contains(&label);
        let unstable = state
            .stability_score
            .is_some_and(|stability| stability < GROUNDING_MAX_STABILITY);
        if tense && rolling.recent_avg_intensity >= GROUNDING_MIN_INTENSITY && unstable {
            lines.push(HintKind::Grounding.template(language).to_string());
        }
    }

    if rolling.trend_delta <= -DIRECTIONAL_MIN_DELTA {
        lines.push(HintKind::Calming.template(language).to_string());
    } else if rolling.trend_delta >= DIRECTIONAL_MIN_DELTA {
        lines.push(HintKind::Escalating.template(language).to_string());
    }

    if let Some(stability) = state.stability_score {
        let kind = if stability >= STABILITY_STEADY {
            HintKind::StabilitySteady
        } else if stability >= STABILITY_SOMEWHAT {
            HintKind::StabilitySomewhat
        } else {
            HintKind::StabilityLow
        };
        lines.push(kind.template(language).to_string());
    }

    let topics: Vec<String> = state
        .active_threads
        .iter()
        .take(MAX_SHORT_TERM_TOPICS)
        .map(|thread| thread.topic.clone())
        .collect();
    if !topics.is_empty() {
        lines.push(render(HintKind::ActiveTopics, language, &[join_list(language, &topics)]));
    }

    lines
}

fn long_term_lines(
    profile: &UserEmotionProfile,
    persona_id: Option<&str>,
    language: Language,
) -> Vec<String> {
    let mut lines = Vec::new();

    let dominant = profile
        .emotion_stats
        .iter()
        .map(|(label, stat)| (label.as_str(), f64::from(stat.count) * stat.avg_intensity))
        .fold(None::<(&str, f64)>, |best, (label, weight)| match best {
            Some((_, top)) if top >= weight => best,
            _ => Some((label, weight)),
        })
        .map(|(label, _)| label)
        .or_else(|| {
            profile
                .legacy_scores
                .as_ref()
                .and_then(|scores| scores.strongest())
                .map(|(label, _)| label)
        });
    if let Some(label) = dominant {
        lines.push(render(HintKind::LongTermDominant, language, &[emotion_name(label, language)]));
    }

    let mut topics: Vec<(&String, f64)> = profile
        .topic_profile
        .iter()
        .filter(|(_, stat)| stat.score > 0.0)
        .map(|(topic, stat)| (topic, stat.score))
        .collect();
    topics.sort_by(|a, b| b.1.total_cmp(&a.1));
    let topics: Vec<String> = topics
        .into_iter()
        .take(MAX_LONG_TERM_TOPICS)
        .map(|(topic, _)| topic.clone())
        .collect();
    if !topics.is_empty() {
        lines.push(render(HintKind::LongTermTopics, language, &[join_list(language, &topics)]));
    }

    if let Some(volatility) = profile.volatility_index {
        let kind = if volatility >= VOLATILITY_HIGH {
            HintKind::VolatilityHigh
        } else if volatility >= VOLATILITY_MODERATE {
            HintKind::VolatilityModerate
        } else {
            HintKind::VolatilityLow
        };
        lines.push(kind.template(language).to_string());
    }

    if let Some(affinity) = persona_id.and_then(|persona| profile.persona_affinity.get(persona)) {
        if affinity.avg_outcome > PERSONA_MIN_OUTCOME {
            lines.push(HintKind::PersonaHelps.template(language).to_string());
        } else if affinity.avg_outcome < -PERSONA_MIN_OUTCOME {
            lines.push(HintKind::PersonaAdjust.template(language).to_string());
        }
    }

    lines.truncate(MAX_LONG_TERM_LINES);
    if !lines.is_empty() {
        return lines;
    }

    let Some(legacy) = profile.legacy_scores.as_ref().filter(|scores| !scores.is_empty()) else {
        return lines;
    };
    let summary = if legacy.negative_sum() >= LEGACY_SUM_THRESHOLD {
        HintKind::FallbackHeavy
    } else if legacy.positive_sum() >= LEGACY_SUM_THRESHOLD {
        HintKind::FallbackPositive
    } else {
        HintKind::FallbackMixed
    };
    lines.push(summary.template(language).to_string());

    match legacy.avg_intensity {
        Some(intensity) if intensity >= PACING_SLOW => {
            lines.push(HintKind::PacingSlow.template(language).to_string())
        }
        Some(intensity) if intensity <= PACING_LIGHT => {
            lines.push(HintKind::PacingLight.template(language).to_string())
        }
        _ => {}
    }
    lines
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "是"
    )
}

fn preference_lines(facts: Vec<SemanticFact>, language: Language) -> Vec<String> {
    let index = FactIndex::new(facts);
    let mut lines = Vec::new();

    for (kind, hint) in [
        (kinds::SEASON_LIKE, HintKind::SeasonLike),
        (kinds::SEASON_DISLIKE, HintKind::SeasonDislike),
        (kinds::WEATHER_LIKE, HintKind::WeatherLike),
        (kinds::WEATHER_DISLIKE, HintKind::WeatherDislike),
        (kinds::PET_LIKE, HintKind::PetLike),
        (kinds::PET_DISLIKE, HintKind::PetDislike),
    ] {
        let values = index.all(kind);
        if !values.is_empty() {
            lines.push(render(hint, language, &[join_list(language, &values)]));
        }
    }

    let social = index
        .latest(kinds::SOCIAL_STYLE)
        .and_then(|style| match style.to_ascii_lowercase().as_str() {
            "introvert" => Some(HintKind::SocialIntrovert),
            "extrovert" => Some(HintKind::SocialExtrovert),
            "ambivert" => Some(HintKind::SocialAmbivert),
            _ => None,
        });
    if let Some(kind) = social {
        lines.push(kind.template(language).to_string());
    }

    if index
        .latest(kinds::CROWD_DISCOMFORT)
        .is_some_and(|value| is_truthy(&value))
    {
        lines.push(HintKind::CrowdDiscomfort.template(language).to_string());
    }

    lines
}

/// Longest prefix of whole lines that fits in `room` characters.
///
/// A first line that alone is too long is cut at a character boundary.
fn fit_lines(lines: &[String], room: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for line in lines {
        let separator = usize::from(!out.is_empty());
        let cost = line.chars().count() + separator;
        if used + cost > room {
            if out.is_empty() {
                out = line.chars().take(room).collect();
            }
            break;
        }
        if separator == 1 {
            out.push('\n');
        }
        out.push_str(line);
        used += cost;
    }
    out
}

/// Wrap the body with the header and footer within `budget` characters.
fn assemble(language: Language, body: &[String], budget: usize) -> String {
    let header = HintKind::Header.template(language);
    let footer = HintKind::Footer.template(language);
    let fixed = header.chars().count() + footer.chars().count() + 2;

    let Some(room) = budget.checked_sub(fixed).filter(|room| *room > 0) else {
        warn!(budget, "Memory block budget cannot fit header and footer");
        return String::new();
    };

    let body = fit_lines(body, room);
    format!("{header}\n{body}\n{footer}")
}
