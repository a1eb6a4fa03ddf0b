//! Durable semantic facts about a user, sourced outside this subsystem.

use serde::{Deserialize, Serialize};

/// One (kind, value) attribute about a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticFact {
    pub user_id: String,
    /// Dotted taxonomy, e.g. `work.role`
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub confidence: f64,
    /// Unix timestamp in milliseconds
    pub updated_at: i64,
}

impl SemanticFact {
    pub fn new(
        user_id: impl Into<String>,
        kind: impl Into<String>,
        value: impl Into<String>,
        updated_at: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            kind: kind.into(),
            value: value.into(),
            confidence: 1.0,
            updated_at,
        }
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Fact kinds read by the memory layers.
pub mod kinds {
    pub const AGE: &str = "profile.age";
    pub const LOCATION: &str = "profile.location";
    pub const LANGUAGE: &str = "profile.language";
    pub const DIALECT: &str = "profile.dialect";
    pub const ROLE: &str = "work.role";
    pub const JOB: &str = "work.job";
    pub const DOMAIN: &str = "work.domain";
    pub const GOAL_LONG_TERM: &str = "goal.long_term";
    pub const GOAL_PRIMARY: &str = "goal.primary";
    pub const GOAL_SECONDARY: &str = "goal.secondary";
    pub const LIFE_THEME_PRIMARY: &str = "life.theme.primary";
    pub const LIFE_THEME_SECONDARY: &str = "life.theme.secondary";
    pub const LIFE_THEME_RECENT: &str = "life.theme.recent";
    pub const PERSONALITY_KEYWORD: &str = "personality.keyword";
    pub const COPING_STYLE: &str = "personality.coping_style";
    pub const MENTAL_STATE_MAIN: &str = "mental_state.main";
    pub const MENTAL_STATE_SECONDARY: &str = "mental_state.secondary";
    pub const PREFERENCE_LIKE: &str = "preference.like";
    pub const PREFERENCE_DISLIKE: &str = "preference.dislike";

    pub const SEASON_LIKE: &str = "preference.season.like";
    pub const SEASON_DISLIKE: &str = "preference.season.dislike";
    pub const WEATHER_LIKE: &str = "preference.weather.like";
    pub const WEATHER_DISLIKE: &str = "preference.weather.dislike";
    pub const PET_LIKE: &str = "preference.pet.like";
    pub const PET_DISLIKE: &str = "preference.pet.dislike";
    pub const SOCIAL_STYLE: &str = "social.style";
    pub const CROWD_DISCOMFORT: &str = "social.crowd_discomfort";

    /// Kinds the persona snapshot reads.
    pub const SNAPSHOT_KINDS: &[&str] = &[
        AGE,
        LOCATION,
        LANGUAGE,
        DIALECT,
        ROLE,
        JOB,
        DOMAIN,
        GOAL_LONG_TERM,
        GOAL_PRIMARY,
        GOAL_SECONDARY,
        LIFE_THEME_PRIMARY,
        LIFE_THEME_SECONDARY,
        LIFE_THEME_RECENT,
        PERSONALITY_KEYWORD,
        COPING_STYLE,
        MENTAL_STATE_MAIN,
        MENTAL_STATE_SECONDARY,
        PREFERENCE_LIKE,
        PREFERENCE_DISLIKE,
    ];

    /// Kinds the composer's preference section reads.
    pub const PREFERENCE_KINDS: &[&str] = &[
        SEASON_LIKE,
        SEASON_DISLIKE,
        WEATHER_LIKE,
        WEATHER_DISLIKE,
        PET_LIKE,
        PET_DISLIKE,
        SOCIAL_STYLE,
        CROWD_DISCOMFORT,
    ];
}
