//! Bounded bilingual persona hints distilled from semantic facts.

use crate::memory::templates::{HintKind, Language, join_list, render};
use moodmem_models::{SemanticFact, kinds};
use moodmem_traits::{FactStore, MemoryError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// One fact-derived hint, independent of language.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TaggedFact {
    Age(String),
    Location(String),
    Language {
        language: Option<String>,
        dialect: Option<String>,
    },
    Work {
        role: Option<String>,
        domain: Option<String>,
    },
    GoalLongTerm(String),
    GoalPrimary(String),
    GoalSecondary(String),
    LifeThemes(Vec<String>),
    PersonalityKeywords(Vec<String>),
    CopingStyle(String),
    MentalStateMain(String),
    MentalStateSecondary(String),
}

impl TaggedFact {
    pub fn render(&self, language: Language) -> String {
        match self {
            Self::Age(age) => render(HintKind::Age, language, &[age]),
            Self::Location(location) => render(HintKind::Location, language, &[location]),
            Self::Language {
                language: spoken,
                dialect,
            } => match (spoken, dialect) {
                (Some(spoken), Some(dialect)) => {
                    render(HintKind::LanguageDialect, language, &[spoken, dialect])
                }
                (Some(spoken), None) => render(HintKind::Language, language, &[spoken]),
                (None, Some(dialect)) => render(HintKind::Dialect, language, &[dialect]),
                (None, None) => String::new(),
            },
            Self::Work { role, domain } => match (role, domain) {
                (Some(role), Some(domain)) => {
                    render(HintKind::RoleInDomain, language, &[role, domain])
                }
                (Some(role), None) => render(HintKind::Role, language, &[role]),
                (None, Some(domain)) => render(HintKind::Domain, language, &[domain]),
                (None, None) => String::new(),
            },
            Self::GoalLongTerm(goal) => render(HintKind::GoalLongTerm, language, &[goal]),
            Self::GoalPrimary(goal) => render(HintKind::GoalPrimary, language, &[goal]),
            Self::GoalSecondary(goal) => render(HintKind::GoalSecondary, language, &[goal]),
            Self::LifeThemes(themes) => {
                render(HintKind::LifeThemes, language, &[&join_list(language, themes)])
            }
            Self::PersonalityKeywords(keywords) => render(
                HintKind::PersonalityKeywords,
                language,
                &[&join_list(language, keywords)],
            ),
            Self::CopingStyle(style) => render(HintKind::CopingStyle, language, &[style]),
            Self::MentalStateMain(state) => render(HintKind::MentalStateMain, language, &[state]),
            Self::MentalStateSecondary(state) => {
                render(HintKind::MentalStateSecondary, language, &[state])
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonaSnapshot {
    pub user_id: String,
    /// Priority-ordered, already capped
    pub facts: Vec<TaggedFact>,
    pub hints_en: Vec<String>,
    pub hints_zh: Vec<String>,
    /// Distinct liked things, most recent first
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
}

impl PersonaSnapshot {
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.likes.is_empty() && self.dislikes.is_empty()
    }

    pub fn hints(&self, language: Language) -> &[String] {
        match language {
            Language::En => &self.hints_en,
            Language::Zh => &self.hints_zh,
        }
    }

    /// Build a snapshot from facts in any order.
    pub fn from_facts(user_id: &str, facts: Vec<SemanticFact>, max_hints: usize) -> Self {
        let index = FactIndex::new(facts);

        let mut tagged = Vec::new();
        if let Some(age) = index.latest(kinds::AGE) {
            tagged.push(TaggedFact::Age(age));
        }
        if let Some(location) = index.latest(kinds::LOCATION) {
            tagged.push(TaggedFact::Location(location));
        }

        let spoken = index.latest(kinds::LANGUAGE);
        let dialect = index.latest(kinds::DIALECT);
        if spoken.is_some() || dialect.is_some() {
            tagged.push(TaggedFact::Language {
                language: spoken,
                dialect,
            });
        }

        let role = index
            .latest(kinds::ROLE)
            .or_else(|| index.latest(kinds::JOB));
        let domain = index.latest(kinds::DOMAIN);
        if role.is_some() || domain.is_some() {
            tagged.push(TaggedFact::Work { role, domain });
        }

        let long_term = index.latest(kinds::GOAL_LONG_TERM);
        let primary = index.latest(kinds::GOAL_PRIMARY);
        let secondary = index
            .latest(kinds::GOAL_SECONDARY)
            .filter(|goal| Some(goal) != primary.as_ref() && Some(goal) != long_term.as_ref());
        tagged.extend(long_term.map(TaggedFact::GoalLongTerm));
        tagged.extend(primary.map(TaggedFact::GoalPrimary));
        tagged.extend(secondary.map(TaggedFact::GoalSecondary));

        let mut themes: Vec<String> = Vec::new();
        for kind in [
            kinds::LIFE_THEME_PRIMARY,
            kinds::LIFE_THEME_SECONDARY,
            kinds::LIFE_THEME_RECENT,
        ] {
            if let Some(theme) = index.latest(kind)
                && !themes.contains(&theme)
            {
                themes.push(theme);
            }
        }
        if !themes.is_empty() {
            tagged.push(TaggedFact::LifeThemes(themes));
        }

        let keywords = index.all(kinds::PERSONALITY_KEYWORD);
        if !keywords.is_empty() {
            tagged.push(TaggedFact::PersonalityKeywords(keywords));
        }
        if let Some(style) = index.latest(kinds::COPING_STYLE) {
            tagged.push(TaggedFact::CopingStyle(style));
        }

        let main_state = index.latest(kinds::MENTAL_STATE_MAIN);
        let secondary_state = index
            .latest(kinds::MENTAL_STATE_SECONDARY)
            .filter(|state| Some(state) != main_state.as_ref());
        tagged.extend(main_state.map(TaggedFact::MentalStateMain));
        tagged.extend(secondary_state.map(TaggedFact::MentalStateSecondary));

        tagged.truncate(max_hints);

        Self {
            user_id: user_id.to_string(),
            hints_en: tagged.iter().map(|fact| fact.render(Language::En)).collect(),
            hints_zh: tagged.iter().map(|fact| fact.render(Language::Zh)).collect(),
            facts: tagged,
            likes: index.all(kinds::PREFERENCE_LIKE),
            dislikes: index.all(kinds::PREFERENCE_DISLIKE),
        }
    }
}

/// Facts grouped by kind, each group most recent first.
pub(crate) struct FactIndex {
    by_kind: HashMap<String, Vec<String>>,
}

impl FactIndex {
    pub(crate) fn new(mut facts: Vec<SemanticFact>) -> Self {
        facts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let mut by_kind: HashMap<String, Vec<String>> = HashMap::new();
        for fact in facts {
            let value = fact.value.trim();
            if value.is_empty() {
                continue;
            }
            let values = by_kind.entry(fact.kind).or_default();
            if !values.iter().any(|existing| existing == value) {
                values.push(value.to_string());
            }
        }
        Self { by_kind }
    }

    /// Most recently updated value of a scalar kind.
    pub(crate) fn latest(&self, kind: &str) -> Option<String> {
        self.by_kind
            .get(kind)
            .and_then(|values| values.first())
            .cloned()
    }

    /// Every distinct value of a list kind, most recent first.
    pub(crate) fn all(&self, kind: &str) -> Vec<String> {
        self.by_kind.get(kind).cloned().unwrap_or_default()
    }
}

pub struct PersonaSnapshotBuilder {
    facts: Option<Arc<dyn FactStore>>,
    fact_limit: usize,
    max_hints: usize,
}

impl PersonaSnapshotBuilder {
    pub fn new(facts: Option<Arc<dyn FactStore>>, fact_limit: usize, max_hints: usize) -> Self {
        Self {
            facts,
            fact_limit,
            max_hints,
        }
    }

    /// Never fails; an absent or failing fact store yields an empty snapshot.
    pub async fn build(&self, user_id: &str) -> PersonaSnapshot {
        let Some(store) = &self.facts else {
            return PersonaSnapshot::empty(user_id);
        };

        match store
            .facts(user_id, kinds::SNAPSHOT_KINDS, self.fact_limit)
            .await
        {
            Ok(facts) => PersonaSnapshot::from_facts(user_id, facts, self.max_hints),
            Err(MemoryError::Unavailable(reason)) => {
                debug!(%user_id, %reason, "Fact store unavailable, using empty persona snapshot");
                PersonaSnapshot::empty(user_id)
            }
            Err(error) => {
                warn!(%user_id, error = %error, "Failed to load semantic facts");
                PersonaSnapshot::empty(user_id)
            }
        }
    }
}
