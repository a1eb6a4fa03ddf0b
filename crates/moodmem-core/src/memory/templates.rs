//! Per-language text for every line the memory layers emit.
//!
//! Lines are addressed by [`HintKind`] and rendered through one table, so
//! the English and Chinese outputs cannot drift apart structurally. `{}`
//! placeholders are filled left to right.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    /// Parse a language code. `zh`, `zh-CN`, `zh_TW` map to Chinese; anything else to English.
    pub fn from_code(code: &str) -> Self {
        if code.trim().to_ascii_lowercase().starts_with("zh") {
            Self::Zh
        } else {
            Self::En
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }

    pub fn list_separator(&self) -> &'static str {
        match self {
            Self::En => ", ",
            Self::Zh => "、",
        }
    }

    pub const ALL: [Language; 2] = [Language::En, Language::Zh];
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_code(s))
    }
}

/// Every kind of line the block composer and snapshot builder can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HintKind {
    Header,
    Footer,
    SectionShortTerm,
    SectionLongTerm,
    SectionPersona,
    SectionPreferences,

    RecentDominant,
    ScalarDominant,
    ScalarIntensity,
    Grounding,
    Calming,
    Escalating,
    StabilitySteady,
    StabilitySomewhat,
    StabilityLow,
    ActiveTopics,

    LongTermDominant,
    LongTermTopics,
    VolatilityHigh,
    VolatilityModerate,
    VolatilityLow,
    PersonaHelps,
    PersonaAdjust,
    FallbackHeavy,
    FallbackPositive,
    FallbackMixed,
    PacingSlow,
    PacingLight,

    IdentityName,

    Age,
    Location,
    Language,
    LanguageDialect,
    Dialect,
    Role,
    RoleInDomain,
    Domain,
    GoalLongTerm,
    GoalPrimary,
    GoalSecondary,
    LifeThemes,
    PersonalityKeywords,
    CopingStyle,
    MentalStateMain,
    MentalStateSecondary,

    SeasonLike,
    SeasonDislike,
    WeatherLike,
    WeatherDislike,
    PetLike,
    PetDislike,
    SocialIntrovert,
    SocialExtrovert,
    SocialAmbivert,
    CrowdDiscomfort,
}

impl HintKind {
    /// `[english, chinese]`
    fn templates(self) -> [&'static str; 2] {
        match self {
            Self::Header => ["[Emotional memory]", "【情绪记忆】"],
            Self::Footer => [
                "(Use this memory as quiet background. Do not quote it verbatim, refer to feelings only in general terms, and keep any mention brief.)",
                "（以上记忆仅作背景参考。不要逐字引用，只以概括的方式提及情绪，提及时保持简短。）",
            ],
            Self::SectionShortTerm => ["In this conversation:", "本次对话："],
            Self::SectionLongTerm => ["Over time:", "长期来看："],
            Self::SectionPersona => [
                "Background about the user (use it to personalize, never present it as analysis or data):",
                "关于用户的背景（用于个性化回应，不要以分析或数据的形式呈现）：",
            ],
            Self::SectionPreferences => ["Preferences:", "偏好："],

            Self::RecentDominant => [
                "The user has mostly felt {} recently (average intensity {}).",
                "用户最近主要感到{}（平均强度{}）。",
            ],
            Self::ScalarDominant => [
                "The user's prevailing mood in this conversation is {}.",
                "用户在本次对话中的主要情绪是{}。",
            ],
            Self::ScalarIntensity => [
                "Their emotional intensity is around {}.",
                "情绪强度约为{}。",
            ],
            Self::Grounding => [
                "They seem overwhelmed. Offer grounding first: slow down and suggest one small concrete step.",
                "用户似乎有些不堪重负。先帮助其稳定下来：放慢节奏，再给出一个小而具体的步骤。",
            ],
            Self::Calming => [
                "Their intensity has been easing during this conversation.",
                "本次对话中用户的情绪在逐渐缓和。",
            ],
            Self::Escalating => [
                "Their intensity has been rising during this conversation; respond gently.",
                "本次对话中用户的情绪在升温，请温和回应。",
            ],
            Self::StabilitySteady => ["Their mood has been steady.", "情绪比较平稳。"],
            Self::StabilitySomewhat => [
                "Their mood has been somewhat fluctuating.",
                "情绪有些起伏。",
            ],
            Self::StabilityLow => [
                "Their mood has been fluctuating a lot.",
                "情绪波动较大。",
            ],
            Self::ActiveTopics => ["Topics on their mind: {}.", "最近在意的话题：{}。"],

            Self::LongTermDominant => [
                "Across conversations, the user most often feels {}.",
                "在以往的对话中，用户最常感到{}。",
            ],
            Self::LongTermTopics => ["Recurring topics: {}.", "反复出现的话题：{}。"],
            Self::VolatilityHigh => [
                "Their emotions are frequently changing; keep replies steady and predictable.",
                "用户的情绪经常变化，回应时保持稳定、可预期。",
            ],
            Self::VolatilityModerate => [
                "Their emotions are moderately variable.",
                "用户的情绪有一定起伏。",
            ],
            Self::VolatilityLow => [
                "Their emotions are generally stable.",
                "用户的情绪总体稳定。",
            ],
            Self::PersonaHelps => [
                "Your current style has tended to help this user; keep it.",
                "你目前的风格通常对这位用户有帮助，请保持。",
            ],
            Self::PersonaAdjust => [
                "Your current style has not helped this user much lately; try a gentler, more patient approach.",
                "你目前的风格最近对这位用户帮助不大，尝试更温和、更耐心的方式。",
            ],
            Self::FallbackHeavy => [
                "The user has been carrying a lot of heavy feelings lately.",
                "用户近来承受着较多沉重的情绪。",
            ],
            Self::FallbackPositive => [
                "The user has generally been in a positive place.",
                "用户整体状态比较积极。",
            ],
            Self::FallbackMixed => [
                "The user's feelings have been mixed.",
                "用户的情绪比较复杂。",
            ],
            Self::PacingSlow => [
                "Take things slowly and give them room.",
                "放慢节奏，给用户留出空间。",
            ],
            Self::PacingLight => [
                "A lighter, easygoing tone should work well.",
                "轻松一些的语气会比较合适。",
            ],

            Self::IdentityName => ["The user's name is {}.", "用户的名字是{}。"],

            Self::Age => ["Age: {}.", "年龄：{}。"],
            Self::Location => ["Lives in {}.", "所在地：{}。"],
            Self::Language => ["Speaks {}.", "使用语言：{}。"],
            Self::LanguageDialect => ["Speaks {} ({} dialect).", "使用语言：{}（{}）。"],
            Self::Dialect => ["Speaks the {} dialect.", "方言：{}。"],
            Self::Role => ["Works as {}.", "职业：{}。"],
            Self::RoleInDomain => ["Works as {} in {}.", "职业：{}（{}领域）。"],
            Self::Domain => ["Works in {}.", "工作领域：{}。"],
            Self::GoalLongTerm => ["Long-term goal: {}.", "长期目标：{}。"],
            Self::GoalPrimary => ["Current main goal: {}.", "当前主要目标：{}。"],
            Self::GoalSecondary => ["Also working toward: {}.", "其他目标：{}。"],
            Self::LifeThemes => ["Life themes: {}.", "生活主题：{}。"],
            Self::PersonalityKeywords => ["Personality: {}.", "性格特点：{}。"],
            Self::CopingStyle => ["Coping style: {}.", "应对方式：{}。"],
            Self::MentalStateMain => ["Lately: {}.", "近期状态：{}。"],
            Self::MentalStateSecondary => ["Also: {}.", "同时：{}。"],

            Self::SeasonLike => ["Favorite seasons: {}.", "喜欢的季节：{}。"],
            Self::SeasonDislike => ["Dislikes these seasons: {}.", "不喜欢的季节：{}。"],
            Self::WeatherLike => ["Enjoys this weather: {}.", "喜欢的天气：{}。"],
            Self::WeatherDislike => ["Dislikes this weather: {}.", "不喜欢的天气：{}。"],
            Self::PetLike => ["Likes these animals: {}.", "喜欢的动物：{}。"],
            Self::PetDislike => ["Prefers to avoid these animals: {}.", "不喜欢的动物：{}。"],
            Self::SocialIntrovert => [
                "Tends to be introverted and recharges alone.",
                "性格偏内向，独处时更能恢复精力。",
            ],
            Self::SocialExtrovert => [
                "Tends to be extroverted and is energized by people.",
                "性格偏外向，和人相处会更有活力。",
            ],
            Self::SocialAmbivert => [
                "Balances time with people and time alone.",
                "性格介于内向与外向之间。",
            ],
            Self::CrowdDiscomfort => [
                "Feels uncomfortable in crowds.",
                "在人多的地方会感到不自在。",
            ],
        }
    }

    pub fn template(self, language: Language) -> &'static str {
        let [en, zh] = self.templates();
        match language {
            Language::En => en,
            Language::Zh => zh,
        }
    }
}

/// Fill a template's placeholders left to right. Missing arguments render empty.
pub fn render<S: AsRef<str>>(kind: HintKind, language: Language, args: &[S]) -> String {
    let template = kind.template(language);
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter().map(S::as_ref);
    let mut pieces = template.split("{}");
    if let Some(first) = pieces.next() {
        out.push_str(first);
    }
    for piece in pieces {
        out.push_str(args.next().unwrap_or_default());
        out.push_str(piece);
    }
    out
}

/// Join list values with the language's separator.
pub fn join_list(language: Language, values: &[String]) -> String {
    values.join(language.list_separator())
}

/// Human-readable name for an emotion label.
pub fn emotion_name(label: &str, language: Language) -> String {
    let label = label.trim().to_ascii_uppercase();
    let known = match label.as_str() {
        "ANXIOUS" => Some(["anxious", "焦虑"]),
        "STRESSED" => Some(["stressed", "压力大"]),
        "SAD" => Some(["sad", "难过"]),
        "ANGRY" => Some(["angry", "生气"]),
        "LONELY" => Some(["lonely", "孤独"]),
        "FRUSTRATED" => Some(["frustrated", "沮丧"]),
        "TIRED" => Some(["tired", "疲惫"]),
        "JOYFUL" | "HAPPY" => Some(["happy", "开心"]),
        "CALM" => Some(["calm", "平静"]),
        "HOPEFUL" => Some(["hopeful", "充满希望"]),
        "NEUTRAL" => Some(["neutral", "平和"]),
        _ => None,
    };
    match (known, language) {
        (Some([en, _]), Language::En) => en.to_string(),
        (Some([_, zh]), Language::Zh) => zh.to_string(),
        (None, _) => label.to_ascii_lowercase().replace('_', " "),
    }
}

/// Intensity in [0, 1] as shown in hint lines.
pub fn format_intensity(value: f64) -> String {
    format!("{:.1}", value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::from_code("zh-CN"), Language::Zh);
        assert_eq!(Language::from_code("ZH_tw"), Language::Zh);
        assert_eq!(Language::from_code("en-US"), Language::En);
        assert_eq!(Language::from_code("fr"), Language::En);
        assert_eq!("zh".parse::<Language>().unwrap(), Language::Zh);
    }

    #[test]
    fn test_render_fills_in_order() {
        let line = render(HintKind::RoleInDomain, Language::En, &["nurse", "pediatrics"]);
        assert_eq!(line, "Works as nurse in pediatrics.");
        let line = render(HintKind::RoleInDomain, Language::Zh, &["护士", "儿科"]);
        assert_eq!(line, "职业：护士（儿科领域）。");
        assert_eq!(render::<&str>(HintKind::Age, Language::En, &[]), "Age: .");
    }

    #[test]
    fn test_placeholder_counts_match_across_languages() {
        let kinds = [
            HintKind::RecentDominant,
            HintKind::LanguageDialect,
            HintKind::RoleInDomain,
            HintKind::ActiveTopics,
            HintKind::Footer,
            HintKind::CrowdDiscomfort,
        ];
        for kind in kinds {
            let [en, zh] = kind.templates();
            assert_eq!(en.matches("{}").count(), zh.matches("{}").count(), "{kind:?}");
        }
    }

    #[test]
    fn test_emotion_names() {
        assert_eq!(emotion_name("ANXIOUS", Language::En), "anxious");
        assert_eq!(emotion_name("anxious", Language::Zh), "焦虑");
        assert_eq!(emotion_name("WORN_OUT", Language::Zh), "worn out");
        assert_eq!(format_intensity(0.8), "0.8");
        assert_eq!(format_intensity(1.7), "1.0");
    }
}
