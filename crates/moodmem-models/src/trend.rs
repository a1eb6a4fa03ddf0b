use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the intensity change between two consecutive messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Stable,
    Up,
    Down,
    Volatile,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Stable => "STABLE",
            Trend::Up => "UP",
            Trend::Down => "DOWN",
            Trend::Volatile => "VOLATILE",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// |delta| below this is considered unchanged.
const STABLE_BELOW: f64 = 0.5;
/// |delta| at or above this is a swing, regardless of direction.
const VOLATILE_FROM: f64 = 3.0;

/// Classify a raw (1..5 scale) intensity delta.
pub fn classify_trend(delta: Option<f64>) -> Option<Trend> {
    let delta = delta?;
    if delta.is_nan() {
        return None;
    }
    let magnitude = delta.abs();
    if magnitude < STABLE_BELOW {
        Some(Trend::Stable)
    } else if magnitude >= VOLATILE_FROM {
        Some(Trend::Volatile)
    } else if delta > 0.0 {
        Some(Trend::Up)
    } else {
        Some(Trend::Down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_trend_table() {
        assert_eq!(classify_trend(None), None);
        assert_eq!(classify_trend(Some(f64::NAN)), None);
        assert_eq!(classify_trend(Some(0.3)), Some(Trend::Stable));
        assert_eq!(classify_trend(Some(-0.4)), Some(Trend::Stable));
        assert_eq!(classify_trend(Some(3.0)), Some(Trend::Volatile));
        assert_eq!(classify_trend(Some(-3.5)), Some(Trend::Volatile));
        assert_eq!(classify_trend(Some(1.5)), Some(Trend::Up));
        assert_eq!(classify_trend(Some(-2.0)), Some(Trend::Down));
    }

    #[test]
    fn test_trend_serializes_uppercase() {
        let json = serde_json::to_string(&Trend::Volatile).unwrap();
        assert_eq!(json, "\"VOLATILE\"");
        let parsed: Trend = serde_json::from_str("\"DOWN\"").unwrap();
        assert_eq!(parsed, Trend::Down);
    }
}
