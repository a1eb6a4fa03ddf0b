//! Per-stage results of processing one emotion event.

use moodmem_traits::MemoryError;
use serde::Serialize;
use std::fmt;

/// Outcome of one best-effort stage.
///
/// `Degraded` carries a usable value together with the sub-steps that failed
/// on the way; `Failed` means the stage produced nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome<T> {
    Success { value: T },
    Degraded { value: T, issues: Vec<String> },
    Failed { reason: String },
}

impl<T> StageOutcome<T> {
    pub fn failed(reason: impl fmt::Display) -> Self {
        Self::Failed {
            reason: reason.to_string(),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success { value } | Self::Degraded { value, .. } => Some(value),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn issues(&self) -> &[String] {
        match self {
            Self::Degraded { issues, .. } => issues,
            _ => &[],
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Degraded { .. } => "degraded",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Collects sub-step failures while a stage keeps going.
#[derive(Debug, Default)]
pub(crate) struct StageIssues(Vec<String>);

impl StageIssues {
    pub(crate) fn push(&mut self, step: &str, error: &MemoryError) {
        self.0.push(format!("{step}: {error}"));
    }

    pub(crate) fn finish<T>(self, value: T) -> StageOutcome<T> {
        if self.0.is_empty() {
            StageOutcome::Success { value }
        } else {
            StageOutcome::Degraded {
                value,
                issues: self.0,
            }
        }
    }
}

/// Why an event was dropped before any stage ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    #[error("event has no user ID")]
    MissingUserId,
    #[error("event has no conversation ID")]
    MissingConversationId,
    #[error("event has no message ID")]
    MissingMessageId,
    #[error("event has no primary emotion label")]
    MissingEmotion,
}

/// What happened to each stage of one processed event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventReport {
    pub enrichment: StageOutcome<()>,
    pub short_term: StageOutcome<crate::memory::ShortTermSignal>,
    pub long_term: StageOutcome<()>,
}

impl EventReport {
    pub fn is_complete(&self) -> bool {
        self.enrichment.is_success() && self.short_term.is_success() && self.long_term.is_success()
    }
}

/// Result of submitting an event to the memory pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum EventOutcome {
    Rejected { reason: RejectReason },
    Processed(EventReport),
}

impl EventOutcome {
    pub fn report(&self) -> Option<&EventReport> {
        match self {
            Self::Processed(report) => Some(report),
            Self::Rejected { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issues_turn_success_into_degraded() {
        let clean = StageIssues::default().finish(7);
        assert!(clean.is_success());
        assert_eq!(clean.value(), Some(&7));

        let mut issues = StageIssues::default();
        issues.push("trend patch", &MemoryError::Storage("disk full".to_string()));
        let degraded = issues.finish(7);
        assert_eq!(degraded.status(), "degraded");
        assert_eq!(degraded.value(), Some(&7));
        assert_eq!(degraded.issues(), ["trend patch: Storage error: disk full"]);
    }

    #[test]
    fn test_failed_has_no_value() {
        let failed: StageOutcome<u8> = StageOutcome::failed("profile unavailable");
        assert!(failed.is_failed());
        assert!(failed.value().is_none());
    }
}
