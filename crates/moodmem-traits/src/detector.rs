//! Best-effort text analysis collaborators.

use async_trait::async_trait;
use moodmem_models::{MessageRecord, UserEmotionProfile};

use crate::error::Result;

/// Finds short, emotionally significant phrases in a message.
#[async_trait]
pub trait AnchorDetector: Send + Sync {
    async fn detect(&self, text: &str, label: &str, intensity: f64) -> Result<Vec<String>>;
}

/// Inputs for deriving a reason label for the latest emotion.
#[derive(Debug, Clone, Copy)]
pub struct ReasonRequest<'a> {
    pub text: Option<&'a str>,
    /// Anchors known for the user, including ones found in this message
    pub anchors: &'a [String],
    /// Recent same-user records in the conversation, newest first
    pub history: &'a [MessageRecord],
    /// Profile as it was before this event
    pub profile: &'a UserEmotionProfile,
}

/// Names the likely cause of the latest emotion, if one can be found.
#[async_trait]
pub trait ReasonDeriver: Send + Sync {
    async fn derive(&self, request: ReasonRequest<'_>) -> Result<Option<String>>;
}

/// Detector for hosts without anchor detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnchors;

#[async_trait]
impl AnchorDetector for NoAnchors {
    async fn detect(&self, _text: &str, _label: &str, _intensity: f64) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Deriver for hosts without reason derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReason;

#[async_trait]
impl ReasonDeriver for NoReason {
    async fn derive(&self, _request: ReasonRequest<'_>) -> Result<Option<String>> {
        Ok(None)
    }
}
