//! Business-scene classification of image bot messages.
//!
//! The image bot reports progress only through free text and attachments, so
//! scenes are recognised from fixed markers in the message content. Rules run
//! in priority order and the first match wins.

use serde::{Deserialize, Serialize};

use crate::event::ChatEvent;

/// Marker appended once a job is aborted.
pub const STOPPED_MARKER: &str = "(Stopped)";
/// Marker of a freshly queued job.
pub const WAITING_MARKER: &str = "(Waiting to start)";
/// Prefix of a reroll, which reuses the waiting marker.
pub const REROLL_MARKER: &str = "Rerolling **";

/// Business meaning of a chat event, reported to the callback endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scene {
    /// Generation request accepted and queued.
    FirstTrigger,
    /// Final image delivered.
    GenerateEnd,
    /// Generation stopped after it was accepted.
    GenerateEditError,
    /// Structured embed content arrived.
    RichText,
}

impl Scene {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstTrigger => "FirstTrigger",
            Self::GenerateEnd => "GenerateEnd",
            Self::GenerateEditError => "GenerateEditError",
            Self::RichText => "RichText",
        }
    }
}

impl std::fmt::Display for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A queued job announcement. A reroll reuses the waiting marker but is not a
/// new request.
#[must_use]
pub fn is_first_trigger(content: &str) -> bool {
    content.contains(WAITING_MARKER) && !content.contains(REROLL_MARKER)
}

/// Classify text alone. Attachment and embed rules need the whole event, see
/// [`classify`].
#[must_use]
pub fn classify_text(content: &str) -> Option<Scene> {
    if content.contains(STOPPED_MARKER) {
        return Some(Scene::GenerateEditError);
    }
    if is_first_trigger(content) {
        return Some(Scene::FirstTrigger);
    }
    None
}

/// Classify a chat event into its business scene, if it has one.
#[must_use]
pub fn classify(event: &ChatEvent) -> Option<Scene> {
    if let Some(scene) = classify_text(&event.content) {
        return Some(scene);
    }
    if event.has_rendered_image() {
        return Some(Scene::GenerateEnd);
    }
    if !event.embeds.is_empty() {
        return Some(Scene::RichText);
    }
    None
}
