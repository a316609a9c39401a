//! Inbound chat events and the per-request notifications derived from them.

use serde::{Deserialize, Serialize};

/// File attached to a chat message. Rendered images carry their pixel size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Attachment {
    /// Whether this attachment is a finished image with positive dimensions.
    #[must_use]
    pub fn is_rendered_image(&self) -> bool {
        matches!((self.width, self.height), (Some(w), Some(h)) if w > 0 && h > 0)
    }
}

/// Read-only projection of one inbound chat message, built by the gateway
/// adapter for every create or update frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatEvent {
    pub id: String,
    pub channel_id: String,
    /// Absent on partial updates that do not repeat the author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    pub content: String,
    pub attachments: Vec<Attachment>,
    /// Rich embeds, kept as the gateway's JSON objects.
    pub embeds: Vec<serde_json::Value>,
    /// Full gateway message as received, forwarded verbatim to the business
    /// callback. `None` when the event was built by hand.
    #[serde(skip)]
    pub raw: Option<serde_json::Value>,
}

impl ChatEvent {
    pub fn new(channel_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    #[must_use]
    pub fn with_embed(mut self, embed: serde_json::Value) -> Self {
        self.embeds.push(embed);
        self
    }

    #[must_use]
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    /// True when at least one attachment is a rendered image.
    #[must_use]
    pub fn has_rendered_image(&self) -> bool {
        self.attachments.iter().any(Attachment::is_rendered_image)
    }

    /// JSON form of the message for the callback's `discord` field: the raw
    /// gateway payload when available, otherwise this projection.
    pub fn wire_message(&self) -> crate::Result<serde_json::Value> {
        match &self.raw {
            Some(raw) => Ok(raw.clone()),
            None => Ok(serde_json::to_value(self)?),
        }
    }
}

/// Per-request lifecycle tag delivered to the request's consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Generation was accepted and queued.
    Begin,
    /// Progress frame (intermediate image) arrived.
    Update,
    /// Final image was delivered.
    End,
    /// Generation was stopped.
    Error,
}

impl Action {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Update => "update",
            Self::End => "end",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message handed to the consumer that owns a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub action: Action,
    pub message: ChatEvent,
}

impl Notification {
    pub fn new(action: Action, message: ChatEvent) -> Self {
        Self { action, message }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, serde_json::json};

    fn image(width: Option<u32>, height: Option<u32>) -> Attachment {
        Attachment {
            id: "1".into(),
            filename: "grid.png".into(),
            url: "https://cdn.example.com/grid.png".into(),
            width,
            height,
        }
    }

    #[test]
    fn rendered_image_needs_both_dimensions() {
        assert!(image(Some(512), Some(512)).is_rendered_image());
        assert!(!image(Some(512), Some(0)).is_rendered_image());
        assert!(!image(None, Some(512)).is_rendered_image());
        assert!(!image(None, None).is_rendered_image());
    }

    #[test]
    fn wire_message_prefers_raw_payload() {
        let raw = json!({"id": "99", "content": "hello", "mention_everyone": false});
        let event = ChatEvent::new("c1", "hello").with_raw(raw.clone());
        assert_eq!(event.wire_message().unwrap(), raw);
    }

    #[test]
    fn wire_message_falls_back_to_projection() {
        let event = ChatEvent::new("c1", "hello")
            .with_author("u1")
            .with_attachment(image(Some(4), Some(4)));
        let value = event.wire_message().unwrap();
        assert_eq!(value["channel_id"], "c1");
        assert_eq!(value["author_id"], "u1");
        assert_eq!(value["attachments"][0]["width"], 4);
        assert!(value.get("raw").is_none());
    }

    #[test]
    fn action_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Action::Begin).unwrap(), "\"begin\"");
        assert_eq!(Action::Error.to_string(), "error");
    }
}
