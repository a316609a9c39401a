use std::sync::{Arc, OnceLock};

use tracing::{debug, trace, warn};

#[cfg(feature = "metrics")]
use {crate::metrics_names::events as ev_metrics, metrics::counter};

use crate::{
    event::{Action, ChatEvent, Notification},
    forward::{CallbackEnvelope, SceneSink, forward_scene},
    notify::notify,
    reference::parse_reference,
    registry::RequestRegistry,
    scene::{Scene, classify_text, is_first_trigger},
};

/// Which gateway callback produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Create,
    Update,
}

impl EventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

/// Entry points called by the gateway adapter for every message event.
///
/// The dispatcher keeps no per-event state; everything shared lives in the
/// [`RequestRegistry`]. Each event causes at most one per-request
/// notification and at most one scene callback.
pub struct EventDispatcher {
    channel_id: String,
    self_id: OnceLock<String>,
    registry: Arc<RequestRegistry>,
    scenes: Arc<dyn SceneSink>,
}

impl EventDispatcher {
    pub fn new(
        channel_id: impl Into<String>,
        registry: Arc<RequestRegistry>,
        scenes: Arc<dyn SceneSink>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            self_id: OnceLock::new(),
            registry,
            scenes,
        }
    }

    /// Record the bot's own user id so its messages are ignored. Set once on
    /// the first gateway ready; later calls are ignored.
    pub fn set_self_id(&self, id: impl Into<String>) {
        let id = id.into();
        if let Err(id) = self.self_id.set(id) {
            trace!(user_id = %id, "self id already recorded");
        }
    }

    pub fn self_id(&self) -> Option<&str> {
        self.self_id.get().map(String::as_str)
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn registry(&self) -> &Arc<RequestRegistry> {
        &self.registry
    }

    /// A message was posted.
    pub async fn on_message_create(&self, event: ChatEvent) {
        if !self.accepts(&event, EventKind::Create) {
            return;
        }

        // New messages only carry a queued announcement or the final image.
        // The stop marker is an edit and is not consulted here.
        if is_first_trigger(&event.content) {
            self.notify_request(&event, Action::Begin);
            let envelope = CallbackEnvelope::content(event.content, Scene::FirstTrigger);
            forward_scene(self.scenes.as_ref(), envelope).await;
        } else if event.has_rendered_image() {
            self.notify_request(&event, Action::End);
            match event.wire_message() {
                Ok(message) => {
                    let envelope = CallbackEnvelope::discord(message, Scene::GenerateEnd);
                    forward_scene(self.scenes.as_ref(), envelope).await;
                },
                Err(e) => warn!(
                    message_id = %event.id,
                    kind = e.kind(),
                    error = %e,
                    "cannot encode message"
                ),
            }
        } else {
            trace!(message_id = %event.id, "new message without a routed scene");
        }
    }

    /// A message was edited (the image bot edits its progress messages).
    pub async fn on_message_update(&self, event: ChatEvent) {
        if !self.accepts(&event, EventKind::Update) {
            return;
        }

        if classify_text(&event.content) == Some(Scene::GenerateEditError) {
            self.notify_request(&event, Action::Error);
            let envelope = CallbackEnvelope::content(event.content, Scene::GenerateEditError);
            forward_scene(self.scenes.as_ref(), envelope).await;
            return;
        }

        // Progress frames are only interesting to the request owner.
        if !event.attachments.is_empty() {
            self.notify_request(&event, Action::Update);
        }

        if !event.embeds.is_empty() {
            forward_scene(self.scenes.as_ref(), CallbackEnvelope::embeds(event.embeds)).await;
        }
    }

    /// Channel and author filter shared by both entry points.
    fn accepts(&self, event: &ChatEvent, kind: EventKind) -> bool {
        if event.channel_id != self.channel_id {
            trace!(kind = kind.as_str(), channel_id = %event.channel_id, "event from other channel");
            self.record_filtered(kind);
            return false;
        }

        let from_self = match event.author_id.as_deref() {
            // Partial updates without an author are not bot output we track.
            None => kind == EventKind::Update,
            Some(author) => self.self_id() == Some(author),
        };
        if from_self {
            self.record_filtered(kind);
            return false;
        }

        debug!(
            kind = kind.as_str(),
            message_id = %event.id,
            payload = %event.wire_message().unwrap_or_default(),
            "discord message"
        );
        #[cfg(feature = "metrics")]
        counter!(ev_metrics::RECEIVED_TOTAL, "kind" => kind.as_str()).increment(1);
        true
    }

    /// Route `event` to the consumer of the request it references. Every
    /// failure here is logged and otherwise ignored.
    fn notify_request(&self, event: &ChatEvent, action: Action) {
        let request_id = match parse_reference(&event.content) {
            Ok((id, _)) => id,
            Err(e) => {
                warn!(
                    message_id = %event.id,
                    %action,
                    kind = e.kind(),
                    error = %e,
                    "cannot route event to a request"
                );
                return;
            },
        };

        let channel = match self.registry.lookup(request_id.as_str()) {
            Ok(channel) => channel,
            Err(e) => {
                warn!(%request_id, %action, kind = e.kind(), error = %e, "request has no consumer");
                return;
            },
        };

        let notification = Notification::new(action, event.clone());
        if let Err(e) = notify(request_id.as_str(), &channel, notification) {
            warn!(%request_id, %action, kind = e.kind(), error = %e, "notification dropped");
        }
    }

    #[allow(unused_variables)]
    fn record_filtered(&self, kind: EventKind) {
        #[cfg(feature = "metrics")]
        counter!(ev_metrics::FILTERED_TOTAL, "kind" => kind.as_str()).increment(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::{Result, event::Attachment, forward::CallbackPayload},
        async_trait::async_trait,
        serde_json::json,
        std::sync::Mutex,
    };

    const CHANNEL: &str = "1100";
    const BOT: &str = "9000";
    const IMAGE_BOT: &str = "936929561302675456";

    #[derive(Default)]
    struct RecordingSink {
        envelopes: Mutex<Vec<CallbackEnvelope>>,
    }

    impl RecordingSink {
        fn take(&self) -> Vec<CallbackEnvelope> {
            std::mem::take(&mut *self.envelopes.lock().unwrap())
        }
    }

    #[async_trait]
    impl SceneSink for RecordingSink {
        async fn forward(&self, envelope: &CallbackEnvelope) -> Result<()> {
            self.envelopes.lock().unwrap().push(envelope.clone());
            Ok(())
        }
    }

    fn setup() -> (EventDispatcher, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = EventDispatcher::new(
            CHANNEL,
            Arc::new(RequestRegistry::new(2)),
            Arc::clone(&sink) as Arc<dyn SceneSink>,
        );
        dispatcher.set_self_id(BOT);
        (dispatcher, sink)
    }

    fn image() -> Attachment {
        Attachment {
            url: "https://cdn.example.com/a.png".into(),
            width: Some(512),
            height: Some(512),
            ..Default::default()
        }
    }

    fn progress_frame() -> Attachment {
        Attachment {
            url: "https://cdn.example.com/partial.webp".into(),
            ..Default::default()
        }
    }

    #[test]
    fn self_id_is_recorded_once() {
        let (dispatcher, _) = setup();
        dispatcher.set_self_id("other");
        assert_eq!(dispatcher.self_id(), Some(BOT));
    }

    #[tokio::test]
    async fn own_messages_are_ignored() {
        let (dispatcher, sink) = setup();
        let mut rx = dispatcher.registry().register("r1").unwrap();
        let event = ChatEvent::new(CHANNEL, "<<r1>> (Waiting to start)").with_author(BOT);
        dispatcher.on_message_create(event.clone()).await;
        dispatcher.on_message_update(event).await;
        assert!(sink.take().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn update_without_author_is_ignored() {
        let (dispatcher, sink) = setup();
        let mut rx = dispatcher.registry().register("r1").unwrap();
        dispatcher
            .on_message_update(ChatEvent::new(CHANNEL, "<<r1>> (Stopped)"))
            .await;
        assert!(sink.take().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reroll_is_not_a_first_trigger() {
        let (dispatcher, sink) = setup();
        let mut rx = dispatcher.registry().register("r1").unwrap();
        dispatcher
            .on_message_create(
                ChatEvent::new(CHANNEL, "Rerolling **<<r1>> fox** - <@1> (Waiting to start)")
                    .with_author(IMAGE_BOT),
            )
            .await;
        assert!(sink.take().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_reference_still_forwards_scene() {
        let (dispatcher, sink) = setup();
        dispatcher
            .on_message_create(
                ChatEvent::new(CHANNEL, "**fox** - <@1> (Waiting to start)").with_author(IMAGE_BOT),
            )
            .await;
        assert_eq!(sink.take(), vec![CallbackEnvelope::content(
            "**fox** - <@1> (Waiting to start)",
            Scene::FirstTrigger
        )]);
    }

    #[tokio::test]
    async fn unknown_request_still_forwards_scene() {
        let (dispatcher, sink) = setup();
        dispatcher
            .on_message_update(ChatEvent::new(CHANNEL, "<<gone>> (Stopped)").with_author(IMAGE_BOT))
            .await;
        assert_eq!(sink.take().len(), 1);
    }

    #[tokio::test]
    async fn update_with_attachments_notifies_only() {
        let (dispatcher, sink) = setup();
        let mut rx = dispatcher.registry().register("r1").unwrap();
        dispatcher
            .on_message_update(
                ChatEvent::new(CHANNEL, "**<<r1>> fox** - <@1> (31%) (fast)")
                    .with_author(IMAGE_BOT)
                    .with_attachment(progress_frame()),
            )
            .await;
        assert_eq!(rx.try_recv().unwrap().action, Action::Update);
        assert!(sink.take().is_empty());
    }

    #[tokio::test]
    async fn update_with_embeds_forwards_rich_text_only() {
        let (dispatcher, sink) = setup();
        let mut rx = dispatcher.registry().register("r1").unwrap();
        let embed = json!({"title": "Invalid parameter", "description": "Unknown --q value"});
        dispatcher
            .on_message_update(
                ChatEvent::new(CHANNEL, "<<r1>>")
                    .with_author(IMAGE_BOT)
                    .with_embed(embed.clone()),
            )
            .await;
        assert!(rx.try_recv().is_err());
        assert_eq!(sink.take(), vec![CallbackEnvelope::embeds(vec![embed])]);
    }

    #[tokio::test]
    async fn update_with_attachments_and_embeds_does_both() {
        let (dispatcher, sink) = setup();
        let mut rx = dispatcher.registry().register("r1").unwrap();
        dispatcher
            .on_message_update(
                ChatEvent::new(CHANNEL, "<<r1>> (50%)")
                    .with_author(IMAGE_BOT)
                    .with_attachment(progress_frame())
                    .with_embed(json!({"title": "t"})),
            )
            .await;
        assert_eq!(rx.try_recv().unwrap().action, Action::Update);
        assert!(rx.try_recv().is_err());
        let sent = sink.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].scene, Scene::RichText);
    }

    #[tokio::test]
    async fn new_message_with_embeds_is_ignored() {
        let (dispatcher, sink) = setup();
        dispatcher
            .on_message_create(
                ChatEvent::new(CHANNEL, "")
                    .with_author(IMAGE_BOT)
                    .with_embed(json!({"title": "t"})),
            )
            .await;
        assert!(sink.take().is_empty());
    }

    #[tokio::test]
    async fn new_image_with_stop_marker_still_ends_request() {
        let (dispatcher, sink) = setup();
        let mut rx = dispatcher.registry().register("r1").unwrap();
        dispatcher
            .on_message_create(
                ChatEvent::new(CHANNEL, "**<<r1>> fox** - <@1> (Stopped)")
                    .with_author(IMAGE_BOT)
                    .with_attachment(image()),
            )
            .await;
        assert_eq!(rx.try_recv().unwrap().action, Action::End);
        let sent = sink.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].scene, Scene::GenerateEnd);
    }

    #[tokio::test]
    async fn new_message_with_stop_marker_alone_is_ignored() {
        let (dispatcher, sink) = setup();
        let mut rx = dispatcher.registry().register("r1").unwrap();
        dispatcher
            .on_message_create(
                ChatEvent::new(CHANNEL, "**<<r1>> fox** - <@1> (Stopped)").with_author(IMAGE_BOT),
            )
            .await;
        assert!(sink.take().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn generate_end_uses_raw_gateway_message() {
        let (dispatcher, sink) = setup();
        let mut rx = dispatcher.registry().register("r1").unwrap();
        let raw = json!({"id": "55", "content": "**<<r1>> fox** - <@1> (fast)", "tts": false});
        dispatcher
            .on_message_create(
                ChatEvent::new(CHANNEL, "**<<r1>> fox** - <@1> (fast)")
                    .with_author(IMAGE_BOT)
                    .with_attachment(image())
                    .with_raw(raw.clone()),
            )
            .await;
        assert_eq!(rx.try_recv().unwrap().action, Action::End);
        let sent = sink.take();
        assert_eq!(sent[0].payload, CallbackPayload::Discord(raw));
    }

    #[tokio::test]
    async fn slow_consumer_does_not_block_dispatch() {
        let (dispatcher, sink) = setup();
        let _rx = dispatcher.registry().register("r1").unwrap();
        let frame = ChatEvent::new(CHANNEL, "<<r1>> (10%)")
            .with_author(IMAGE_BOT)
            .with_attachment(progress_frame());
        for _ in 0..10 {
            dispatcher.on_message_update(frame.clone()).await;
        }
        // the stop still reaches the callback even though the channel is full
        dispatcher
            .on_message_update(ChatEvent::new(CHANNEL, "<<r1>> (Stopped)").with_author(IMAGE_BOT))
            .await;
        assert_eq!(sink.take().len(), 1);
    }
}
