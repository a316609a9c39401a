//! Discord event handler for serenity.
//!
//! Converts gateway message events into relay [`ChatEvent`]s and hands them
//! to the [`EventDispatcher`]. Serenity runs each event on its own task, so a
//! slow callback only holds up the event that triggered it.

use std::sync::Arc;

use {
    serenity::{
        all::{
            Attachment as DiscordAttachment, Context, EventHandler, GatewayIntents, Message,
            MessageUpdateEvent, Ready, ResumedEvent,
        },
        async_trait,
    },
    tracing::{info, warn},
};

use mjwrap_relay::{Attachment, ChatEvent, EventDispatcher};

/// Handler for Discord gateway events.
pub struct RelayHandler {
    dispatcher: Arc<EventDispatcher>,
}

impl RelayHandler {
    pub fn new(dispatcher: Arc<EventDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Required gateway intents: guild message events plus their content.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
    }
}

#[async_trait]
impl EventHandler for RelayHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            user_id = %ready.user.id,
            guilds = ready.guilds.len(),
            channel_id = self.dispatcher.channel_id(),
            "discord bot ready"
        );
        self.dispatcher.set_self_id(ready.user.id.to_string());
    }

    async fn resume(&self, _ctx: Context, _: ResumedEvent) {
        info!("discord gateway session resumed");
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        self.dispatcher.on_message_create(message_event(&msg)).await;
    }

    async fn message_update(
        &self,
        _ctx: Context,
        _old_if_available: Option<Message>,
        _new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        self.dispatcher.on_message_update(update_event(&event)).await;
    }
}

fn message_event(msg: &Message) -> ChatEvent {
    ChatEvent {
        id: msg.id.to_string(),
        channel_id: msg.channel_id.to_string(),
        author_id: Some(msg.author.id.to_string()),
        content: msg.content.clone(),
        attachments: msg.attachments.iter().map(attachment).collect(),
        embeds: msg.embeds.iter().filter_map(|e| to_json(e, "embed")).collect(),
        raw: to_json(msg, "message"),
    }
}

/// Updates are partial: fields the edit did not touch are absent.
fn update_event(event: &MessageUpdateEvent) -> ChatEvent {
    ChatEvent {
        id: event.id.to_string(),
        channel_id: event.channel_id.to_string(),
        author_id: event.author.as_ref().map(|u| u.id.to_string()),
        content: event.content.clone().unwrap_or_default(),
        attachments: event
            .attachments
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(attachment)
            .collect(),
        embeds: event
            .embeds
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|e| to_json(e, "embed"))
            .collect(),
        raw: to_json(event, "message update"),
    }
}

fn attachment(a: &DiscordAttachment) -> Attachment {
    Attachment {
        id: a.id.to_string(),
        filename: a.filename.clone(),
        url: a.url.clone(),
        width: a.width,
        height: a.height,
    }
}

fn to_json<T: serde::Serialize>(value: &T, what: &'static str) -> Option<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| warn!(error = %e, "failed to encode discord {what}"))
        .ok()
}
