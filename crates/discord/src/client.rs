use std::sync::Arc;

use {serenity::Client, tracing::info};

use mjwrap_relay::EventDispatcher;

use crate::{Error, Result, handler::RelayHandler};

/// Build a gateway client that dispatches message events into `dispatcher`.
///
/// The returned client is not started; call `start()` on it and use its
/// shard manager to shut it down.
pub async fn connect(token: &str, dispatcher: Arc<EventDispatcher>) -> Result<Client> {
    if token.trim().is_empty() {
        return Err(Error::message("discord bot token is required"));
    }

    info!(channel_id = dispatcher.channel_id(), "connecting discord gateway");
    let client = Client::builder(token, RelayHandler::intents())
        .event_handler(RelayHandler::new(dispatcher))
        .await?;
    Ok(client)
}
