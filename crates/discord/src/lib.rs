//! Discord gateway adapter for the mjwrap relay.
//!
//! Owns the serenity client: connects with the bot token, records the bot's
//! own user id, and feeds message create/update events into the relay's
//! [`EventDispatcher`](mjwrap_relay::EventDispatcher).

pub mod client;
pub mod error;
pub mod handler;

pub use {
    client::connect,
    error::{Error, Result},
    handler::RelayHandler,
};
