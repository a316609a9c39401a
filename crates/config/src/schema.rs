//! Config schema for the relay: Discord gateway, business callback, and
//! per-request notification channels.

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Default buffer size of each per-request notification channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4;

/// Default timeout for one callback POST.
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 30;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub discord: DiscordConfig,
    pub callback: CallbackConfig,
    pub requests: RequestsConfig,
}

/// Discord bot account and the channel the image bot posts into.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token used by the gateway connection.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Only events from this channel are dispatched.
    pub channel_id: String,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            channel_id: String::new(),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Business callback endpoint that receives scene envelopes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackConfig {
    /// Callback URL. When unset, scene forwarding is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Upper bound for a single POST, in seconds.
    pub timeout_secs: u64,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: DEFAULT_CALLBACK_TIMEOUT_SECS,
        }
    }
}

/// Per-request notification channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestsConfig {
    /// Buffer size of each per-request channel. Notifications beyond it are
    /// dropped.
    pub channel_capacity: usize,
}

impl Default for RequestsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
