//! Scene forwarding to the business callback endpoint.

use std::time::Duration;

use {
    async_trait::async_trait,
    reqwest::header::CONTENT_TYPE,
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use {crate::metrics_names::callbacks as cb_metrics, metrics::counter};

use crate::{Result, scene::Scene};

/// The single payload carried by a callback envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackPayload {
    /// Rich embeds of an updated message.
    Embeds(Vec<serde_json::Value>),
    /// The full gateway message.
    Discord(serde_json::Value),
    /// Message text only.
    Content(String),
}

/// Body POSTed to the callback endpoint:
/// `{"embeds"|"discord"|"content": ..., "type": <Scene>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackEnvelope {
    #[serde(flatten)]
    pub payload: CallbackPayload,
    #[serde(rename = "type")]
    pub scene: Scene,
}

impl CallbackEnvelope {
    pub fn content(content: impl Into<String>, scene: Scene) -> Self {
        Self {
            payload: CallbackPayload::Content(content.into()),
            scene,
        }
    }

    pub fn discord(message: serde_json::Value, scene: Scene) -> Self {
        Self {
            payload: CallbackPayload::Discord(message),
            scene,
        }
    }

    pub fn embeds(embeds: Vec<serde_json::Value>) -> Self {
        Self {
            payload: CallbackPayload::Embeds(embeds),
            scene: Scene::RichText,
        }
    }
}

/// Destination for scene envelopes.
#[async_trait]
pub trait SceneSink: Send + Sync {
    /// Deliver one envelope. Called once per envelope, never retried.
    async fn forward(&self, envelope: &CallbackEnvelope) -> Result<()>;
}

/// Posts envelopes as JSON to the configured callback URL.
pub struct HttpSceneForwarder {
    client: reqwest::Client,
    url: String,
}

impl HttpSceneForwarder {
    /// Build a forwarder whose POSTs give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SceneSink for HttpSceneForwarder {
    async fn forward(&self, envelope: &CallbackEnvelope) -> Result<()> {
        let body = serde_json::to_vec(envelope)?;
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        response.error_for_status()?;
        debug!(scene = %envelope.scene, %status, "callback delivered");
        Ok(())
    }
}

/// Used when no callback URL is configured: envelopes are discarded.
pub struct DisabledSceneSink;

#[async_trait]
impl SceneSink for DisabledSceneSink {
    async fn forward(&self, envelope: &CallbackEnvelope) -> Result<()> {
        debug!(scene = %envelope.scene, "scene forwarding disabled, envelope discarded");
        Ok(())
    }
}

/// Fire-and-forget delivery: failures are logged and swallowed.
pub async fn forward_scene(sink: &dyn SceneSink, envelope: CallbackEnvelope) {
    let scene = envelope.scene;
    match sink.forward(&envelope).await {
        Ok(()) => {
            #[cfg(feature = "metrics")]
            counter!(cb_metrics::SENT_TOTAL, "scene" => scene.as_str()).increment(1);
        },
        Err(e) => {
            warn!(%scene, kind = e.kind(), error = %e, "scene callback failed");
            #[cfg(feature = "metrics")]
            counter!(cb_metrics::FAILED_TOTAL, "scene" => scene.as_str()).increment(1);
        },
    }
}
