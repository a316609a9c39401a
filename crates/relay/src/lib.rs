//! Event relay between the image bot's Discord channel and its requesters.
//!
//! Gateway events are classified into business [`Scene`]s, tied back to the
//! request that caused them through the `<<request-id>>` reference embedded
//! in the prompt, delivered to that request's consumer without blocking, and
//! selected scenes are forwarded to the business callback endpoint.

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod forward;
pub mod metrics_names;
pub mod notify;
pub mod reference;
pub mod registry;
pub mod scene;

pub use {
    dispatcher::{EventDispatcher, EventKind},
    error::{Error, Result},
    event::{Action, Attachment, ChatEvent, Notification},
    forward::{
        CallbackEnvelope, CallbackPayload, DisabledSceneSink, HttpSceneForwarder, SceneSink,
        forward_scene,
    },
    notify::notify,
    reference::{RequestId, parse_reference, wrap_reference},
    registry::{NotificationReceiver, NotificationSender, RequestRegistry},
    scene::{Scene, classify, classify_text, is_first_trigger},
};
