use {
    dashmap::{DashMap, mapref::entry::Entry},
    tokio::sync::mpsc,
    tracing::debug,
};

#[cfg(feature = "metrics")]
use {crate::metrics_names::registry as reg_metrics, metrics::gauge};

use crate::{
    Error, Result,
    event::Notification,
    reference::RequestId,
};

/// Sender half of a per-request notification channel.
pub type NotificationSender = mpsc::Sender<Notification>;

/// Receiver half, owned by the consumer that registered the request.
pub type NotificationReceiver = mpsc::Receiver<Notification>;

/// Maps outstanding request ids to their bounded notification channels.
///
/// This is the only shared mutable state in the relay. It is injected into
/// the dispatcher and into whatever owns the request lifecycle; both sides
/// can call it concurrently.
pub struct RequestRegistry {
    channels: DashMap<RequestId, NotificationSender>,
    default_capacity: usize,
}

impl RequestRegistry {
    /// Create a registry whose channels buffer `default_capacity`
    /// notifications. A zero capacity is bumped to one.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            default_capacity: default_capacity.max(1),
        }
    }

    pub fn default_capacity(&self) -> usize {
        self.default_capacity
    }

    /// Register a consumer for `id` with the default capacity.
    pub fn register(&self, id: impl Into<RequestId>) -> Result<NotificationReceiver> {
        self.register_with_capacity(id, self.default_capacity)
    }

    /// Register a consumer for `id`.
    ///
    /// Fails with [`Error::DuplicateRequest`] while a previous consumer is
    /// still registered; stale entries must be unregistered first.
    pub fn register_with_capacity(
        &self,
        id: impl Into<RequestId>,
        capacity: usize,
    ) -> Result<NotificationReceiver> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity { capacity });
        }
        let id = id.into();
        match self.channels.entry(id) {
            Entry::Occupied(entry) => Err(Error::duplicate(entry.key())),
            Entry::Vacant(entry) => {
                let (tx, rx) = mpsc::channel(capacity);
                debug!(request_id = %entry.key(), capacity, "request registered");
                entry.insert(tx);
                self.record_size();
                Ok(rx)
            },
        }
    }

    /// Sender for `id`, or [`Error::NotFound`] if nobody is waiting on it.
    pub fn lookup(&self, id: &str) -> Result<NotificationSender> {
        self.channels
            .get(id)
            .map(|tx| tx.value().clone())
            .ok_or_else(|| Error::not_found(id))
    }

    /// Remove the entry for `id`. Returns whether an entry existed; calling
    /// it again is a no-op.
    pub fn unregister(&self, id: &str) -> bool {
        let removed = self.channels.remove(id).is_some();
        if removed {
            debug!(request_id = id, "request unregistered");
            self.record_size();
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.channels.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn record_size(&self) {
        #[cfg(feature = "metrics")]
        gauge!(reg_metrics::REGISTERED).set(self.channels.len() as f64);
    }
}

impl Default for RequestRegistry {
    fn default() -> Self {
        Self::new(4)
    }
}
