//! Metric names recorded when the `metrics` feature is enabled.

/// Inbound gateway events
pub mod events {
    /// Events accepted by the dispatcher, labelled by `kind` (create/update)
    pub const RECEIVED_TOTAL: &str = "mjwrap_events_received_total";
    /// Events dropped by the channel/author filter
    pub const FILTERED_TOTAL: &str = "mjwrap_events_filtered_total";
}

/// Per-request notifications
pub mod notifications {
    /// Notifications handed to a consumer, labelled by `action`
    pub const DELIVERED_TOTAL: &str = "mjwrap_notifications_delivered_total";
    /// Notifications lost, labelled by `reason`
    pub const DROPPED_TOTAL: &str = "mjwrap_notifications_dropped_total";
}

/// Business callback
pub mod callbacks {
    /// Envelopes accepted by the callback endpoint, labelled by `scene`
    pub const SENT_TOTAL: &str = "mjwrap_callbacks_sent_total";
    /// Failed callback deliveries, labelled by `scene`
    pub const FAILED_TOTAL: &str = "mjwrap_callbacks_failed_total";
}

/// Request registry
pub mod registry {
    /// Number of requests with a live consumer
    pub const REGISTERED: &str = "mjwrap_requests_registered";
}
