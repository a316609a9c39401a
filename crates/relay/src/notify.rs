use {tokio::sync::mpsc::error::TrySendError, tracing::debug};

#[cfg(feature = "metrics")]
use {crate::metrics_names::notifications as notify_metrics, metrics::counter};

use crate::{Error, Result, event::Notification, registry::NotificationSender};

/// Hand `notification` to the consumer behind `channel` without waiting.
///
/// A full buffer or a vanished consumer drops the notification: one slow
/// consumer must never hold up the event stream shared by every request.
/// Dropped notifications are not retried.
pub fn notify(
    request_id: &str,
    channel: &NotificationSender,
    notification: Notification,
) -> Result<()> {
    let action = notification.action;
    match channel.try_send(notification) {
        Ok(()) => {
            debug!(request_id, %action, "notification delivered");
            #[cfg(feature = "metrics")]
            counter!(notify_metrics::DELIVERED_TOTAL, "action" => action.as_str()).increment(1);
            Ok(())
        },
        Err(TrySendError::Full(_)) => {
            #[cfg(feature = "metrics")]
            counter!(notify_metrics::DROPPED_TOTAL, "reason" => "full").increment(1);
            Err(Error::ChannelFull {
                request_id: request_id.to_string(),
            })
        },
        Err(TrySendError::Closed(_)) => {
            #[cfg(feature = "metrics")]
            counter!(notify_metrics::DROPPED_TOTAL, "reason" => "closed").increment(1);
            Err(Error::ConsumerClosed {
                request_id: request_id.to_string(),
            })
        },
    }
}
