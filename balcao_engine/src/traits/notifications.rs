use thiserror::Error;

use crate::db_types::{NotificationType, Order};

/// Outward customer messaging.
///
/// Implementations deliver a text message for the given event to the order's phone number.
/// Every error is non-fatal to the pipeline: callers log the failure, record it, and carry on.
#[allow(async_fn_in_trait)]
pub trait NotificationDispatcher: Clone + Send + Sync {
    async fn notify(&self, event: NotificationType, order: &Order) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Could not deliver {event} message: {message}")]
    DeliveryFailed { event: String, message: String },
    #[error("The messaging channel is misconfigured: {0}")]
    Configuration(String),
}
