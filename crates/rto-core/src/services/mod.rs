//! Domain services

pub mod activity_stream_service;
pub mod booking_service;
pub mod pra_service;

pub use activity_stream_service::{ActivityPage, ActivityStreamService};
pub use booking_service::{BookingRequest, BookingService};
pub use pra_service::{PraPolicy, PraService, PraSubmission, PraView};

use tracing::{error, info};

use crate::notifications::{Notification, Notifier};

/// Sends a notification after the write it reports on has been committed.
/// Failures are logged; the write stands.
async fn dispatch(notifier: &dyn Notifier, notification: Notification) {
    match notifier.send(&notification).await {
        Ok(()) => info!(
            "Notification {} sent to {}",
            notification.template.as_str(),
            rto_shared::utils::mask_email(&notification.email_address)
        ),
        Err(e) => error!(
            "Failed to send notification {}: {}",
            notification.template.as_str(),
            e
        ),
    }
}
