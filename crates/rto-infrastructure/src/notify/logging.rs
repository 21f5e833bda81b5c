use async_trait::async_trait;
use tracing::info;

use rto_core::error::DomainError;
use rto_core::notifications::{Notification, Notifier};
use rto_shared::utils::mask_email;

/// Notifier used when GOV.UK Notify is disabled (local development).
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError> {
        info!(
            template = notification.template.as_str(),
            to = %mask_email(&notification.email_address),
            personalisation = ?notification.personalisation,
            "Notify disabled, not sending email"
        );
        Ok(())
    }
}
