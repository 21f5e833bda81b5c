//! Email notification adapters

mod govuk;
mod logging;

pub use govuk::{GovUkNotifyClient, NotifyError};
pub use logging::LoggingNotifier;
