//! Multi-step form state kept in the user's session between requests.

pub mod booking_wizard;
pub mod pra_wizard;

pub use booking_wizard::{BookingStep, BookingWizard};
pub use pra_wizard::{PraStep, PraWizard};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// State of one wizard, stored as a single JSON value under `SESSION_KEY`.
pub trait WizardState: Serialize + DeserializeOwned + Default {
    const SESSION_KEY: &'static str;
}
