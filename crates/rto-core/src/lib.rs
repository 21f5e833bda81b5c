//! # RTO Core
//!
//! Domain entities, repository traits, wizards and services for desk booking
//! and personal risk assessment approval.

pub mod domain;
pub mod error;
pub mod notifications;
pub mod repositories;
pub mod services;
pub mod wizard;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export domain entities
pub use domain::*;
pub use error::{DomainError, FieldError};
