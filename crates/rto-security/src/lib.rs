//! # RTO Security
//!
//! Security utilities: SSO token verification, Hawk request signing, session keys.

pub mod hawk;
pub mod jwt;
pub mod session;

pub use hawk::{HawkAuthenticator, HawkCredentials, HawkError, HawkRequest};
pub use jwt::{SsoClaims, SsoTokenVerifier};
