//! Application-wide constants

/// Months a personal risk assessment stays valid after it was submitted.
pub const DEFAULT_PRA_VALIDITY_MONTHS: u32 = 6;
pub const DEFAULT_ACTIVITY_STREAM_PAGE_SIZE: u32 = 50;
pub const MAX_ACTIVITY_STREAM_PAGE_SIZE: u32 = 500;
pub const DEFAULT_HAWK_TIMESTAMP_SKEW_SECONDS: i64 = 60;
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "rto_session";
pub const DEFAULT_SSO_COOKIE_NAME: &str = "rto_sso_token";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

/// Placeholder business unit returned when a group has none configured.
pub const UNKNOWN_BUSINESS_UNIT: &str = "Unknown";

/// Display value for bookings made for the logged-in user.
pub const ON_BEHALF_OF_YOURSELF: &str = "Yourself";
