//! Configuration management

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_ACTIVITY_STREAM_PAGE_SIZE, DEFAULT_HAWK_TIMESTAMP_SKEW_SECONDS,
    DEFAULT_PRA_VALIDITY_MONTHS, DEFAULT_SESSION_COOKIE_NAME, DEFAULT_SESSION_TTL_HOURS,
    DEFAULT_SSO_COOKIE_NAME,
};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub sso: SsoSettings,
    pub session: SessionSettings,
    pub notify: NotifySettings,
    pub activity_stream: ActivityStreamSettings,
    pub pra: PraSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    /// Public origin used to build links in notification emails.
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SsoSettings {
    /// Shared HS256 secret of the staff SSO broker.
    pub jwt_secret: String,
    pub cookie_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub ttl_hours: i64,
    pub secure_cookie: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifySettings {
    pub enabled: bool,
    pub api_key: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub templates: NotifyTemplates,
}

/// GOV.UK Notify template IDs, one per notification kind.
#[derive(Debug, Deserialize, Clone)]
pub struct NotifyTemplates {
    pub booking_confirmation: String,
    pub booking_cancellation: String,
    pub pra_staff_member_approval_request: String,
    pub pra_rejected_without_approval: String,
    pub pra_decision: String,
    pub pra_scs_approval_request: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ActivityStreamSettings {
    pub hawk_id: String,
    pub hawk_secret: String,
    pub items_per_page: u32,
    pub timestamp_skew_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PraSettings {
    pub allow_staff_member_to_be_scs: bool,
    pub validity_months: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    /// `json` or `pretty`
    pub format: String,
    /// Directory for daily rolling log files; stdout only when unset.
    pub directory: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true));
        builder.build()?.try_deserialize()
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "rto-server")?
            .set_default("app.base_url", "http://localhost:8080")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_seconds", 3)?
            .set_default("database.run_migrations", true)?
            .set_default("sso.cookie_name", DEFAULT_SSO_COOKIE_NAME)?
            .set_default("session.cookie_name", DEFAULT_SESSION_COOKIE_NAME)?
            .set_default("session.ttl_hours", DEFAULT_SESSION_TTL_HOURS)?
            .set_default("session.secure_cookie", true)?
            .set_default("notify.enabled", false)?
            .set_default("notify.api_key", "")?
            .set_default("notify.base_url", "https://api.notifications.service.gov.uk")?
            .set_default("notify.timeout_seconds", 10)?
            .set_default(
                "activity_stream.items_per_page",
                i64::from(DEFAULT_ACTIVITY_STREAM_PAGE_SIZE),
            )?
            .set_default(
                "activity_stream.timestamp_skew_seconds",
                DEFAULT_HAWK_TIMESTAMP_SKEW_SECONDS,
            )?
            .set_default("pra.allow_staff_member_to_be_scs", false)?
            .set_default("pra.validity_months", i64::from(DEFAULT_PRA_VALIDITY_MONTHS))?
            .set_default("logging.format", "json")
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const MINIMAL: &str = r#"
        [database]
        url = "postgres://localhost/rto"

        [sso]
        jwt_secret = "sso-secret"

        [notify.templates]
        booking_confirmation = "b1"
        booking_cancellation = "b2"
        pra_staff_member_approval_request = "p1"
        pra_rejected_without_approval = "p2"
        pra_decision = "p3"
        pra_scs_approval_request = "p4"

        [activity_stream]
        hawk_id = "as-id"
        hawk_secret = "as-secret"
    "#;

    #[test]
    fn test_defaults_fill_optional_settings() {
        let config: AppConfig = AppConfig::defaults(Config::builder())
            .unwrap()
            .add_source(File::from_str(MINIMAL, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.app.port, 8080);
        assert_eq!(config.activity_stream.items_per_page, 50);
        assert_eq!(config.activity_stream.timestamp_skew_seconds, 60);
        assert_eq!(config.pra.validity_months, 6);
        assert!(!config.pra.allow_staff_member_to_be_scs);
        assert!(!config.notify.enabled);
        assert_eq!(config.session.cookie_name, "rto_session");
        assert!(config.logging.directory.is_none());
        assert!(!config.is_production());
    }

    fn load_shipped(env: Option<&str>) -> AppConfig {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config");
        let mut builder = AppConfig::defaults(Config::builder())
            .unwrap()
            .add_source(File::with_name(&format!("{}/default", dir)));
        if let Some(env) = env {
            builder = builder.add_source(File::with_name(&format!("{}/{}", dir, env)));
        }
        builder
            .add_source(File::from_str(
                r#"
                    [sso]
                    jwt_secret = "sso-secret"

                    [activity_stream]
                    hawk_id = "as-id"
                    hawk_secret = "as-secret"
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_session_cookie_is_secure_outside_development() {
        assert!(load_shipped(None).session.secure_cookie);
        assert!(!load_shipped(Some("development")).session.secure_cookie);
    }

    #[test]
    fn test_missing_required_setting_fails() {
        let result: Result<AppConfig, _> = AppConfig::defaults(Config::builder())
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize();

        assert!(result.is_err());
    }
}
