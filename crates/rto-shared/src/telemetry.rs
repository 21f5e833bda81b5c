//! Telemetry setup

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::LoggingSettings;
use crate::error::AppError;

const DEFAULT_FILTER: &str =
    "info,rto_core=debug,rto_api=debug,rto_infrastructure=debug,tower_http=info,sqlx=warn";

/// Installs the global subscriber. Keep the returned guard alive for the
/// lifetime of the process, otherwise buffered file output is lost.
pub fn init_telemetry(settings: &LoggingSettings) -> Result<Option<WorkerGuard>, AppError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = settings.format != "pretty";

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if json {
        layers.push(fmt::layer().json().with_target(true).boxed());
    } else {
        layers.push(fmt::layer().pretty().with_target(true).boxed());
    }

    let guard = match &settings.directory {
        Some(directory) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("rto")
                .filename_suffix("log")
                .build(directory)
                .map_err(|e| AppError::TelemetryError(e.to_string()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| AppError::TelemetryError(e.to_string()))?;

    Ok(guard)
}
