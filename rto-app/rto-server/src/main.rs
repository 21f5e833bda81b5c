use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::{error, info, warn};

use rto_api::{build_router, AppState, HttpSettings};
use rto_core::notifications::Notifier;
use rto_core::services::{ActivityStreamService, BookingService, PraPolicy, PraService};
use rto_infrastructure::{
    create_pool, run_migrations, GovUkNotifyClient, LoggingNotifier, PgBookingRepository,
    PgBuildingRepository, PgDitGroupRepository, PgHealthRepository, PgPraRepository,
    PgSessionRepository, PgUserRepository,
};
use rto_security::{HawkAuthenticator, HawkCredentials, SsoTokenVerifier};
use rto_shared::config::AppConfig;
use rto_shared::constants::MAX_ACTIVITY_STREAM_PAGE_SIZE;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    let _log_guard = rto_shared::telemetry::init_telemetry(&config.logging)?;

    info!("{} starting ({})", config.app.name, config.app.env);

    // Connect to Database
    let pool = create_pool(&config.database).await?;
    info!("Database connection established.");
    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    let sessions = Arc::new(PgSessionRepository::new(pool.clone()));
    if let Err(e) = sessions.clear_expired(Utc::now()).await {
        warn!("Could not clear expired sessions: {}", e);
    }

    let users = Arc::new(PgUserRepository::new(pool.clone()));
    let buildings = Arc::new(PgBuildingRepository::new(pool.clone()));
    let groups = Arc::new(PgDitGroupRepository::new(pool.clone()));
    let bookings = Arc::new(PgBookingRepository::new(pool.clone()));
    let pras = Arc::new(PgPraRepository::new(pool.clone()));

    let notifier: Arc<dyn Notifier> = if config.notify.enabled {
        info!("Sending email through GOV.UK Notify");
        let client = GovUkNotifyClient::new(&config.notify).context("invalid Notify settings")?;
        let unconfigured = client.unconfigured_templates();
        if !unconfigured.is_empty() {
            let names: Vec<_> = unconfigured.iter().map(|t| t.as_str()).collect();
            warn!(
                "No Notify template ID set for {}; these emails are disabled",
                names.join(", ")
            );
        }
        Arc::new(client)
    } else {
        warn!("GOV.UK Notify disabled; emails are only logged");
        Arc::new(LoggingNotifier)
    };

    let page_size = config
        .activity_stream
        .items_per_page
        .min(MAX_ACTIVITY_STREAM_PAGE_SIZE);

    let state = AppState {
        bookings: Arc::new(BookingService::new(
            bookings.clone(),
            buildings,
            groups.clone(),
            notifier.clone(),
        )),
        pras: Arc::new(PraService::new(
            pras.clone(),
            users.clone(),
            groups,
            notifier,
            PraPolicy {
                allow_staff_member_to_be_scs: config.pra.allow_staff_member_to_be_scs,
                validity_months: config.pra.validity_months,
                base_url: config.app.base_url.clone(),
            },
        )),
        activity_stream: Arc::new(ActivityStreamService::new(bookings, pras, page_size)),
        users,
        sessions,
        health: Arc::new(PgHealthRepository::new(pool)),
        sso: Arc::new(SsoTokenVerifier::new(config.sso.jwt_secret.clone())),
        hawk: Arc::new(HawkAuthenticator::new(
            HawkCredentials {
                id: config.activity_stream.hawk_id.clone(),
                key: config.activity_stream.hawk_secret.clone(),
            },
            config.activity_stream.timestamp_skew_seconds,
        )),
        settings: Arc::new(HttpSettings::from_config(&config)),
    };

    let app = build_router(state);

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
