//! formrelay HTTP server
//!
//! Main entry point for the form backend.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use application::{
    DeliveryOrchestrator, HealthService, MailPort, MessageComposer, SubmissionService,
    SubmissionStorePort,
};
use infrastructure::{
    AppConfig, AsyncDatabase, AsyncDatabaseConfig, ConfigValidator, SmtpMailAdapter,
    SqliteSubmissionStore, init_telemetry, validation::ALLOW_INSECURE_ENV,
};
use presentation_http::{cors_layer, error::set_expose_internal_errors, routes, state::AppState};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive until shutdown so pending spans are flushed
    let _telemetry = init_telemetry(&config.telemetry, config.server.log_format)
        .context("Failed to initialize telemetry")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "formrelay starting"
    );

    let warnings = ConfigValidator::validate(&config);
    ConfigValidator::log_warnings(&warnings);
    let allow_insecure =
        ConfigValidator::allow_insecure_from(std::env::var(ALLOW_INSECURE_ENV).ok().as_deref());
    if ConfigValidator::should_block_startup(&config, &warnings, allow_insecure) {
        error!(
            override_variable = ALLOW_INSECURE_ENV,
            "Refusing to start with critical configuration issues in production"
        );
        anyhow::bail!("critical configuration issues; set {ALLOW_INSECURE_ENV}=true to override");
    }

    set_expose_internal_errors(!config.is_production());

    // Storage
    let database = AsyncDatabase::new(&AsyncDatabaseConfig::from(&config.database))
        .await
        .context("Failed to open database")?;
    if config.database.run_migrations {
        let applied = database.migrate().await.context("Failed to run migrations")?;
        info!(applied, "Database migrations complete");
    }
    let store: Arc<dyn SubmissionStorePort> =
        Arc::new(SqliteSubmissionStore::new(database.pool().clone()));

    // Mail transports
    let send_timeout = Duration::from_secs(config.mail.send_timeout_secs);
    let primary: Arc<dyn MailPort> = Arc::new(
        SmtpMailAdapter::new(&config.mail.primary, send_timeout)
            .context("Failed to configure primary mail transport")?,
    );

    let composer = MessageComposer::new(config.mail.notification_settings());
    let mut orchestrator =
        DeliveryOrchestrator::new(Arc::clone(&store), Arc::clone(&primary), composer)
            .with_send_timeout(send_timeout);
    if let Some(alternate) = &config.mail.alternate {
        let adapter = SmtpMailAdapter::new(alternate, send_timeout)
            .context("Failed to configure alternate mail transport")?;
        info!(transport = %alternate.name, "Alternate mail transport configured");
        orchestrator = orchestrator.with_alternate(Arc::new(adapter));
    }

    let config = Arc::new(config);
    let state = AppState {
        submission_service: Arc::new(SubmissionService::new(Arc::new(orchestrator))),
        health_service: Arc::new(HealthService::new(store, primary)),
        config: Arc::clone(&config),
    };

    // Build router; first added = innermost
    let app = routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server));

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(address = %addr, "Server listening");

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await?;

    database.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    info!(timeout = ?timeout, "Waiting for in-flight requests to finish");

    // Hard stop if connections do not drain in time
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        error!("Graceful shutdown timed out, exiting");
        std::process::exit(1);
    });
}
