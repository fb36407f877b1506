//! Informes server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use informes_api::{AppState, auth_middleware, router as api_router};
use informes_common::Config;
use informes_core::{
    AccessGuard, AllowListService, ExportService, JwtIdentityProvider, NumberingService,
    RatingService, ReportService, SessionEvent, SharedClock,
};
use informes_db::repositories::{
    AllowedUserRepository, RatingRepository, ReportCounterRepository, ReportRepository,
};
use tokio::signal;
use tokio::sync::broadcast;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Log session changes as they happen.
async fn log_session_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::SignedIn { email }) => info!(%email, "Session started"),
            Ok(SessionEvent::SignedOut { email }) => info!(%email, "Session ended"),
            Ok(SessionEvent::Revoked { email }) => warn!(%email, "Session revoked by allow-list"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Session event log fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "informes=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting informes server...");

    // Load configuration
    let config = Config::load()?;
    config.registry.validate()?;

    // Connect to database
    let db = Arc::new(informes_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    informes_db::migrate(&db).await?;
    info!("Migrations completed");

    // Repositories
    let allowed_user_repo = AllowedUserRepository::new(Arc::clone(&db));
    let report_repo = ReportRepository::new(Arc::clone(&db));
    let rating_repo = RatingRepository::new(Arc::clone(&db));
    let counter_repo = ReportCounterRepository::new(Arc::clone(&db));

    // Services
    let clock: SharedClock = Arc::new(mockable::DefaultClock);
    let allow_list_service = AllowListService::new(allowed_user_repo, Arc::clone(&clock));
    let numbering = NumberingService::new(
        report_repo.clone(),
        counter_repo,
        Arc::clone(&clock),
        &config.registry,
    )?;
    let report_service = ReportService::new(
        report_repo.clone(),
        numbering,
        Arc::clone(&clock),
        config.registry.clone(),
    );
    let rating_service = RatingService::new(rating_repo.clone(), report_repo.clone(), clock);
    let export_service = ExportService::new(report_repo, rating_repo, &config.registry)?;

    let identity = Arc::new(JwtIdentityProvider::new(&config.auth)?);
    let access = AccessGuard::new(identity, allow_list_service.clone());

    let added = allow_list_service
        .bootstrap_admins(&config.auth.bootstrap_admins)
        .await?;
    if added > 0 {
        info!(added, "Bootstrap admins added to the allow-list");
    }

    tokio::spawn(log_session_events(access.subscribe()));

    let state = AppState {
        access,
        allow_list_service,
        report_service,
        rating_service,
        export_service,
        registry: Arc::new(config.registry.clone()),
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
