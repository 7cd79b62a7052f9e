//! MWB audition server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use mwb_api::{StreamingState, middleware::AppState, router as api_router, streaming_handler};
use mwb_common::{Config, LocalStorage, SequenceBackend, StorageBackend, StorageConfig};
use mwb_core::{
    DbSequenceAllocator, EmailService, InMemorySequenceAllocator, NotificationChannel,
    NotificationService, RegistrationService, SequenceAllocatorService, VotingService,
    WhatsAppService,
};
use mwb_db::repositories::{
    CategorySequenceRepository, ContestantRepository, RegistrationRepository, VoteRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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

/// Build the configured blob storage backend.
async fn build_storage(
    config: &StorageConfig,
) -> Result<Arc<dyn StorageBackend>, Box<dyn std::error::Error>> {
    match config {
        StorageConfig::Local {
            base_path,
            base_url,
        } => {
            tokio::fs::create_dir_all(base_path).await?;
            Ok(Arc::new(LocalStorage::new(
                base_path.clone(),
                base_url.clone(),
            )))
        }
        #[cfg(feature = "s3")]
        StorageConfig::S3 {
            endpoint,
            bucket,
            region,
            access_key_id,
            secret_access_key,
            public_url,
            prefix,
        } => Ok(Arc::new(
            mwb_common::S3Storage::new(
                endpoint,
                bucket.clone(),
                region,
                access_key_id,
                secret_access_key,
                public_url.clone(),
                prefix.clone(),
            )
            .await?,
        )),
        #[cfg(not(feature = "s3"))]
        StorageConfig::S3 { .. } => {
            Err("S3 storage requires building with the `s3` feature".into())
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
                .unwrap_or_else(|_| "mwb=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting MWB audition server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = mwb_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    mwb_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let registration_repo = RegistrationRepository::new(Arc::clone(&db));
    let contestant_repo = ContestantRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));

    let sequences: SequenceAllocatorService = match config.registration.sequence_backend {
        SequenceBackend::Database => Arc::new(DbSequenceAllocator::new(
            CategorySequenceRepository::new(Arc::clone(&db)),
        )),
        SequenceBackend::Memory => {
            warn!("Using in-memory sequence allocator; run a single instance only");
            Arc::new(InMemorySequenceAllocator::seeded_from(&registration_repo).await?)
        }
    };

    let storage = build_storage(&config.storage).await?;

    // Notification channels
    let email_service = EmailService::new(config.email.clone())?;
    let whatsapp_service = WhatsAppService::new(config.whatsapp.clone())?;
    if !email_service.is_enabled() {
        warn!("SMTP is not configured; emails will only be logged");
    }
    if !whatsapp_service.is_enabled() {
        warn!("WhatsApp gateway is not configured; messages will only be logged");
    }
    let admin_email = email_service.admin_address().to_string();
    let channels: Vec<Arc<dyn NotificationChannel>> =
        vec![Arc::new(email_service), Arc::new(whatsapp_service)];
    let notifications = NotificationService::new(
        channels,
        config.payment.clone(),
        &admin_email,
        &config.whatsapp,
    );

    // Streaming state doubles as the admin event publisher
    let streaming = StreamingState::new();

    let registration_service = RegistrationService::new(
        registration_repo.clone(),
        sequences,
        storage,
        Arc::new(streaming.clone()),
        notifications,
        config.registration.clone(),
    );
    let voting_service = VotingService::new(
        contestant_repo,
        vote_repo,
        registration_repo,
        config.payment.clone(),
    );

    if config.admin.token.trim().is_empty() {
        warn!("Admin token is empty; admin endpoints are disabled");
    }

    let state = AppState {
        registration_service,
        voting_service,
        payment: Arc::new(config.payment.clone()),
        admin_token: Arc::from(config.admin.token.trim()),
        streaming,
    };

    // Build router
    let mut app = Router::new()
        .route("/streaming", get(streaming_handler))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            mwb_api::middleware::auth_middleware,
        ))
        .with_state(state);

    // Serve locally stored documents when they live under this server's path.
    if let StorageConfig::Local {
        base_path,
        base_url,
    } = &config.storage
    {
        let mount = base_url.trim_end_matches('/');
        if mount.starts_with('/') && mount.len() > 1 {
            app = app.nest_service(mount, ServeDir::new(base_path));
        }
    }

    let app = app.layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

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
