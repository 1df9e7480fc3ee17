//! Course Market server binary.

use std::error::Error;
use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use course_market::adapters::http::{app_router, RouterOptions, WebhookAppState};
use course_market::adapters::postgres::{
    PostgresCourseRepository, PostgresEnrollmentStore, PostgresPurchaseRepository,
    PostgresUserRepository, PostgresWebhookEventRepository,
};
use course_market::adapters::stripe::{StripeCheckoutClient, StripeConfig};
use course_market::application::{
    HandlePaymentWebhookHandler, IdempotentWebhookProcessor, LedgerPruner,
    PaymentEventDispatcher, ReconciliationEngine, SyncIdentityHandler,
};
use course_market::config::AppConfig;
use course_market::domain::identity::SvixWebhookVerifier;
use course_market::domain::payment::StripeWebhookVerifier;
use course_market::ports::WebhookEventRepository;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config() -> AppConfig {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };
    if let Err(err) = config.validate() {
        eprintln!("Invalid configuration: {}", err);
        std::process::exit(1);
    }
    config
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = load_config();
    init_tracing(&config);

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    // Persistence
    let users = Arc::new(PostgresUserRepository::new(pool.clone()));
    let courses = Arc::new(PostgresCourseRepository::new(pool.clone()));
    let purchases = Arc::new(PostgresPurchaseRepository::new(pool.clone()));
    let enrollments = Arc::new(PostgresEnrollmentStore::new(pool.clone()));
    let ledger: Arc<dyn WebhookEventRepository> =
        Arc::new(PostgresWebhookEventRepository::new(pool.clone()));

    // Payment webhook pipeline
    let sessions = Arc::new(StripeCheckoutClient::new(
        StripeConfig::new(config.payment.api_key())
            .with_base_url(config.payment.stripe_api_base_url.clone())
            .with_timeout(config.payment.timeout()),
    )?);
    let engine = Arc::new(ReconciliationEngine::new(
        sessions,
        users.clone(),
        courses,
        purchases,
        enrollments,
    ));
    let processor = Arc::new(IdempotentWebhookProcessor::new(
        ledger.clone(),
        Arc::new(PaymentEventDispatcher::new(engine)),
    ));
    let payment_webhook = Arc::new(HandlePaymentWebhookHandler::new(
        Arc::new(StripeWebhookVerifier::new(config.payment.webhook_secret())),
        processor,
    ));

    // Identity webhook
    let identity_sync = Arc::new(SyncIdentityHandler::new(
        Arc::new(SvixWebhookVerifier::new(&config.identity.webhook_secret())?),
        users,
    ));

    // Ledger maintenance
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pruner = LedgerPruner::new(
        ledger,
        config.webhooks.retention(),
        config.webhooks.cleanup_interval(),
    );
    let pruner_handle = tokio::spawn(async move { pruner.run(shutdown_rx).await });

    let app = app_router(
        WebhookAppState {
            payment_webhook,
            identity_sync,
        },
        &RouterOptions {
            request_timeout: config.server.request_timeout(),
            cors_origins: config.server.cors_origins_list(),
        },
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(err) = pruner_handle.await {
        tracing::warn!(error = %err, "Ledger pruner task ended abnormally");
    }
    tracing::info!("Server stopped");
    Ok(())
}
