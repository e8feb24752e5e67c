use anyhow::{Context, Result};
use doctor_roots::bot::{router, Dispatcher};
use doctor_roots::catalog::{ClassMapping, PlantCatalog};
use doctor_roots::classifier::OnnxClassifier;
use doctor_roots::config::BotConfig;
use doctor_roots::conversation_store::InMemoryConversationStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    init_tracing();

    info!("Starting Doctor Roots webhook bot");

    let config = BotConfig::from_env()?;

    let catalog = Arc::new(PlantCatalog::load(&config.classifier.plant_data_path)?);
    let mapping = Arc::new(ClassMapping::load(&config.classifier.class_mapping_path)?);
    let missing = catalog.check_integrity(&mapping);
    if !missing.is_empty() {
        warn!(
            missing = missing.len(),
            "Class mapping and plant data disagree, affected plants will reply as not found"
        );
    }

    let classifier = Arc::new(OnnxClassifier::load(&config.classifier.model_path)?);
    let store = Arc::new(InMemoryConversationStore::new(&config.conversation));

    let dispatcher = Arc::new(Dispatcher::new(
        &config,
        catalog,
        mapping,
        classifier,
        store,
    )?);

    if config.media.credentials.is_none() {
        warn!("TWILIO_ACCOUNT_SID/TWILIO_AUTH_TOKEN not set, media will be fetched without authentication");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        addr = %addr,
        confidence_threshold = config.classifier.confidence_threshold,
        "Webhook listening"
    );

    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}
