use anyhow::Context;
use clap::Parser;
use coleta_leads::utils::{logger, validation::Validate};
use coleta_leads::{AppState, CliConfig, CollectionEngine, GooglePlacesClient, InMemoryStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // Inicializa os logs
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting coleta-leads server");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_app_config().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if config.places.api_key.is_empty() {
        tracing::warn!(
            "⚠️ Places API key not configured; collections will finish without results"
        );
    }

    let store = Arc::new(InMemoryStore::with_access(config.access_records()).await);
    tracing::info!("👥 {} access records loaded", config.accounts.len());

    let places = Arc::new(GooglePlacesClient::new(&config)?);
    let engine = CollectionEngine::from_config(places, store, &config);
    let state = AppState::new(engine, config.server.list_limit)
        .with_minimum_tier(&config.server.minimum_tier);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;

    coleta_leads::server::serve(listener, state).await?;
    Ok(())
}
