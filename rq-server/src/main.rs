//! rq-server - RadioQuest story service
//!
//! Serves branching story segments with lazy narration, choice voting and
//! segment search. Runs on fallback content when the database is missing
//! and without audio when no TTS key is configured.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rq_common::config::{resolve_config_path, Overrides, RuntimeConfig, TomlConfig};
use rq_common::SearchMode;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rq_server::services::{GoogleTtsClient, SearchService, SpeechBackend};
use rq_server::store::ContentStore;
use rq_server::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(name = "rq-server", version, about = "RadioQuest story service")]
struct Cli {
    /// Root folder holding the database and generated audio
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Path to radioquest.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080
    #[arg(long)]
    bind: Option<String>,

    /// Search strategy: lexical or semantic
    #[arg(long)]
    search_mode: Option<SearchMode>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Embed every stored segment for semantic search, then exit
    Index,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The log level may come from the TOML file, so read it before tracing init
    let config_path = resolve_config_path(cli.config.as_deref());
    let toml_result = config_path.as_deref().map(TomlConfig::load);
    let log_level = match &toml_result {
        Some(Ok(toml_config)) => toml_config.logging.level.clone(),
        _ => "info".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    info!("Starting RadioQuest (rq-server) v{}", env!("CARGO_PKG_VERSION"));

    let toml_config = match (config_path, toml_result) {
        (Some(path), Some(Ok(toml_config))) => {
            info!("Loaded config: {}", path.display());
            toml_config
        }
        (Some(path), Some(Err(e))) => {
            warn!("Ignoring config {}: {} (using defaults)", path.display(), e);
            TomlConfig::default()
        }
        _ => {
            info!("No config file found, using defaults");
            TomlConfig::default()
        }
    };

    let overrides = Overrides {
        root_folder: cli.root_folder,
        bind: cli.bind,
        search_mode: cli.search_mode,
    };
    let config = RuntimeConfig::resolve(&overrides, toml_config);

    config
        .ensure_root_folder()
        .with_context(|| format!("Failed to create root folder {}", config.root_folder.display()))?;
    info!("Root folder: {}", config.root_folder.display());

    let store = open_store(&config).await;

    if let Some(Command::Index) = cli.command {
        if !store.is_available() {
            anyhow::bail!("Cannot build the search index without a database");
        }
        let search = SearchService::new(store, &config.search);
        let indexed = search.build_index().await?;
        info!("Indexed {} segments", indexed);
        return Ok(());
    }

    let speech = init_speech_backend(&config);

    let state = AppState::new(&config, store, speech);
    info!(
        "Search mode: {}, narration: {}",
        config.search.mode,
        if state.narration.is_available() { "enabled" } else { "disabled" }
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("rq-server listening on http://{}", config.bind);
    info!("Health check: http://{}/health", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the story database; any failure leaves the store unavailable
async fn open_store(config: &RuntimeConfig) -> ContentStore {
    if !config.database_enabled {
        info!("Database disabled in config, serving fallback content only");
        return ContentStore::unavailable();
    }

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());

    match ContentStore::connect(&db_path).await {
        Ok(store) => {
            match store.count().await {
                Ok(count) => info!("✓ Connected to database ({} segments)", count),
                Err(e) => warn!("Connected to database but count failed: {}", e),
            }
            store
        }
        Err(e) => {
            error!("Failed to open database, serving fallback content: {}", e);
            ContentStore::unavailable()
        }
    }
}

fn init_speech_backend(config: &RuntimeConfig) -> Option<Arc<dyn SpeechBackend>> {
    if !config.tts.enabled {
        info!("Narration disabled in config");
        return None;
    }

    match GoogleTtsClient::new(&config.tts) {
        Ok(client) => {
            info!(
                "✓ TTS client initialized (voice {}, {})",
                config.tts.voice_name, config.tts.language_code
            );
            Some(Arc::new(client) as Arc<dyn SpeechBackend>)
        }
        Err(e) => {
            warn!("Narration unavailable: {}", e);
            None
        }
    }
}
