pub mod api; // HTTP surface
pub mod config;
pub mod models;
pub mod pipeline; // validation, filtering, extraction, conversation

use tracing_subscriber::EnvFilter;

pub use api::StartupError;

/// Start the detector: tracing, rule table, capabilities, HTTP server.
///
/// Blocks until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::DetectorConfig::from_env();
    tracing::info!(
        ollama_url = %config.ollama_url,
        extraction_model = %config.extraction_model,
        chat_model = %config.chat_model,
        timeout_secs = config.extraction_timeout_secs,
        deduplicate = config.deduplicate,
        "Configuration loaded"
    );

    let rules = api::load_rules(&config)?;
    let ctx = api::build_context(&config, rules)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(api::serve(config.bind_addr, ctx, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    }))
}
