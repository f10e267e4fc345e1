//! Server lifecycle: load rules, build capabilities, bind, serve until
//! shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::api::router::api_router;
use crate::api::types::ApiContext;
use crate::config::{self, DetectorConfig};
use crate::pipeline::conversation::OllamaConversation;
use crate::pipeline::extraction::{CapabilityError, OllamaCapability, OllamaClient, PiiExtractor};
use crate::pipeline::validation::{RulesError, ValidationRules};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Cannot load validation rules: {0}")]
    Rules(#[from] RulesError),

    #[error("Cannot create model client: {0}")]
    Client(#[from] CapabilityError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The rule table to validate against.
///
/// An explicit `PII_RULES_PATH` must load. Otherwise a per-user table is used
/// if one exists, and the built-in table if not.
pub fn load_rules(config: &DetectorConfig) -> Result<ValidationRules, StartupError> {
    if let Some(path) = &config.rules_path {
        return Ok(ValidationRules::load(path)?);
    }
    if let Some(path) = config::user_rules_path().filter(|p| p.is_file()) {
        return Ok(ValidationRules::load(&path)?);
    }
    let rules = ValidationRules::default();
    tracing::info!(version = %rules.version, "Using built-in validation rules");
    Ok(rules)
}

/// Wire the Ollama-backed capabilities into an [`ApiContext`].
pub fn build_context(config: &DetectorConfig, rules: ValidationRules) -> Result<ApiContext, StartupError> {
    let client = OllamaClient::new(&config.ollama_url, config.extraction_timeout_secs)?;

    let extractor = PiiExtractor::new(
        Arc::new(OllamaCapability::new(client.clone(), &config.extraction_model)),
        Arc::new(rules),
    )
    .with_timeout(Duration::from_secs(config.extraction_timeout_secs))
    .with_deduplication(config.deduplicate);

    let conversation = OllamaConversation::new(client, &config.chat_model);

    Ok(ApiContext::new(
        Arc::new(extractor),
        Arc::new(conversation),
        config.max_upload_bytes,
    ))
}

/// Bind `addr` and serve the API until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, ctx: ApiContext, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "PII detector API listening");

    axum::serve(listener, api_router(ctx))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("PII detector API stopped");
    Ok(())
}
