//! Free-form chat about compliance and about files already scanned.
//!
//! A thin pass-through to a chat model. The only local logic is the empty
//! message check and rendering extraction results as chat context.

pub mod ollama;

pub use ollama::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ChatTurn, PiiRecord};
use crate::pipeline::extraction::CapabilityError;

#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Chat capability failed: {0}")]
    Capability(#[from] CapabilityError),
}

/// A model that continues a chat transcript.
#[async_trait]
pub trait ConversationalCapability: Send + Sync {
    async fn reply(&self, prior_turns: &[ChatTurn], new_text: &str) -> Result<String, CapabilityError>;
}

/// Answer `new_text` given the earlier turns.
///
/// An empty (or whitespace-only) message is rejected without calling the
/// capability.
pub async fn interpret_message(
    capability: &dyn ConversationalCapability,
    prior_turns: &[ChatTurn],
    new_text: &str,
) -> Result<String, ConversationError> {
    if new_text.trim().is_empty() {
        return Err(ConversationError::EmptyMessage);
    }
    tracing::debug!(prior_turns = prior_turns.len(), "Forwarding chat message");
    Ok(capability.reply(prior_turns, new_text).await?)
}

/// Render an extraction result as chat context:
/// `File: {name}; Found PII: {TYPE}, {value}, Page {n}; ...`
pub fn format_pii_context(file_name: &str, records: &[PiiRecord]) -> String {
    if records.is_empty() {
        return format!("File: {file_name}; Found PII: none");
    }
    let details: Vec<String> = records
        .iter()
        .map(|r| format!("{}, {}, Page {}", r.category(), r.value(), r.location()))
        .collect();
    format!("File: {file_name}; Found PII: {}", details.join("; "))
}
