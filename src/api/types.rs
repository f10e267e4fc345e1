//! Shared state and wire types for the HTTP layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::ChatTurn;
use crate::pipeline::conversation::ConversationalCapability;
use crate::pipeline::extraction::PiiExtractor;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub extractor: Arc<PiiExtractor>,
    pub conversation: Arc<dyn ConversationalCapability>,
    pub max_upload_bytes: usize,
}

impl ApiContext {
    pub fn new(
        extractor: Arc<PiiExtractor>,
        conversation: Arc<dyn ConversationalCapability>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            extractor,
            conversation,
            max_upload_bytes,
        }
    }
}

/// Body of `POST /api/interpret/message`.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
