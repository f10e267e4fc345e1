//! Wire types for Ollama `/api/chat`, shared by the extraction and
//! conversation capabilities.

use serde::{Deserialize, Serialize};

use super::capability::ToolDefinition;
use crate::models::{ChatRole, ChatTurn};

/// Request body for Ollama `/api/chat` (non-streaming).
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerationOptions>,
}

/// A single message in a chat request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    /// Base64-encoded images (user messages only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(ChatRole::User.as_str(), content)
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        if !images.is_empty() {
            self.images = Some(images);
        }
        self
    }

    fn with_role(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            images: None,
        }
    }
}

impl From<&ChatTurn> for ChatMessage {
    fn from(turn: &ChatTurn) -> Self {
        Self::with_role(turn.role.as_str(), turn.text.clone())
    }
}

/// `{"type": "function", "function": {...}}`
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: ToolDefinition,
}

impl ToolSpec {
    pub fn function(definition: &ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: definition.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOptions {
    pub temperature: f32,
}

impl GenerationOptions {
    /// Temperature 0 for repeatable extraction.
    pub fn deterministic() -> Self {
        Self { temperature: 0.0 }
    }
}

/// Response body from Ollama `/api/chat` with `stream: false`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub function: ToolCallFunction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    /// Usually an object; some models send a JSON-encoded string.
    #[serde(default)]
    pub arguments: serde_json::Value,
}
